use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{SubsecRound, Utc};
use tracing::{debug, info, warn};

use super::error::CatalogError;
use super::model::{CatalogEvent, Record, RecordFields, RecordId};

/// Persistence collaborator behind the catalog.
///
/// Implementations only need to be durable; ordering, validation and
/// notification are handled by `CatalogStore`. Calls for different
/// identities may arrive concurrently, calls for the same identity never do.
pub trait CatalogBackend: Send + Sync {
    fn load_all(&self) -> Result<Vec<Record>, CatalogError>;
    fn insert(&self, record: &Record) -> Result<(), CatalogError>;
    fn update(&self, record: &Record) -> Result<(), CatalogError>;
    fn delete(&self, id: RecordId) -> Result<(), CatalogError>;
}

/// Shared handle to the catalog. Cloning is cheap and all clones see the
/// same records.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Box<dyn CatalogBackend>,
    /// Published snapshot, ascending by `created_at` then insertion order.
    records: RwLock<Arc<Vec<Record>>>,
    revision: AtomicU64,
    /// Held by `create` from timestamping to publishing, so the snapshot
    /// order matches the backend's insertion order.
    create_order: Mutex<()>,
    identity_locks: Mutex<HashMap<RecordId, Arc<Mutex<()>>>>,
    subscribers: Mutex<Vec<Sender<CatalogEvent>>>,
}

impl CatalogStore {
    /// Open the catalog over `backend`, loading every stored record.
    pub fn open(backend: Box<dyn CatalogBackend>) -> Result<Self, CatalogError> {
        let mut records = backend.load_all()?;
        records.sort_by_key(|r| r.created_at);
        info!(count = records.len(), "catalog loaded");

        Ok(Self {
            inner: Arc::new(Inner {
                backend,
                records: RwLock::new(Arc::new(records)),
                revision: AtomicU64::new(0),
                create_order: Mutex::new(()),
                identity_locks: Mutex::new(HashMap::new()),
                subscribers: Mutex::new(Vec::new()),
            }),
        })
    }

    /// All records in ascending creation order.
    pub fn list(&self) -> Vec<Record> {
        self.snapshot().as_ref().clone()
    }

    /// The current published snapshot, without copying the records.
    pub fn snapshot(&self) -> Arc<Vec<Record>> {
        self.inner
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: RecordId) -> Result<Record, CatalogError> {
        self.snapshot()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }

    /// Monotonic counter bumped by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::Acquire)
    }

    /// Receive a `CatalogEvent` for every future mutation.
    pub fn subscribe(&self) -> Receiver<CatalogEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.inner.subscribers).push(tx);
        rx
    }

    /// Validate and persist a new record, returning the stored value.
    pub fn create(&self, fields: RecordFields) -> Result<Record, CatalogError> {
        let fields = fields.normalized();
        fields.validate()?;

        let id = RecordId::new();
        let order = lock(&self.inner.create_order);
        let mut created_at = Utc::now().trunc_subsecs(3);
        // Keep creation order stable even if the clock steps backwards.
        if let Some(last) = self.snapshot().last() {
            created_at = created_at.max(last.created_at);
        }
        let record = Record::from_fields(id, fields, created_at);

        self.inner
            .backend
            .insert(&record)
            .inspect_err(|e| warn!(error = %e, "create failed"))?;

        let revision = self.publish(|records| {
            let pos = records.partition_point(|r| r.created_at <= record.created_at);
            records.insert(pos, record.clone());
        });
        drop(order);

        info!(%id, title = %record.title, revision, "record created");
        self.notify(CatalogEvent::Created { id, revision });
        Ok(record)
    }

    /// Replace the editable fields of `id`, keeping its identity and
    /// creation time.
    pub fn update(&self, id: RecordId, fields: RecordFields) -> Result<Record, CatalogError> {
        let fields = fields.normalized();
        fields.validate()?;

        // Unknown ids never get an identity lock.
        self.get(id)?;
        let identity = self.identity_lock(id);
        let _guard = lock(identity.as_ref());

        let current = self.get(id).inspect_err(|_| self.forget_identity(id))?;
        let record = Record::from_fields(id, fields, current.created_at);

        self.inner
            .backend
            .update(&record)
            .inspect_err(|e| warn!(%id, error = %e, "update failed"))?;

        let revision = self.publish(|records| {
            if let Some(slot) = records.iter_mut().find(|r| r.id == id) {
                *slot = record.clone();
            }
        });
        info!(%id, revision, "record updated");
        self.notify(CatalogEvent::Updated { id, revision });
        Ok(record)
    }

    pub fn delete(&self, id: RecordId) -> Result<(), CatalogError> {
        // Existence is checked against the snapshot so a stale id never
        // reaches the backend.
        self.get(id)?;
        let identity = self.identity_lock(id);
        let _guard = lock(identity.as_ref());

        self.get(id).inspect_err(|_| self.forget_identity(id))?;

        self.inner
            .backend
            .delete(id)
            .inspect_err(|e| warn!(%id, error = %e, "delete failed"))?;

        let revision = self.publish(|records| records.retain(|r| r.id != id));
        self.forget_identity(id);
        info!(%id, revision, "record deleted");
        self.notify(CatalogEvent::Deleted { id, revision });
        Ok(())
    }

    fn identity_lock(&self, id: RecordId) -> Arc<Mutex<()>> {
        lock(&self.inner.identity_locks)
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the lock entry of an identity that no longer exists. Identities
    /// are never reused, so a late waiter only ever finds it gone.
    fn forget_identity(&self, id: RecordId) {
        lock(&self.inner.identity_locks).remove(&id);
    }

    #[cfg(test)]
    pub(crate) fn tracked_identities(&self) -> usize {
        lock(&self.inner.identity_locks).len()
    }

    /// Apply `change` to a copy of the snapshot and swap it in. Readers see
    /// either the old or the new catalog, never a partial one.
    fn publish<F>(&self, change: F) -> u64
    where
        F: FnOnce(&mut Vec<Record>),
    {
        let mut slot = self
            .inner
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = slot.as_ref().clone();
        change(&mut next);
        *slot = Arc::new(next);
        self.inner.revision.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn notify(&self, event: CatalogEvent) {
        let mut subscribers = lock(&self.inner.subscribers);
        subscribers.retain(|tx| tx.send(event).is_ok());
        debug!(subscribers = subscribers.len(), ?event, "catalog event sent");
    }
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
