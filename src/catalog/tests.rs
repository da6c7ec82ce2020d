use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

fn fields(title: &str, artist: &str) -> RecordFields {
    RecordFields {
        title: title.into(),
        artist: artist.into(),
        album_art: format!("https://art.example/{title}.jpg"),
        ..RecordFields::default()
    }
}

fn memory_store() -> CatalogStore {
    CatalogStore::open(Box::new(SqliteBackend::open_in_memory().unwrap())).unwrap()
}

/// Wraps the SQLite backend and fails every write while `fail` is set.
struct FlakyBackend {
    inner: SqliteBackend,
    fail: Arc<AtomicBool>,
}

impl FlakyBackend {
    fn check(&self) -> Result<(), CatalogError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(CatalogError::StorageFailure("disk on fire".into()))
        } else {
            Ok(())
        }
    }
}

impl CatalogBackend for FlakyBackend {
    fn load_all(&self) -> Result<Vec<Record>, CatalogError> {
        self.inner.load_all()
    }
    fn insert(&self, record: &Record) -> Result<(), CatalogError> {
        self.check()?;
        self.inner.insert(record)
    }
    fn update(&self, record: &Record) -> Result<(), CatalogError> {
        self.check()?;
        self.inner.update(record)
    }
    fn delete(&self, id: RecordId) -> Result<(), CatalogError> {
        self.check()?;
        self.inner.delete(id)
    }
}

fn flaky_store() -> (CatalogStore, Arc<AtomicBool>) {
    let fail = Arc::new(AtomicBool::new(false));
    let backend = FlakyBackend {
        inner: SqliteBackend::open_in_memory().unwrap(),
        fail: fail.clone(),
    };
    (CatalogStore::open(Box::new(backend)).unwrap(), fail)
}

/// Wraps the SQLite backend and parks `update` of one identity inside the
/// backend until the test releases it.
struct GatedBackend {
    inner: SqliteBackend,
    gated: Arc<Mutex<Option<RecordId>>>,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl CatalogBackend for GatedBackend {
    fn load_all(&self) -> Result<Vec<Record>, CatalogError> {
        self.inner.load_all()
    }
    fn insert(&self, record: &Record) -> Result<(), CatalogError> {
        self.inner.insert(record)
    }
    fn update(&self, record: &Record) -> Result<(), CatalogError> {
        if *self.gated.lock().unwrap() == Some(record.id) {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(5))
                .unwrap();
        }
        self.inner.update(record)
    }
    fn delete(&self, id: RecordId) -> Result<(), CatalogError> {
        self.inner.delete(id)
    }
}

struct Gate {
    gated: Arc<Mutex<Option<RecordId>>>,
    entered: Receiver<()>,
    release: Sender<()>,
}

impl Gate {
    fn hold(&self, id: RecordId) {
        *self.gated.lock().unwrap() = Some(id);
    }

    fn wait_entered(&self) {
        self.entered.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    fn open(&self) {
        self.release.send(()).unwrap();
    }
}

fn gated_store(path: &std::path::Path) -> (CatalogStore, Gate) {
    let gated = Arc::new(Mutex::new(None));
    let (entered_tx, entered) = mpsc::channel();
    let (release, release_rx) = mpsc::channel();
    let backend = GatedBackend {
        inner: SqliteBackend::open(path).unwrap(),
        gated: gated.clone(),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let store = CatalogStore::open(Box::new(backend)).unwrap();
    (
        store,
        Gate {
            gated,
            entered,
            release,
        },
    )
}

fn is_sorted(records: &[Record]) -> bool {
    records.windows(2).all(|w| w[0].created_at <= w[1].created_at)
}

#[test]
fn create_adds_exactly_one_entry_with_fresh_identity() {
    let store = memory_store();
    let first = store.create(fields("Yesterday", "The Beatles")).unwrap();
    let before = store.list();

    let second = store.create(fields("Help!", "The Beatles")).unwrap();
    let after = store.list();

    assert_eq!(after.len(), before.len() + 1);
    assert_ne!(first.id, second.id);
    let added: Vec<&Record> = after.iter().filter(|r| r.id == second.id).collect();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].title, "Help!");
    assert_eq!(added[0].artist, "The Beatles");
    assert_eq!(added[0].album_art, "https://art.example/Help!.jpg");
}

#[test]
fn list_stays_sorted_by_creation_time_across_mutations() {
    let store = memory_store();
    let a = store.create(fields("A", "x")).unwrap();
    let b = store.create(fields("B", "x")).unwrap();
    store.create(fields("C", "x")).unwrap();
    assert!(is_sorted(&store.list()));

    store.update(a.id, fields("A2", "x")).unwrap();
    assert!(is_sorted(&store.list()));
    assert_eq!(store.list()[0].title, "A2");

    store.delete(b.id).unwrap();
    store.create(fields("D", "x")).unwrap();
    let titles: Vec<String> = store.list().into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["A2", "C", "D"]);
    assert!(is_sorted(&store.list()));
}

#[test]
fn create_normalizes_blank_optional_fields() {
    let store = memory_store();
    let record = store
        .create(RecordFields {
            lyrics: Some("   ".into()),
            story: Some(String::new()),
            photo: Some(Vec::new()),
            ..fields("  Yesterday ", "The Beatles")
        })
        .unwrap();
    assert_eq!(record.title, "Yesterday");
    assert_eq!(record.lyrics, None);
    assert_eq!(record.story, None);
    assert_eq!(record.photo, None);
}

#[test]
fn create_rejects_missing_title_or_artist() {
    let store = memory_store();
    assert!(matches!(
        store.create(fields("", "Someone")),
        Err(CatalogError::ValidationFailure(_))
    ));
    assert!(matches!(
        store.create(fields("Song", "  ")),
        Err(CatalogError::ValidationFailure(_))
    ));
    assert!(store.list().is_empty());
    assert_eq!(store.revision(), 0);
}

#[test]
fn update_keeps_identity_and_creation_time() {
    let store = memory_store();
    let original = store.create(fields("Song", "Band")).unwrap();

    let updated = store
        .update(
            original.id,
            RecordFields {
                story: Some("first heard it on a bus".into()),
                ..original.fields()
            },
        )
        .unwrap();

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.story.as_deref(), Some("first heard it on a bus"));
    assert_eq!(store.get(original.id).unwrap(), updated);
}

#[test]
fn update_unknown_id_is_not_found() {
    let store = memory_store();
    store.create(fields("Song", "Band")).unwrap();
    let before = store.list();
    let ghost = RecordId::new();
    assert_eq!(
        store.update(ghost, fields("X", "Y")),
        Err(CatalogError::NotFound(ghost))
    );
    assert_eq!(store.list(), before);
}

#[test]
fn delete_removes_entry_and_unknown_id_is_not_found() {
    let store = memory_store();
    let a = store.create(fields("A", "x")).unwrap();
    store.create(fields("B", "x")).unwrap();

    store.delete(a.id).unwrap();
    assert!(store.list().iter().all(|r| r.id != a.id));

    let before = store.list();
    assert_eq!(store.delete(a.id), Err(CatalogError::NotFound(a.id)));
    assert_eq!(store.list(), before);
}

#[test]
fn failed_writes_leave_catalog_untouched() {
    let (store, fail) = flaky_store();
    let a = store.create(fields("A", "x")).unwrap();
    let before = store.list();
    let revision = store.revision();

    fail.store(true, Ordering::SeqCst);
    assert!(matches!(
        store.create(fields("B", "x")),
        Err(CatalogError::StorageFailure(_))
    ));
    assert!(matches!(
        store.update(a.id, fields("A2", "x")),
        Err(CatalogError::StorageFailure(_))
    ));
    assert!(matches!(store.delete(a.id), Err(CatalogError::StorageFailure(_))));

    assert_eq!(store.list(), before);
    assert_eq!(store.revision(), revision);

    fail.store(false, Ordering::SeqCst);
    store.delete(a.id).unwrap();
    assert!(store.is_empty());
}

#[test]
fn subscribers_receive_events_with_increasing_revisions() {
    let store = memory_store();
    let rx = store.subscribe();

    let a = store.create(fields("A", "x")).unwrap();
    store.update(a.id, fields("A", "y")).unwrap();
    store.delete(a.id).unwrap();

    let events: Vec<CatalogEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            CatalogEvent::Created { id: a.id, revision: 1 },
            CatalogEvent::Updated { id: a.id, revision: 2 },
            CatalogEvent::Deleted { id: a.id, revision: 3 },
        ]
    );
    assert_eq!(store.revision(), 3);
}

#[test]
fn dropped_subscribers_are_pruned() {
    let store = memory_store();
    drop(store.subscribe());
    let live = store.subscribe();
    store.create(fields("A", "x")).unwrap();
    assert_eq!(live.try_iter().count(), 1);
}

#[test]
fn concurrent_creates_are_all_persisted_in_order() {
    let store = memory_store();
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..5 {
                    store.create(fields(&format!("t{t}-{i}"), "x")).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let records = store.list();
    assert_eq!(records.len(), 20);
    assert!(is_sorted(&records));
    assert_eq!(store.revision(), 20);
}

#[test]
fn update_and_delete_of_one_record_never_interleave() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.db");
    let (store, gate) = gated_store(&path);
    let a = store.create(fields("A", "x")).unwrap();
    let b = store.create(fields("B", "x")).unwrap();
    gate.hold(a.id);

    let updater = {
        let store = store.clone();
        thread::spawn(move || store.update(a.id, fields("A2", "x")))
    };
    gate.wait_entered();

    let (done_tx, done) = mpsc::channel();
    let deleter = {
        let store = store.clone();
        thread::spawn(move || done_tx.send(store.delete(a.id)).unwrap())
    };
    // The delete waits for the update of the same record to finish.
    assert_eq!(
        done.recv_timeout(Duration::from_millis(100)),
        Err(RecvTimeoutError::Timeout)
    );
    assert_eq!(store.get(a.id).unwrap().title, "A");

    gate.open();
    assert_eq!(updater.join().unwrap().unwrap().title, "A2");
    assert_eq!(done.recv_timeout(Duration::from_secs(5)).unwrap(), Ok(()));
    deleter.join().unwrap();

    assert_eq!(store.list(), vec![b.clone()]);
    assert_eq!(store.tracked_identities(), 0);
    drop(store);

    let reopened = SqliteBackend::open(&path).unwrap().load_all().unwrap();
    assert_eq!(reopened, vec![b]);
}

#[test]
fn mutations_of_other_records_are_not_blocked() {
    let dir = tempfile::tempdir().unwrap();
    let (store, gate) = gated_store(&dir.path().join("record.db"));
    let a = store.create(fields("A", "x")).unwrap();
    let b = store.create(fields("B", "x")).unwrap();
    let c = store.create(fields("C", "x")).unwrap();
    gate.hold(a.id);

    let updater = {
        let store = store.clone();
        thread::spawn(move || store.update(a.id, fields("A2", "x")))
    };
    gate.wait_entered();

    let (done_tx, done) = mpsc::channel();
    {
        let store = store.clone();
        thread::spawn(move || {
            let deleted = store.delete(b.id);
            let updated = store.update(c.id, fields("C2", "x")).map(|r| r.title);
            done_tx.send((deleted, updated)).unwrap();
        });
    }
    // Both finish while the update of `a` is still parked in the backend.
    assert_eq!(
        done.recv_timeout(Duration::from_secs(2)).unwrap(),
        (Ok(()), Ok("C2".to_string()))
    );
    assert_eq!(store.get(a.id).unwrap().title, "A");
    assert_eq!(store.list().len(), 2);

    gate.open();
    updater.join().unwrap().unwrap();
    let titles: Vec<String> = store.list().into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["A2", "C2"]);
}

#[test]
fn unknown_ids_leave_no_lock_entries_behind() {
    let store = memory_store();
    let a = store.create(fields("A", "x")).unwrap();

    for _ in 0..3 {
        let ghost = RecordId::new();
        assert_eq!(
            store.update(ghost, fields("X", "Y")),
            Err(CatalogError::NotFound(ghost))
        );
        assert_eq!(store.delete(ghost), Err(CatalogError::NotFound(ghost)));
    }
    assert_eq!(store.tracked_identities(), 0);

    store.update(a.id, fields("A2", "x")).unwrap();
    store.delete(a.id).unwrap();
    assert_eq!(store.update(a.id, fields("A3", "x")), Err(CatalogError::NotFound(a.id)));
    assert_eq!(store.tracked_identities(), 0);
}

#[test]
fn concurrent_creates_reload_in_the_order_they_were_listed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.db");
    let store = CatalogStore::open(Box::new(SqliteBackend::open(&path).unwrap())).unwrap();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..10 {
                    store.create(fields(&format!("t{t}-{i}"), "x")).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let listed: Vec<RecordId> = store.list().into_iter().map(|r| r.id).collect();
    drop(store);
    let reopened = CatalogStore::open(Box::new(SqliteBackend::open(&path).unwrap())).unwrap();
    let reloaded: Vec<RecordId> = reopened.list().into_iter().map(|r| r.id).collect();
    assert_eq!(listed.len(), 80);
    assert_eq!(reloaded, listed);
}

#[test]
fn sqlite_backend_round_trips_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("record.db");

    let created = {
        let store = CatalogStore::open(Box::new(SqliteBackend::open(&path).unwrap())).unwrap();
        let a = store
            .create(RecordFields {
                lyrics: Some("Yesterday, all my troubles seemed so far away".into()),
                photo: Some(vec![0x89, 0x50, 0x4e, 0x47]),
                ..fields("Yesterday", "The Beatles")
            })
            .unwrap();
        let b = store.create(fields("Help!", "The Beatles")).unwrap();
        store.delete(b.id).unwrap();
        a
    };

    let store = CatalogStore::open(Box::new(SqliteBackend::open(&path).unwrap())).unwrap();
    assert_eq!(store.list(), vec![created]);
}

#[test]
fn sqlite_backend_reports_missing_rows() {
    let backend = SqliteBackend::open_in_memory().unwrap();
    let id = RecordId::new();
    assert_eq!(backend.delete(id), Err(CatalogError::NotFound(id)));
}

#[test]
fn title_line_joins_title_and_artist() {
    let store = memory_store();
    let r = store.create(fields("Yesterday", "The Beatles")).unwrap();
    assert_eq!(r.title_line(), "Yesterday - The Beatles");
}
