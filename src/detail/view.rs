use thiserror::Error;
use tracing::info;

use crate::catalog::{CatalogError, CatalogStore, Record, RecordId};
use crate::compose::ComposeFlow;

use super::share::{ShareError, SharePayload, ShareTarget, render_snapshot};

/// Full-screen covers over the detail card.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Overlay {
    Photo,
    Story,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetailError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Share(#[from] ShareError),
}

/// State of the detail screen for one record.
///
/// The record itself is always re-read from the store, so edits and deletes
/// made elsewhere are reflected immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    id: RecordId,
    confirming_delete: bool,
    overlay: Option<Overlay>,
}

impl DetailView {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            confirming_delete: false,
            overlay: None,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn is_confirming_delete(&self) -> bool {
        self.confirming_delete
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }

    pub fn view(&self, store: &CatalogStore) -> Result<Record, CatalogError> {
        store.get(self.id)
    }

    /// An editing flow pre-filled with the record's current fields.
    pub fn edit(&self, store: &CatalogStore) -> Result<ComposeFlow, CatalogError> {
        let record = store.get(self.id)?;
        Ok(ComposeFlow::editing(&record))
    }

    pub fn request_delete(&mut self) {
        self.overlay = None;
        self.confirming_delete = true;
    }

    pub fn cancel_delete(&mut self) {
        self.confirming_delete = false;
    }

    /// Delete the record if the confirmation is armed. Returns whether a
    /// delete happened; a failed delete keeps the confirmation armed.
    pub fn confirm_delete(&mut self, store: &CatalogStore) -> Result<bool, CatalogError> {
        if !self.confirming_delete {
            return Ok(false);
        }
        store.delete(self.id)?;
        self.confirming_delete = false;
        Ok(true)
    }

    /// Show or hide `overlay`. Overlays for content the record lacks stay
    /// hidden. Returns whether the overlay is now shown.
    pub fn toggle_overlay(&mut self, overlay: Overlay, record: &Record) -> bool {
        if self.overlay == Some(overlay) {
            self.overlay = None;
            return false;
        }
        let available = match overlay {
            Overlay::Photo => record.photo.is_some(),
            Overlay::Story => record.story.is_some(),
        };
        self.overlay = available.then_some(overlay);
        available
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    /// Render `record` as a snapshot card and send it to `share`.
    pub fn export_snapshot(
        &self,
        record: &Record,
        share: &dyn ShareTarget,
    ) -> Result<String, DetailError> {
        let payload = SharePayload {
            title_line: record.title_line(),
            image: render_snapshot(record),
        };
        let location = share.share(&payload)?;
        info!(id = %record.id, %location, "record shared");
        Ok(location)
    }
}
