use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use crate::catalog::{CatalogStore, Record, RecordId};

/// Where the browser wants to go next.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Navigation {
    Detail(RecordId),
}

/// A running "spin the CD" animation that ends in opening `record`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Spin {
    pub record: RecordId,
    pub frame: u32,
    pub total: u32,
}

impl Spin {
    /// Progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.frame as f32 / self.total as f32
        }
    }
}

pub struct Browser {
    records: Arc<Vec<Record>>,
    revision: Option<u64>,
    focus: Option<usize>,
    spin: Option<Spin>,
    spin_frames: (u32, u32),
}

impl Browser {
    /// `spin_frames` bounds (inclusive) the random spin length used by
    /// `begin_open`.
    pub fn new(spin_frames_min: u32, spin_frames_max: u32) -> Self {
        let min = spin_frames_min.max(1);
        Self {
            records: Arc::new(Vec::new()),
            revision: None,
            focus: None,
            spin: None,
            spin_frames: (min, spin_frames_max.max(min)),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Focused index; `None` iff the catalog is empty.
    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    pub fn focused(&self) -> Option<&Record> {
        self.focus.and_then(|i| self.records.get(i))
    }

    pub fn spin(&self) -> Option<&Spin> {
        self.spin.as_ref()
    }

    /// Whether the cached snapshot is behind `store`.
    pub fn is_stale(&self, store: &CatalogStore) -> bool {
        self.revision != Some(store.revision())
    }

    /// Re-read the catalog if it changed. Returns `true` when the snapshot
    /// was replaced.
    pub fn refresh(&mut self, store: &CatalogStore) -> bool {
        if !self.is_stale(store) {
            return false;
        }
        // Read the revision first: a mutation landing in between only makes
        // the next refresh redo the work.
        let revision = store.revision();
        self.apply_snapshot(store.snapshot(), revision);
        true
    }

    /// Install `records` and reconcile focus with the new ordering.
    ///
    /// A focused record that still exists keeps focus. If it vanished,
    /// focus stays on the same numeric index, or the last index if that
    /// one no longer exists.
    pub fn apply_snapshot(&mut self, records: Arc<Vec<Record>>, revision: u64) {
        let focused_id = self.focused().map(|r| r.id);
        let old_focus = self.focus;

        self.focus = if records.is_empty() {
            None
        } else if let Some(pos) = focused_id.and_then(|id| records.iter().position(|r| r.id == id)) {
            Some(pos)
        } else {
            Some(old_focus.unwrap_or(0).min(records.len() - 1))
        };

        if let Some(spin) = self.spin {
            if !records.iter().any(|r| r.id == spin.record) {
                debug!(record = %spin.record, "spun record vanished, cancelling open");
                self.spin = None;
            }
        }

        debug!(
            revision,
            count = records.len(),
            focus = ?self.focus,
            "browser snapshot refreshed"
        );
        self.records = records;
        self.revision = Some(revision);
    }

    /// Move focus onto `id` if it is in the snapshot.
    pub fn focus_record(&mut self, id: RecordId) -> bool {
        match self.records.iter().position(|r| r.id == id) {
            Some(pos) => {
                self.focus = Some(pos);
                true
            }
            None => false,
        }
    }

    /// Focus the next record, stopping at the last one.
    pub fn next(&mut self) {
        if self.spin.is_some() {
            return;
        }
        if let Some(i) = self.focus {
            self.focus = Some((i + 1).min(self.records.len().saturating_sub(1)));
        }
    }

    /// Focus the previous record, stopping at the first one.
    pub fn prev(&mut self) {
        if self.spin.is_some() {
            return;
        }
        if let Some(i) = self.focus {
            self.focus = Some(i.saturating_sub(1));
        }
    }

    /// Start spinning the focused CD for a random number of frames.
    pub fn begin_open(&mut self) -> bool {
        let (min, max) = self.spin_frames;
        let frames = rand::rng().random_range(min..=max);
        self.begin_open_for(frames)
    }

    /// Start spinning the focused CD for exactly `frames` ticks.
    pub fn begin_open_for(&mut self, frames: u32) -> bool {
        if self.spin.is_some() {
            return false;
        }
        let Some(record) = self.focused().map(|r| r.id) else {
            return false;
        };
        self.spin = Some(Spin {
            record,
            frame: 0,
            total: frames,
        });
        true
    }

    pub fn cancel_open(&mut self) {
        self.spin = None;
    }

    /// Advance the spin by one frame. Yields the navigation exactly once,
    /// on the frame the spin completes.
    pub fn tick(&mut self) -> Option<Navigation> {
        let spin = self.spin.as_mut()?;
        spin.frame = spin.frame.saturating_add(1);
        if spin.frame < spin.total {
            return None;
        }
        let record = spin.record;
        self.spin = None;
        Some(Navigation::Detail(record))
    }
}
