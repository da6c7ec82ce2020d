use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{CatalogError, CatalogStore, Record};
use crate::search::{SearchCandidate, SearchClient, SearchError, SearchEvent, SearchOutcome};

use super::draft::{Draft, DraftTarget};

/// Where the compose flow currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposePhase {
    /// Empty query box.
    Idle,
    /// Waiting for the outcome of query `generation`.
    Searching { generation: u64 },
    /// The latest outcome is on screen.
    ResultsShown,
    /// A candidate was picked and the draft is being edited.
    Composing,
    /// The draft was saved as this record; the flow is over.
    Committed(Record),
}

impl ComposePhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching { .. } => "searching",
            Self::ResultsShown => "results",
            Self::Composing => "composing",
            Self::Committed(_) => "committed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("no search result at position {0}")]
    NoSuchCandidate(usize),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// State of one search-and-compose session.
///
/// A new flow never shows results from an earlier session.
#[derive(Debug, Clone)]
pub struct ComposeFlow {
    phase: ComposePhase,
    query: String,
    results: Vec<SearchCandidate>,
    search_error: Option<SearchError>,
    cursor: usize,
    draft: Option<Draft>,
}

impl Default for ComposeFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposeFlow {
    pub fn new() -> Self {
        Self {
            phase: ComposePhase::Idle,
            query: String::new(),
            results: Vec::new(),
            search_error: None,
            cursor: 0,
            draft: None,
        }
    }

    /// A flow that edits `record`: it starts in `Composing` with the
    /// record's current fields, and committing updates that record.
    pub fn editing(record: &Record) -> Self {
        Self {
            phase: ComposePhase::Composing,
            draft: Some(Draft::from_record(record)),
            ..Self::new()
        }
    }

    pub fn phase(&self) -> &ComposePhase {
        &self.phase
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[SearchCandidate] {
        &self.results
    }

    /// The failure behind the current (empty) result list, if any.
    pub fn search_error(&self) -> Option<&SearchError> {
        self.search_error.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.draft.as_mut()
    }

    pub fn committed(&self) -> Option<&Record> {
        match &self.phase {
            ComposePhase::Committed(r) => Some(r),
            _ => None,
        }
    }

    fn accepts_query(&self) -> bool {
        matches!(
            self.phase,
            ComposePhase::Idle | ComposePhase::Searching { .. } | ComposePhase::ResultsShown
        )
    }

    /// Replace the query. A non-empty query (re-)enters `Searching` and
    /// supersedes any request still in flight; an empty one returns to `Idle`.
    pub fn set_query(&mut self, query: &str, search: &SearchClient) -> Result<(), ComposeError> {
        if !self.accepts_query() {
            return Err(self.invalid("search"));
        }
        self.query = query.to_string();

        if query.trim().is_empty() {
            search.invalidate();
            self.phase = ComposePhase::Idle;
            self.results.clear();
            self.search_error = None;
            self.cursor = 0;
            return Ok(());
        }

        let generation = search.submit(query);
        self.phase = ComposePhase::Searching { generation };
        Ok(())
    }

    pub fn push_query_char(&mut self, c: char, search: &SearchClient) -> Result<(), ComposeError> {
        let mut query = self.query.clone();
        query.push(c);
        self.set_query(&query, search)
    }

    pub fn pop_query_char(&mut self, search: &SearchClient) -> Result<(), ComposeError> {
        let mut query = self.query.clone();
        query.pop();
        self.set_query(&query, search)
    }

    pub fn clear_query(&mut self, search: &SearchClient) -> Result<(), ComposeError> {
        self.set_query("", search)
    }

    /// Apply a search outcome. Returns `false` when the event does not belong
    /// to the query currently being waited on.
    pub fn on_search_event(&mut self, event: SearchEvent) -> bool {
        let ComposePhase::Searching { generation } = self.phase else {
            return false;
        };
        if event.generation != generation {
            debug!(
                got = event.generation,
                want = generation,
                "ignoring search outcome for another query"
            );
            return false;
        }

        debug!(
            query = %event.query,
            count = event.outcome.candidates().len(),
            failed = event.outcome.is_failed(),
            "search outcome applied"
        );
        match event.outcome {
            SearchOutcome::Found(candidates) => {
                self.results = candidates;
                self.search_error = None;
            }
            SearchOutcome::Failed(e) => {
                self.results.clear();
                self.search_error = Some(e);
            }
        }
        self.cursor = 0;
        self.phase = ComposePhase::ResultsShown;
        true
    }

    pub fn next_result(&mut self) {
        if self.cursor + 1 < self.results.len() {
            self.cursor += 1;
        }
    }

    pub fn prev_result(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Pick result `index` and start composing a draft from it.
    pub fn select(&mut self, index: usize) -> Result<&mut Draft, ComposeError> {
        if self.phase != ComposePhase::ResultsShown {
            return Err(self.invalid("select a result"));
        }
        let candidate = self
            .results
            .get(index)
            .ok_or(ComposeError::NoSuchCandidate(index))?;

        debug!(title = %candidate.title, artist = %candidate.artist, "candidate selected");
        self.cursor = index;
        self.phase = ComposePhase::Composing;
        Ok(self.draft.insert(Draft::from_candidate(candidate)))
    }

    pub fn select_current(&mut self) -> Result<&mut Draft, ComposeError> {
        self.select(self.cursor)
    }

    /// Leave a new draft and go back to the result list, discarding the draft.
    pub fn back_to_results(&mut self) -> Result<(), ComposeError> {
        let is_new = self
            .draft
            .as_ref()
            .is_some_and(|d| d.target == DraftTarget::New);
        if self.phase != ComposePhase::Composing || !is_new {
            return Err(self.invalid("go back to results"));
        }
        self.draft = None;
        self.phase = ComposePhase::ResultsShown;
        Ok(())
    }

    /// Save the draft: create a new record or update the edited one.
    ///
    /// On failure the flow stays in `Composing` with the draft intact.
    pub fn commit(&mut self, store: &CatalogStore) -> Result<Record, ComposeError> {
        if self.phase != ComposePhase::Composing {
            return Err(self.invalid("commit"));
        }
        let Some(draft) = self.draft.as_ref() else {
            return Err(self.invalid("commit"));
        };

        let fields = draft.to_fields();
        let record = match draft.target {
            DraftTarget::New => store.create(fields)?,
            DraftTarget::Existing(id) => store.update(id, fields)?,
        };
        info!(id = %record.id, "draft committed");

        self.draft = None;
        self.phase = ComposePhase::Committed(record.clone());
        Ok(record)
    }

    fn invalid(&self, action: &'static str) -> ComposeError {
        ComposeError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }
}
