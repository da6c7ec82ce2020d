use thiserror::Error;

/// One remote search hit. Never persisted directly; it is copied into a
/// draft when the user picks it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchCandidate {
    pub title: String,
    pub artist: String,
    pub album_art_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search service returned HTTP {status}")]
    Http { status: u16 },

    #[error("search request failed: {0}")]
    Transport(String),

    #[error("unexpected search response: {0}")]
    Malformed(String),
}

/// A single blocking lookup against a music-metadata service.
///
/// Implementations do not retry; wrap a provider to add retries.
pub trait SearchProvider: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, SearchError>;
}

/// Result of one query. `Found(vec![])` means "no matches" and is distinct
/// from `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(Vec<SearchCandidate>),
    Failed(SearchError),
}

impl SearchOutcome {
    /// Candidates to render; empty on failure.
    pub fn candidates(&self) -> &[SearchCandidate] {
        match self {
            Self::Found(c) => c,
            Self::Failed(_) => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome of the query tagged with `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEvent {
    pub generation: u64,
    pub query: String,
    pub outcome: SearchOutcome,
}
