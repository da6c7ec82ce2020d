use thiserror::Error;

use super::model::RecordId;

/// Errors surfaced by catalog operations.
///
/// None of them are fatal: the caller turns them into a notice and the
/// catalog stays exactly as it was before the failed call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("record {0} not found")]
    NotFound(RecordId),

    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("invalid record: {0}")]
    ValidationFailure(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(e: rusqlite::Error) -> Self {
        Self::StorageFailure(e.to_string())
    }
}
