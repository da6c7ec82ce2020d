//! Track catalog: the persisted set of song records.
//!
//! `CatalogStore` owns an in-memory snapshot of the catalog and writes every
//! mutation through a `CatalogBackend` before publishing it to readers.

mod error;
mod model;
mod sqlite;
mod store;

pub use error::CatalogError;
pub use model::*;
pub use sqlite::SqliteBackend;
pub use store::*;

#[cfg(test)]
mod tests;
