//! Music search: remote metadata lookup with latest-query-wins delivery.
//!
//! A `SearchProvider` performs one blocking lookup. `SearchClient` runs the
//! provider on a worker thread and only surfaces the outcome of the most
//! recently submitted query.

mod client;
mod itunes;
mod model;

pub use client::*;
pub use itunes::ITunesProvider;
pub use model::*;
