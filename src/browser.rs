//! Record browser: the catalog as a paged carousel with one focused entry.
//!
//! The browser keeps its own snapshot of the catalog and refreshes it when
//! the store's revision moves on. Opening a record is a two-phase
//! transition: the focused CD spins for a number of frames and the
//! navigation is only emitted once the spin completes.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
