//! Selection/compose flow: search, pick a candidate, fill in the draft, commit.
//!
//! The flow is a small state machine:
//! `Idle -> Searching -> ResultsShown -> Composing -> Committed`.
//! A record is only ever created from the `Composing` phase, so the user always
//! gets a chance to add lyrics, a story or a photo before saving.

mod draft;
mod flow;

pub use draft::*;
pub use flow::*;
