//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the current screen, the
//! record browser and the collaborators each screen works with.

mod model;

pub use model::*;
