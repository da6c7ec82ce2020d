//! Record detail screen: view, edit, delete with confirmation, and export
//! of a shareable snapshot card.

mod share;
mod view;

pub use share::*;
pub use view::*;
