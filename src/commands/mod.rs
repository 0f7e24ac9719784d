//! Command implementations for shoplens CLI

mod analyze;
mod history;
mod misc;

pub use analyze::*;
pub use history::*;
pub use misc::*;
