//! Core data models.

mod game;
mod history;
mod stats;

pub use game::*;
pub use history::*;
pub use stats::*;
