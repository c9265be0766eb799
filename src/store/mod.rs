//! In-memory rule storage
//!
//! Holds rule text and the persisted AST side by side, as a database row would.

mod model;
mod repository;

pub use model::*;
pub use repository::*;
