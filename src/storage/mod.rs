//! Persistence Layer
//!
//! SQLite-backed storage. Currently a single concern: the capped run
//! history consulted by the CLI and written by both front ends.

mod history;

pub use history::{HistoryEntry, HistoryStore};
