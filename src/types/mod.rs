//! Core Domain Types
//!
//! Stage identifiers, run modes, and the unified error type.

pub mod error;
pub mod stage;

pub use error::{AttemptRecord, Error, Result};
pub use stage::{RunMode, STANDARD_STAGES, StageName};
