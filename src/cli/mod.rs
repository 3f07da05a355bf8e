//! Command-Line Interface
//!
//! Command handlers plus the console output helpers they share. Argument
//! parsing itself lives in the binary entry point.

pub mod commands;
pub mod output;
pub mod util;

pub use output::Output;
pub use util::CommandContext;
