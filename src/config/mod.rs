//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/promptforge/config.toml)
//! 3. Project config (./promptforge.toml)
//! 4. Environment variables (PROMPTFORGE_*)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
