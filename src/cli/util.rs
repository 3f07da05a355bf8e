//! CLI Common Utilities
//!
//! Shared setup for CLI commands: configuration loading and wiring the
//! gateway, pipeline, and history store together.

use std::path::Path;
use std::sync::Arc;

use crate::config::{Config, ConfigLoader};
use crate::gateway::{OllamaGateway, SharedGateway};
use crate::pipeline::Pipeline;
use crate::storage::HistoryStore;
use crate::types::{Error, Result};

/// Command execution context
///
/// Loads configuration once and hands out the wired-up pieces commands
/// need. Created at the top of every command handler.
pub struct CommandContext {
    pub config: Config,
}

impl CommandContext {
    /// Load context from an explicit config file, or the standard
    /// resolution chain when none is given.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self { config })
    }

    /// Gateway against the configured Ollama endpoint.
    pub fn gateway(&self) -> Result<SharedGateway> {
        Ok(Arc::new(OllamaGateway::new(&self.config.llm)?))
    }

    /// Pipeline wired to a fresh gateway.
    pub fn pipeline(&self) -> Result<Pipeline> {
        Pipeline::from_config(self.gateway()?, &self.config)
    }

    /// Open the history database at the configured (or platform default)
    /// location.
    pub fn history_store(&self) -> Result<HistoryStore> {
        let path = match &self.config.history.path {
            Some(path) => path.clone(),
            None => ConfigLoader::default_history_path().ok_or_else(|| {
                Error::Config(
                    "cannot determine a data directory for the history database".to_string(),
                )
            })?,
        };
        HistoryStore::open(&path, self.config.history.max_entries)
    }
}
