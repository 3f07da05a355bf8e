//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/promptforge/config.toml)
//! 3. Project config (./promptforge.toml)
//! 4. Environment variables (PROMPTFORGE_* prefix, `__` as section separator)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use super::types::Config;
use crate::types::{Error, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. PROMPTFORGE_LLM__TIMEOUT_MS -> llm.timeout_ms
        figment = figment.merge(Env::prefixed("PROMPTFORGE_").split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| Error::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| Error::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Platform directories for config and data
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "promptforge")
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("promptforge.toml")
    }

    /// Default location of the history database
    pub fn default_history_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().join("history.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[llm]
endpoint = "http://localhost:9999"
timeout_ms = 5000

[models.stages]
analysis = "qwen2:7b"
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.llm.endpoint, "http://localhost:9999");
        assert_eq!(config.llm.timeout_ms, 5000);
        assert_eq!(config.models.stages["analysis"], "qwen2:7b");
        // Untouched sections keep defaults
        assert_eq!(config.server.max_prompt_chars, 50_000);
    }

    #[test]
    fn test_load_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[llm]\ntemperature = 9.0").unwrap();
        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config =
            ConfigLoader::load_from_file(Path::new("/nonexistent/promptforge.toml")).unwrap();
        assert_eq!(config.llm.timeout_ms, 120_000);
    }
}
