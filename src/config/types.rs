//! Configuration Types
//!
//! All configuration structures with sensible defaults. Model assignments
//! and fallback chains are configuration, loaded once at startup and
//! reloadable only by restart.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants;
use crate::types::RunMode;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Ollama connection settings
    pub llm: LlmConfig,

    /// Pipeline behavior settings
    pub pipeline: PipelineConfig,

    /// Stage-to-model assignments and fallback chains
    pub models: ModelsConfig,

    /// HTTP API settings
    pub server: ServerConfig,

    /// History persistence settings
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            pipeline: PipelineConfig::default(),
            models: ModelsConfig::default(),
            server: ServerConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `Error::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(crate::types::Error::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_ms == 0 {
            return Err(crate::types::Error::Config(
                "llm timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.server.max_prompt_chars == 0 {
            return Err(crate::types::Error::Config(
                "server max_prompt_chars must be greater than 0".to_string(),
            ));
        }

        if self.history.max_entries == 0 {
            return Err(crate::types::Error::Config(
                "history max_entries must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Connection Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama endpoint URL
    pub endpoint: String,

    /// Per-call model timeout (milliseconds)
    pub timeout_ms: u64,

    /// Health probe timeout (seconds)
    pub health_timeout_secs: u64,

    /// Sampling temperature passed to stage calls (solve mode forces 0.0)
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::network::DEFAULT_API_BASE.to_string(),
            timeout_ms: constants::network::MODEL_CALL_TIMEOUT_MS,
            health_timeout_secs: constants::network::HEALTH_TIMEOUT_SECS,
            temperature: 0.7,
        }
    }
}

impl LlmConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}

// =============================================================================
// Pipeline Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Default run mode when the caller does not specify one
    pub mode: RunMode,

    /// Primary-model attempts before fallbacks are consulted
    pub max_retries: u32,

    /// Model used for boost mode's reflection round-trips
    pub boost_model: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Auto,
            max_retries: constants::retry::DEFAULT_MAX_RETRIES,
            boost_model: constants::pipeline::DEFAULT_BOOST_MODEL.to_string(),
        }
    }
}

// =============================================================================
// Model Assignments
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Stage name -> model identifier
    pub stages: BTreeMap<String, String>,

    /// Model identifier -> ordered substitute models
    pub fallbacks: BTreeMap<String, Vec<String>>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        let stages = [
            ("analysis", "llama3.2:latest"),
            ("generation", "olmo2:13b"),
            ("vetting", "deepseek-r1"),
            ("finalization", "deepseek-r1:14b"),
            ("enhancement", "phi4:latest"),
            ("comprehensive", "phi4:latest"),
            ("presenter", "deepseek-r1:14b"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let fallbacks = [
            ("llama3.2:latest", vec!["deepseek-r1", "phi4:latest"]),
            ("olmo2:13b", vec!["deepseek-r1:14b", "phi4:latest"]),
            ("deepseek-r1", vec!["phi4:latest", "llama3.2:latest"]),
            ("deepseek-r1:14b", vec!["phi4:latest", "deepseek-r1"]),
            ("phi4:latest", vec!["deepseek-r1:14b", "llama3.2:latest"]),
        ]
        .into_iter()
        .map(|(k, v)| {
            (
                k.to_string(),
                v.into_iter().map(|m| m.to_string()).collect(),
            )
        })
        .collect();

        Self { stages, fallbacks }
    }
}

// =============================================================================
// HTTP API Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Maximum accepted prompt length (characters)
    pub max_prompt_chars: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: constants::server::DEFAULT_HOST.to_string(),
            port: constants::server::DEFAULT_PORT,
            max_prompt_chars: constants::server::MAX_PROMPT_CHARS,
        }
    }
}

// =============================================================================
// History Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Entries kept before the oldest are trimmed
    pub max_entries: usize,

    /// Database path; defaults to the platform data directory
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: constants::history::DEFAULT_MAX_ENTRIES,
            path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_stage_models() {
        let models = ModelsConfig::default();
        assert_eq!(models.stages["analysis"], "llama3.2:latest");
        assert_eq!(models.stages["presenter"], "deepseek-r1:14b");
        assert_eq!(models.stages.len(), 7);
    }

    #[test]
    fn test_default_fallback_chains() {
        let models = ModelsConfig::default();
        assert_eq!(
            models.fallbacks["llama3.2:latest"],
            vec!["deepseek-r1", "phi4:latest"]
        );
        // Every assigned model carries a chain in the defaults
        for model in models.stages.values() {
            assert!(models.fallbacks.contains_key(model), "no chain for {model}");
        }
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.llm.timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
