//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Taxonomy
//!
//! - **Config**: unknown stage/model key or bad configuration (fatal, never retried)
//! - **ServiceUnavailable**: Ollama daemon unreachable or not ready
//! - **Timeout**: a single call exceeded its budget (retried per policy)
//! - **Model**: model-specific failure, e.g. not pulled (retried per policy)
//! - **StageExhausted**: aggregated failure after the full retry+fallback budget
//! - **InvalidPrompt**: empty/whitespace prompt, rejected before any LLM call
//!
//! The retry engine does not distinguish retryable kinds: it retries on any
//! failure except `Config` and `InvalidPrompt`, which surface immediately.

use std::time::Duration;
use thiserror::Error;

use super::stage::StageName;

/// One model try within a stage. Carried inside `Error::StageExhausted`
/// so callers see every attempted model, not just the last failure.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Model that was tried
    pub model: String,
    /// 1-based attempt number for that model
    pub attempt: u32,
    /// Error message produced by the attempt
    pub error: String,
}

impl std::fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (attempt {}): {}", self.model, self.attempt, self.error)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Gateway Errors
    // -------------------------------------------------------------------------
    #[error("Ollama service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Model '{model}' failed: {message}")]
    Model { model: String, message: String },

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    /// All retries and fallbacks for one stage failed.
    #[error("Stage '{stage}' exhausted after {} attempts (last: {})",
            attempts.len(),
            attempts.last().map(|a| a.error.as_str()).unwrap_or("no attempts made"))]
    StageExhausted {
        stage: StageName,
        attempts: Vec<AttemptRecord>,
    },

    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a model error
    pub fn model(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Model {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Errors that must surface immediately instead of burning retry budget.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidPrompt(_))
    }

    /// Stage named by an exhaustion error, if this is one.
    pub fn failed_stage(&self) -> Option<StageName> {
        match self {
            Self::StageExhausted { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_exhausted_display() {
        let err = Error::StageExhausted {
            stage: StageName::Analysis,
            attempts: vec![
                AttemptRecord {
                    model: "llama3.2:latest".to_string(),
                    attempt: 1,
                    error: "connection refused".to_string(),
                },
                AttemptRecord {
                    model: "deepseek-r1".to_string(),
                    attempt: 1,
                    error: "model not found".to_string(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("analysis"));
        assert!(msg.contains("2 attempts"));
        assert!(msg.contains("model not found"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::Config("bad key".into()).is_fatal());
        assert!(Error::InvalidPrompt("empty".into()).is_fatal());
        assert!(!Error::ServiceUnavailable("down".into()).is_fatal());
        assert!(!Error::timeout("chat", Duration::from_secs(1)).is_fatal());
    }

    #[test]
    fn test_failed_stage() {
        let err = Error::StageExhausted {
            stage: StageName::Vetting,
            attempts: vec![],
        };
        assert_eq!(err.failed_stage(), Some(StageName::Vetting));
        assert_eq!(Error::Config("x".into()).failed_stage(), None);
    }
}
