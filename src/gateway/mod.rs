//! Chat Gateway Abstraction
//!
//! Adapts a (model, conversation) pair into a single awaited call against the
//! LLM serving daemon. The gateway owns lazy initialization (health probe on
//! first use), transport-error classification, and the process-wide
//! "service ready" flag that front ends may surface.
//!
//! ## Modules
//!
//! - `ollama`: reqwest-backed implementation against a local Ollama daemon

mod ollama;

pub use ollama::OllamaGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::constants;
use crate::types::Result;

// =============================================================================
// Conversation Types
// =============================================================================

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation sent to the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-call options
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Budget for this call; exceeding it surfaces as `Error::Timeout`
    pub timeout: Duration,
    /// Sampling temperature, if the stage cares
    pub temperature: Option<f32>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(constants::network::MODEL_CALL_TIMEOUT_MS),
            temperature: None,
        }
    }
}

impl ChatOptions {
    /// Options with temperature pinned to 0 (solve/verify calls)
    pub fn deterministic(self) -> Self {
        Self {
            temperature: Some(0.0),
            ..self
        }
    }
}

// =============================================================================
// Gateway Trait
// =============================================================================

/// Shared gateway handle for concurrent front ends.
pub type SharedGateway = Arc<dyn ChatGateway>;

/// Single blocking chat call against the serving daemon.
///
/// Implementations must perform lazy single-flight initialization on first
/// use and classify transport failures into the typed error taxonomy.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Send one conversation to `model` and return the response text.
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String>;

    /// Probe the daemon; returns whether it is reachable and serving.
    async fn health_check(&self) -> Result<bool>;

    /// Models the daemon currently has available.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Last observed readiness of the daemon, without probing.
    fn is_ready(&self) -> bool;
}
