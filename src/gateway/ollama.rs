//! Ollama Chat Gateway
//!
//! reqwest-backed gateway against a locally running Ollama daemon.
//! First use probes `/api/tags` before forwarding any chat call; the probe is
//! serialized behind a mutex so concurrent runs cannot race duplicate
//! initializations. Readiness is tracked in a flag front ends can read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{ChatGateway, ChatMessage, ChatOptions};
use crate::config::LlmConfig;
use crate::types::{Error, Result};

/// Ollama serving daemon gateway
pub struct OllamaGateway {
    api_base: String,
    client: reqwest::Client,
    health_timeout: Duration,
    ready: AtomicBool,
    init_lock: Mutex<()>,
}

impl OllamaGateway {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_base = Self::validate_endpoint(&config.endpoint)?;

        // No client-wide timeout: each call carries its own budget.
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::ServiceUnavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base,
            client,
            health_timeout: config.health_timeout(),
            ready: AtomicBool::new(false),
            init_lock: Mutex::new(()),
        })
    }

    /// Validate endpoint URL for security (SSRF prevention)
    ///
    /// Only allows http/https schemes and warns for non-localhost endpoints.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            Error::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "::1")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }

    /// One-time lazy initialization: probe the daemon, then mark ready.
    /// Serialized so concurrent callers do not race duplicate probes or
    /// duplicate "service ready" notifications.
    async fn ensure_ready(&self) -> Result<()> {
        if self.ready.load(Ordering::SeqCst) {
            return Ok(());
        }

        let _guard = self.init_lock.lock().await;
        if self.ready.load(Ordering::SeqCst) {
            return Ok(());
        }

        debug!("Probing Ollama at {}", self.api_base);
        match self.probe().await {
            Ok(()) => {
                self.ready.store(true, Ordering::SeqCst);
                info!("Ollama service ready at {}", self.api_base);
                Ok(())
            }
            Err(e) => {
                warn!("Ollama not ready: {}. Start with: ollama serve", e);
                Err(e)
            }
        }
    }

    async fn probe(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.api_base);
        let response = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, "health probe", self.health_timeout))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::ServiceUnavailable(format!(
                "health probe returned status {}",
                response.status()
            )))
        }
    }

    async fn fetch_tags(&self) -> Result<TagsResponse> {
        self.ensure_ready().await?;

        let url = format!("{}/api/tags", self.api_base);
        let response = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, "list models", self.health_timeout))?;

        if !response.status().is_success() {
            return Err(Error::ServiceUnavailable(format!(
                "tag listing returned status {}",
                response.status()
            )));
        }

        response
            .json::<TagsResponse>()
            .await
            .map_err(|e| Error::ServiceUnavailable(format!("Failed to parse tag listing: {}", e)))
    }
}

#[async_trait]
impl ChatGateway for OllamaGateway {
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String> {
        self.ensure_ready().await?;

        let request = ChatRequest {
            model,
            messages,
            stream: false,
            options: options.temperature.map(|temperature| ModelOptions { temperature }),
        };
        let url = format!("{}/api/chat", self.api_base);

        debug!(model, timeout_ms = options.timeout.as_millis() as u64, "Sending chat request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                // A vanished daemon must trigger a fresh probe on the next call
                if e.is_connect() {
                    self.ready.store(false, Ordering::SeqCst);
                }
                classify_transport_error(e, &format!("chat({})", model), options.timeout)
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_daemon_error(status, &body, model));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::model(model, format!("malformed response: {}", e)))?;

        Ok(body.message.content)
    }

    async fn health_check(&self) -> Result<bool> {
        match self.probe().await {
            Ok(()) => {
                self.ready.store(true, Ordering::SeqCst);
                Ok(true)
            }
            Err(Error::ServiceUnavailable(_)) | Err(Error::Timeout { .. }) => {
                self.ready.store(false, Ordering::SeqCst);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let tags = self.fetch_tags().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Error Classification
// =============================================================================

/// Map a reqwest transport error onto the typed taxonomy.
/// This is the only place transport errors are inspected.
fn classify_transport_error(err: reqwest::Error, operation: &str, timeout: Duration) -> Error {
    if err.is_timeout() {
        Error::timeout(operation, timeout)
    } else if err.is_connect() {
        Error::ServiceUnavailable(format!(
            "cannot connect to Ollama ({}): {}",
            operation, err
        ))
    } else {
        Error::ServiceUnavailable(format!("{}: {}", operation, err))
    }
}

/// Classify a non-2xx daemon response. Ollama reports model problems with
/// status 404/400 and a JSON `{"error": "..."}` body; the message matching
/// against known daemon formats is confined to this one function.
fn classify_daemon_error(status: u16, body: &str, model: &str) -> Error {
    let message = serde_json::from_str::<DaemonError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string());

    match status {
        404 => Error::model(model, format!("not available: {}", message)),
        400 if message.to_lowercase().contains("model") => {
            Error::model(model, message)
        }
        500..=599 => Error::ServiceUnavailable(format!("daemon error ({}): {}", status, message)),
        _ => Error::model(model, format!("daemon returned status {}: {}", status, message)),
    }
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ModelOptions>,
}

#[derive(Debug, Serialize)]
struct ModelOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<TaggedModel>,
}

#[derive(Debug, Deserialize)]
struct TaggedModel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DaemonError {
    error: String,
}
