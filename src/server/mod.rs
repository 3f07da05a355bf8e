//! HTTP API Surface
//!
//! Small axum server exposing the pipeline to local callers:
//!
//! - `POST /process_prompt` with `{"prompt": "...", "mode": "..."}`,
//!   answering `{"output": "...", "status": "success"}` or `{"error": "..."}`
//! - `GET /health` for monitoring
//!
//! Runs are serialized behind a semaphore so one local daemon is never
//! asked to juggle overlapping pipelines. Internal error details never
//! reach the response body.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::pipeline::Pipeline;
use crate::storage::HistoryStore;
use crate::types::{Error, Result, RunMode};

/// Shared state behind every handler
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub history: Option<Arc<HistoryStore>>,
    pub max_prompt_chars: usize,
    /// Single-permit gate serializing pipeline runs
    run_gate: Semaphore,
}

impl AppState {
    pub fn new(
        pipeline: Arc<Pipeline>,
        history: Option<Arc<HistoryStore>>,
        max_prompt_chars: usize,
    ) -> Self {
        Self {
            pipeline,
            history,
            max_prompt_chars,
            run_gate: Semaphore::new(1),
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/process_prompt", post(process_prompt))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "service": "promptforge"}))
}

async fn process_prompt(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Ok(Json(data)) = payload else {
        return bad_request("No JSON data provided");
    };

    let prompt = match validate_prompt(&data, state.max_prompt_chars) {
        Ok(prompt) => prompt,
        Err(message) => return bad_request(&message),
    };

    let mode = match parse_mode(&data) {
        Ok(mode) => mode,
        Err(message) => return bad_request(&message),
    };

    info!(prompt_chars = prompt.len(), "Processing prompt");

    // One run at a time; later requests wait their turn
    let _permit = match state.run_gate.acquire().await {
        Ok(permit) => permit,
        Err(_) => {
            return internal_error("An error occurred while processing your prompt");
        }
    };

    let run = match state.pipeline.execute(&prompt, mode).await {
        Ok(run) => run,
        Err(Error::InvalidPrompt(message)) => return bad_request(&message),
        Err(e) => {
            error!(error = %e, "Pipeline rejected request");
            return internal_error("An error occurred while processing your prompt");
        }
    };

    if let Some(failure) = &run.failure {
        error!(error = %failure, "Pipeline run failed");
        return internal_error("An error occurred while processing your prompt");
    }

    let output = run.final_output().unwrap_or_default().to_string();

    if let Some(history) = &state.history
        && let Err(e) = history.add(&run)
    {
        warn!(error = %e, "Failed to record run in history");
    }

    info!("Prompt processed successfully");
    (
        StatusCode::OK,
        Json(json!({"output": output, "status": "success"})),
    )
}

// =============================================================================
// Request Validation
// =============================================================================

fn validate_prompt(data: &Value, max_chars: usize) -> std::result::Result<String, String> {
    let Some(prompt) = data.get("prompt") else {
        return Err("Missing 'prompt' field in request".to_string());
    };
    let Some(prompt) = prompt.as_str() else {
        return Err("'prompt' must be a string".to_string());
    };
    if prompt.trim().is_empty() {
        return Err("'prompt' cannot be empty".to_string());
    }
    if prompt.chars().count() > max_chars {
        return Err(format!(
            "'prompt' exceeds maximum length of {} characters",
            max_chars
        ));
    }
    Ok(prompt.trim().to_string())
}

fn parse_mode(data: &Value) -> std::result::Result<Option<RunMode>, String> {
    match data.get("mode") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s.parse().map(Some),
        Some(_) => Err("'mode' must be a string".to_string()),
    }
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    warn!("Invalid request: {}", message);
    (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
}

fn internal_error(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": message})),
    )
}
