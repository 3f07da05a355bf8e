//! PromptForge - Multi-Stage Prompt Enhancement for Local LLMs
//!
//! Takes a rough prompt and runs it through a fixed pipeline of
//! conversations with a local Ollama daemon, each stage handled by the
//! model best suited to it, producing a clearer and more effective prompt.
//!
//! ## Core Features
//!
//! - **Staged Pipeline**: analysis, generation, vetting, finalization,
//!   enhancement, and a comprehensive review with a dedicated presenter
//! - **Model Fallback**: every stage retries its model, then walks a
//!   configured fallback chain before giving up
//! - **Solve Shortcut**: prompts that read like problem statements get a
//!   deterministic solve-and-verify pass instead of enhancement
//! - **Boost Mode**: wraps each stage in a self-critique round-trip to get
//!   more out of small models
//! - **Two Front Ends**: a CLI and a small local HTTP API, sharing the
//!   pipeline and a capped SQLite run history
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use promptforge::config::ConfigLoader;
//! use promptforge::gateway::OllamaGateway;
//! use promptforge::pipeline::Pipeline;
//!
//! let config = ConfigLoader::load()?;
//! let gateway = Arc::new(OllamaGateway::new(&config.llm)?);
//! let pipeline = Pipeline::from_config(gateway, &config)?;
//! let run = pipeline.execute("write a story about rust", None).await?;
//! println!("{}", run.final_output().unwrap_or_default());
//! ```
//!
//! ## Modules
//!
//! - [`gateway`]: chat abstraction over the Ollama HTTP API
//! - [`pipeline`]: orchestrator, retry engine, model registry, prompts
//! - [`server`]: axum HTTP surface
//! - [`storage`]: capped SQLite run history
//! - [`config`]: layered configuration loading

pub mod cli;
pub mod config;
pub mod constants;
pub mod gateway;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::{Error, Result};

// Pipeline
pub use pipeline::{ModelRegistry, Pipeline, PipelineRun, RetryPolicy};

// Gateway
pub use gateway::{ChatGateway, ChatMessage, ChatOptions, OllamaGateway, SharedGateway};
