//! Serve Command
//!
//! Starts the local HTTP API.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::warn;

use crate::cli::{CommandContext, Output};
use crate::server::{AppState, serve};
use crate::types::{Error, Result};

pub fn run(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let out = Output::new();
    let ctx = CommandContext::load(config_path)?;

    let host = host.unwrap_or_else(|| ctx.config.server.host.clone());
    let port = port.unwrap_or(ctx.config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| Error::Config(format!("invalid bind address {host}:{port}: {e}")))?;

    let pipeline = Arc::new(ctx.pipeline()?);
    let history = match ctx.history_store() {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!(error = %e, "History store unavailable, serving without history");
            None
        }
    };

    let state = Arc::new(AppState::new(
        pipeline,
        history,
        ctx.config.server.max_prompt_chars,
    ));

    out.info(&format!("Serving on http://{addr}"));
    let rt = Runtime::new()?;
    rt.block_on(serve(state, addr))
}
