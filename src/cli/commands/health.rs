//! Health Command
//!
//! Probes the Ollama daemon and reports which configured models it is
//! missing.

use std::path::Path;

use tokio::runtime::Runtime;

use crate::cli::{CommandContext, Output};
use crate::types::Result;

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let out = Output::new();
    let ctx = CommandContext::load(config_path)?;
    let gateway = ctx.gateway()?;
    let pipeline = ctx.pipeline()?;

    let rt = Runtime::new()?;

    out.header("Ollama");
    match rt.block_on(gateway.health_check())? {
        true => out.success(&format!("Daemon reachable at {}", ctx.config.llm.endpoint)),
        false => {
            out.error(&format!(
                "Daemon not reachable at {}. Start it with: ollama serve",
                ctx.config.llm.endpoint
            ));
            return Ok(());
        }
    }

    out.header("Models");
    let missing = rt.block_on(pipeline.validate_models())?;
    if missing.is_empty() {
        out.success("All configured models are available.");
    } else {
        for model in &missing {
            out.warning(&format!("{model} is not pulled (ollama pull {model})"));
        }
    }

    Ok(())
}
