//! Enhance Command
//!
//! Runs the pipeline on a prompt taken from the argument, a file, or
//! stdin, streaming stage progress to stderr-style status lines and the
//! final output to stdout.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::warn;

use crate::cli::{CommandContext, Output};
use crate::pipeline::{FnObserver, ProgressEvent};
use crate::types::{Error, Result, RunMode, STANDARD_STAGES, StageName};

pub struct EnhanceOptions {
    pub prompt: Option<String>,
    pub file: Option<PathBuf>,
    pub mode: Option<RunMode>,
    /// Print every intermediate stage output, not just the final one
    pub show_stages: bool,
    pub no_history: bool,
}

pub fn run(options: EnhanceOptions, config_path: Option<&Path>) -> Result<()> {
    let out = Output::new();
    let ctx = CommandContext::load(config_path)?;

    let prompt = read_prompt(&options)?;

    let observer = Arc::new(FnObserver(move |event: &ProgressEvent| {
        let output = Output::new();
        match event {
            ProgressEvent::Completed { .. } => {}
            other => output.phase(other.message()),
        }
    }));

    let pipeline = ctx.pipeline()?.with_observer(observer);

    let rt = Runtime::new()?;
    let run = rt.block_on(pipeline.execute(&prompt, options.mode))?;

    if options.show_stages {
        for stage in STANDARD_STAGES {
            if let Some(text) = run.results.get(stage.result_key()) {
                out.section(stage.as_str());
                println!("{}", text);
            }
        }
        if let Some(solved) = run.results.get(StageName::Solve.result_key()) {
            out.section("solve");
            println!("{}", solved);
        }
    }

    if let Some(failure) = run.failure {
        out.error(&format!("Pipeline failed: {}", failure));
        if !run.results.is_empty() && !options.show_stages {
            out.info("Partial results are available with --show-stages.");
        }
        return Err(failure);
    }

    if !options.no_history {
        match ctx.history_store() {
            Ok(store) => {
                if let Err(e) = store.add(&run) {
                    warn!(error = %e, "Failed to record run in history");
                }
            }
            Err(e) => warn!(error = %e, "History store unavailable"),
        }
    }

    if !options.show_stages {
        out.success(&format!("Done ({} mode).", run.mode));
    }
    println!("{}", run.final_output().unwrap_or_default());

    Ok(())
}

fn read_prompt(options: &EnhanceOptions) -> Result<String> {
    if let Some(prompt) = &options.prompt {
        return Ok(prompt.clone());
    }
    if let Some(path) = &options.file {
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        return Err(Error::InvalidPrompt(
            "no prompt given (pass one as an argument, with --file, or on stdin)".to_string(),
        ));
    }
    Ok(buffer)
}
