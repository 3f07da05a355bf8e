//! Config Command
//!
//! Inspect and initialize configuration files.

use std::path::Path;

use crate::cli::{CommandContext, Output};
use crate::config::{Config, ConfigLoader};
use crate::types::{Error, Result};

/// Print the merged configuration.
pub fn show(format: &str, config_path: Option<&Path>) -> Result<()> {
    let ctx = CommandContext::load(config_path)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&ctx.config)?),
        _ => {
            let toml = toml::to_string_pretty(&ctx.config)
                .map_err(|e| Error::Config(format!("Failed to render config: {}", e)))?;
            println!("{}", toml);
        }
    }
    Ok(())
}

/// Print the config file locations and whether each exists.
pub fn path() -> Result<()> {
    let out = Output::new();

    out.header("Configuration files");
    if let Some(global) = ConfigLoader::global_config_path() {
        let marker = if global.exists() { "exists" } else { "absent" };
        println!("global:  {} ({marker})", global.display());
    }
    let project = ConfigLoader::project_config_path();
    let marker = if project.exists() { "exists" } else { "absent" };
    println!("project: {} ({marker})", project.display());

    if let Some(history) = ConfigLoader::default_history_path() {
        out.header("Data");
        println!("history: {}", history.display());
    }
    Ok(())
}

/// Write a default config file.
pub fn init(global: bool, force: bool) -> Result<()> {
    let out = Output::new();

    let target = if global {
        ConfigLoader::global_config_path().ok_or_else(|| {
            Error::Config("cannot determine a global config directory".to_string())
        })?
    } else {
        ConfigLoader::project_config_path()
    };

    if target.exists() && !force {
        out.warning(&format!(
            "{} already exists (use --force to overwrite)",
            target.display()
        ));
        return Ok(());
    }

    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let toml = toml::to_string_pretty(&Config::default())
        .map_err(|e| Error::Config(format!("Failed to render config: {}", e)))?;
    std::fs::write(&target, toml)?;

    out.success(&format!("Wrote {}", target.display()));
    Ok(())
}
