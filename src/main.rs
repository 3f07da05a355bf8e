use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promptforge::types::RunMode;

/// Parse run mode from string
fn parse_run_mode(s: &str) -> Result<RunMode, String> {
    s.parse()
}

#[derive(Parser)]
#[command(name = "promptforge")]
#[command(
    version,
    about = "Multi-stage prompt enhancement using local Ollama models"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, help = "Config file to use instead of the standard chain")]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Enhance a prompt through the full pipeline
    Enhance {
        #[arg(help = "Prompt text (omit to read from --file or stdin)")]
        prompt: Option<String>,

        #[arg(long, short, help = "Read the prompt from a file")]
        file: Option<PathBuf>,

        #[arg(long, short, value_parser = parse_run_mode, help = "Run mode: auto, standard, solve, boost")]
        mode: Option<RunMode>,

        #[arg(long, help = "Print every intermediate stage output")]
        show_stages: bool,

        #[arg(long, help = "Do not record this run in history")]
        no_history: bool,
    },

    /// Start the local HTTP API
    Serve {
        #[arg(long, help = "Bind address override")]
        host: Option<String>,

        #[arg(long, short, help = "Port override")]
        port: Option<u16>,
    },

    /// Check the Ollama daemon and configured models
    Health,

    /// Show or clear stored runs
    History {
        #[arg(long, short = 'n', default_value = "10", help = "Entries to show")]
        limit: usize,

        #[arg(long, help = "Delete all stored runs")]
        clear: bool,

        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Write a default configuration file
    Init {
        #[arg(long, short, help = "Initialize the global config")]
        global: bool,
        #[arg(long, help = "Overwrite an existing config")]
        force: bool,
    },
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Enhance {
            prompt,
            file,
            mode,
            show_stages,
            no_history,
        } => {
            promptforge::cli::commands::enhance::run(
                promptforge::cli::commands::enhance::EnhanceOptions {
                    prompt,
                    file,
                    mode,
                    show_stages,
                    no_history,
                },
                config_path,
            )?;
        }
        Commands::Serve { host, port } => {
            promptforge::cli::commands::serve::run(host, port, config_path)?;
        }
        Commands::Health => {
            promptforge::cli::commands::health::run(config_path)?;
        }
        Commands::History {
            limit,
            clear,
            format,
        } => {
            promptforge::cli::commands::history::run(limit, clear, &format, config_path)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                promptforge::cli::commands::config::show(&format, config_path)?;
            }
            ConfigAction::Path => {
                promptforge::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                promptforge::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
