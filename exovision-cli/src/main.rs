//! Exovision CLI: serves KOI classification predictions over HTTP.

mod commands;

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use exovision_core::config::LoggingConfig;

/// Exovision: exoplanet candidate classification API
#[derive(Parser, Debug)]
#[command(name = "exovision", version, about, long_about = None)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Start the prediction API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Path to the model artifact
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
    /// Load and validate a model artifact, then print its info
    CheckModel {
        /// Path to the model artifact
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn filter_directive(verbose: u8, quiet: bool, logging: &LoggingConfig) -> String {
    match verbose {
        0 if quiet => "error".to_string(),
        0 => logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn prepare_log_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))
}

/// Human-readable stderr layer plus, when `logging.json_dir` is set, a JSON
/// layer over daily rolling files. `RUST_LOG` wins over the flags.
fn init_tracing(
    directive: &str,
    logging: &LoggingConfig,
) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter());

    let (json_layer, guard) = match &logging.json_dir {
        Some(dir) => {
            prepare_log_dir(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "exovision.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(env_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = exovision_core::load_config(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let directive = filter_directive(cli.verbose, cli.quiet, &config.logging);
    let _guard = init_tracing(&directive, &config.logging)?;

    commands::handle_command(cli.command, config).await
}
