//! Subcommand handlers.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::Commands;
use exovision_core::config::ExovisionConfig;
use exovision_core::{GatewayServer, ModelHandle, run_gateway};

/// Dispatch a parsed subcommand against the loaded configuration.
pub async fn handle_command(command: Commands, config: ExovisionConfig) -> anyhow::Result<()> {
    match command {
        Commands::Serve { host, port, model } => {
            let config = apply_serve_overrides(config, host, port, model);
            handle_serve(config).await
        }
        Commands::CheckModel { model } => {
            let config = apply_serve_overrides(config, None, None, model);
            handle_check_model(&config)
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

/// CLI flags sit on top of every other configuration layer.
fn apply_serve_overrides(
    mut config: ExovisionConfig,
    host: Option<String>,
    port: Option<u16>,
    model: Option<PathBuf>,
) -> ExovisionConfig {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(model) = model {
        config.model.artifact_path = model;
    }
    config
}

async fn handle_serve(config: ExovisionConfig) -> anyhow::Result<()> {
    let gw = Arc::new(GatewayServer::new(config));

    // A missing model is not fatal: /health reports it and /model/reload can
    // pick it up later.
    if let Err(e) = gw.store().load() {
        error!(
            path = %gw.store().artifact_path().display(),
            error = %e,
            "Initial model load failed; serving without a model"
        );
    }

    info!(addr = %gw.config().bind_addr(), "Starting Exovision API");
    run_gateway(gw).await?;
    Ok(())
}

fn handle_check_model(config: &ExovisionConfig) -> anyhow::Result<()> {
    let handle = ModelHandle::load(&config.model, &config.features).map_err(|e| {
        anyhow::anyhow!(
            "Model check failed for {}: {}",
            config.model.artifact_path.display(),
            e
        )
    })?;
    println!("{}", serde_json::to_string_pretty(&handle.info())?);
    Ok(())
}
