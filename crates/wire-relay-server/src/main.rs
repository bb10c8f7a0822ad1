//! # Wire-Relay Server
//!
//! Command-line embedding of the wire-relay proxy core. Loads a TOML config,
//! installs hooks that report lifecycle transitions to the log, and runs the
//! supervisor until Ctrl-C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wire_relay_core::{Error, ProxyConfig, ProxySupervisor, RelayHooks, SessionInfo};

/// Hook set that reports every lifecycle transition to the log.
struct LoggingHooks;

impl RelayHooks for LoggingHooks {
    fn on_waiting_for_client(&self) {
        info!("waiting for client");
    }

    fn on_new_client(&self, session: &SessionInfo) {
        info!(
            session = %session.id,
            client = %session.client_addr,
            "client connected"
        );
    }

    fn on_new_server(&self, session: &SessionInfo) {
        info!(
            session = %session.id,
            upstream = %session.upstream_addr,
            "upstream connected"
        );
    }

    fn on_client_lost(&self, session: &SessionInfo) {
        info!(session = %session.id, "client lost");
    }

    fn on_server_lost(&self, session: &SessionInfo) {
        info!(session = %session.id, "upstream lost");
    }

    fn on_client_error(&self, err: &Error) {
        error!("listener error: {}", err);
    }

    fn on_server_error(&self, err: &Error) {
        error!("upstream error: {}", err);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, config_path) = load_config()?;

    init_logging(&config.logging.level);

    info!("starting wire-relay v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("loaded configuration from {}", path),
        None => info!("no config file found, using defaults"),
    }

    let supervisor = ProxySupervisor::new(config, Arc::new(LoggingHooks));
    let shutdown = supervisor.shutdown_token();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("received shutdown signal");
        shutdown.cancel();
    });

    supervisor.run().await?;

    info!("wire-relay shut down");
    Ok(())
}

/// Load configuration from file or use defaults.
/// Returns (config, config path if one was found).
fn load_config() -> Result<(ProxyConfig, Option<String>)> {
    let config_paths = ["config.toml", "/etc/wire-relay/config.toml"];

    for path in config_paths {
        if std::path::Path::new(path).exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            let config: ProxyConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?;
            return Ok((config, Some(path.to_string())));
        }
    }

    Ok((ProxyConfig::default(), None))
}

/// Initialize logging with the specified level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
