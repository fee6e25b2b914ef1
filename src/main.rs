//! Breaker service.
//!
//! Hosts a [`BreakerRegistry`] configured from a TOML file, exposes it through
//! the admin API and the Prometheus endpoint, and hot-reloads breaker
//! policies when the file changes.
//!
//! ```text
//! gateway-breaker [CONFIG_PATH]      (default: $BREAKER_CONFIG or breaker.toml)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use gateway_breaker::admin::AdminServer;
use gateway_breaker::config::watcher::{run_reload_loop, ConfigWatcher};
use gateway_breaker::config::{load_config, GatewayConfig};
use gateway_breaker::observability::{logging, metrics};
use gateway_breaker::BreakerRegistry;

const DEFAULT_CONFIG_PATH: &str = "breaker.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("BREAKER_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let (config, from_file) = if config_path.exists() {
        (load_config(&config_path)?, true)
    } else {
        (GatewayConfig::default(), false)
    };

    logging::init_logging(&config.observability)?;
    tracing::info!("gateway-breaker v{} starting", env!("CARGO_PKG_VERSION"));
    if from_file {
        tracing::info!(path = ?config_path, "Configuration loaded");
    } else {
        tracing::warn!(path = ?config_path, "Config file not found, using defaults");
    }

    let registry = Arc::new(BreakerRegistry::from_settings(&config.breaker).map_err(|errors| {
        gateway_breaker::config::ConfigError::Validation(errors)
    })?);
    tracing::info!(
        overrides = config.breaker.services.len(),
        failure_threshold = config.breaker.defaults.failure_threshold,
        recovery_timeout_secs = config.breaker.defaults.recovery_timeout_secs,
        "Breaker registry ready"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Held for the lifetime of the process; dropping it stops the watcher.
    let _watcher = if from_file {
        let (watcher, updates) = ConfigWatcher::new(&config_path);
        tokio::spawn(run_reload_loop(registry.clone(), updates));
        match watcher.run() {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::error!(error = %e, "Config watcher failed to start, hot reload disabled");
                None
            }
        }
    } else {
        None
    };

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let server = AdminServer::new(registry.clone(), &config.admin);
        server.run(listener, shutdown_signal()).await?;
    } else {
        tracing::info!("Admin API disabled");
        shutdown_signal().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
