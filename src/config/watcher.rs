//! Configuration file watcher for hot reload.
//!
//! Only breaker policies are reloadable. Breakers that already exist keep
//! the policy they were created with; the reloaded policies apply to
//! dependencies seen for the first time afterwards.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;
use crate::resilience::BreakerRegistry;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are
    /// wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        match load_config(&path) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                tracing::error!(
                                    "Failed to reload config: {}. Keeping current configuration.",
                                    e
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Push the breaker policies of a reloaded config into the registry.
pub fn apply_reload(registry: &BreakerRegistry, config: &GatewayConfig) {
    match config.breaker.to_policies() {
        Ok((default, overrides)) => registry.update_policies(default, overrides),
        // load_config already validated; only reachable for hand-built configs.
        Err(errors) => {
            for e in errors {
                tracing::error!(error = %e, "Ignoring invalid breaker policy on reload");
            }
        }
    }
}

/// Apply every config update received on `updates` until the sender closes.
pub async fn run_reload_loop(
    registry: Arc<BreakerRegistry>,
    mut updates: mpsc::UnboundedReceiver<GatewayConfig>,
) {
    while let Some(config) = updates.recv().await {
        apply_reload(&registry, &config);
    }
    tracing::debug!("Config update channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PolicyOverride;

    #[tokio::test]
    async fn test_reload_loop_updates_policies() {
        let registry = Arc::new(BreakerRegistry::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_reload_loop(registry.clone(), rx));

        let mut config = GatewayConfig::default();
        config.breaker.defaults.failure_threshold = 9;
        config.breaker.services.insert(
            "cars".into(),
            PolicyOverride {
                min_volume: Some(1),
                ..Default::default()
            },
        );
        tx.send(config).unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(registry.policy_for("boats").failure_threshold(), 9);
        assert_eq!(registry.policy_for("cars").min_volume(), 1);
        assert_eq!(registry.policy_for("cars").failure_threshold(), 9);
    }

    #[test]
    fn test_invalid_reload_keeps_policies() {
        let registry = BreakerRegistry::default();
        let mut config = GatewayConfig::default();
        config.breaker.defaults.failure_threshold = 0;

        apply_reload(&registry, &config);
        assert_eq!(registry.policy_for("any").failure_threshold(), 5);
    }
}
