//! Configuration file watcher for hot reload.
//!
//! Only the gateway alias table is hot-swappable; every other setting is
//! read once at startup. Reloads that change other sections are applied for
//! aliases only, with a warning naming the sections left unchanged.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::loader::load_config;
use crate::config::schema::{GatewayConfig, RoutingConfig};
use crate::gateway::alias::AliasTable;
use crate::gateway::GatewayResolver;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RoutingConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RoutingConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::info!(path = ?path, "Config file change detected, reloading");
                    match load_config(&path) {
                        Ok(config) => {
                            let _ = tx.send(config);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config; keeping current aliases");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn differs<T: Serialize>(current: &T, next: &T) -> bool {
    serde_json::to_value(current).ok() != serde_json::to_value(next).ok()
}

/// Sections of `next` that differ from the running configuration and
/// therefore need a restart. The alias table is excluded.
pub fn ignored_changes(running: &RoutingConfig, next: &RoutingConfig) -> Vec<&'static str> {
    let without_aliases = |gateway: &GatewayConfig| GatewayConfig {
        alias: AliasTable::default(),
        ..gateway.clone()
    };

    [
        ("listener", differs(&running.listener, &next.listener)),
        ("timeouts", differs(&running.timeouts, &next.timeouts)),
        ("routing", differs(&running.routing, &next.routing)),
        (
            "gateway",
            differs(&without_aliases(&running.gateway), &without_aliases(&next.gateway)),
        ),
        ("values", running.values != next.values),
        ("observability", differs(&running.observability, &next.observability)),
        ("admin", differs(&running.admin, &next.admin)),
    ]
    .into_iter()
    .filter_map(|(section, changed)| changed.then_some(section))
    .collect()
}

/// Apply reloaded configurations to the resolver until the channel closes.
/// Changes outside the alias table are compared against `running` and logged.
pub fn spawn_alias_reloader(
    mut updates: mpsc::UnboundedReceiver<RoutingConfig>,
    running: Arc<RoutingConfig>,
    resolver: Arc<GatewayResolver>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(config) = updates.recv().await {
            let ignored = ignored_changes(&running, &config);
            if !ignored.is_empty() {
                tracing::warn!(sections = ?ignored, "Config changes outside gateway aliases need a restart; ignored");
            }

            let versions = config.gateway.alias.versions().count();
            resolver.reload_aliases(config.gateway.alias);
            tracing::info!(versions, "Gateway aliases reloaded");
        }
    })
}
