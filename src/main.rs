//! Attribute routing server.
//!
//! Compiles routes declared on handler classes into a route table and serves
//! them, together with a single gateway endpoint that maps logical actions
//! onto those routes.
//!
//! # Architecture Overview
//!
//! ```text
//!   handler catalog (TOML)        routing.toml
//!           │                          │
//!           ▼                          ▼
//!   ┌───────────────┐          ┌───────────────┐
//!   │   metadata    │          │    config     │──── watcher (aliases)
//!   └───────┬───────┘          └───────┬───────┘          │
//!           ▼                          │                  │
//!   ┌───────────────┐                  │                  │
//!   │   resolve     │◀─────────────────┘                  │
//!   └───────┬───────┘                                     │
//!           ▼                                             │
//!   ┌───────────────┐     ┌───────────────┐     ┌─────────▼─────┐
//!   │   compile     │────▶│   routing     │◀────│   gateway     │
//!   └───────────────┘     │   (table)     │     │   resolver    │
//!                         └───────┬───────┘     └─────────▲─────┘
//!                                 ▼                       │
//!     Client Request ──────▶ ┌─────────┐   gateway route  │
//!                            │  http   │──────────────────┘
//!     Client Response ◀───── │ server  │ ── handlers
//!                            └─────────┘
//! ```
//!
//! Usage: `attribute-routing [CONFIG]` (default `routing.toml`, or the
//! `ROUTING_CONFIG` environment variable). A missing file runs on defaults.

use std::path::PathBuf;

use tokio::net::TcpListener;

use attribute_routing::config::watcher::{spawn_alias_reloader, ConfigWatcher};
use attribute_routing::config::{load_config, RoutingConfig};
use attribute_routing::http::{HandlerRegistry, HttpServer, ServerError};
use attribute_routing::lifecycle::signals::spawn_signal_handler;
use attribute_routing::lifecycle::{bootstrap, load_catalog, Shutdown};
use attribute_routing::observability::{logging, metrics};

fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ROUTING_CONFIG").ok())
        .unwrap_or_else(|| "routing.toml".to_string())
        .into()
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let path = config_path();
    let config = if path.exists() {
        load_config(&path)?
    } else {
        RoutingConfig::default()
    };

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %path.display(),
        loaded = path.exists(),
        "attribute-routing starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let catalog = load_catalog(&config)?;
    let bind_address = config.listener.bind_address.clone();
    let app = bootstrap(config, catalog);

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = if path.exists() {
        let (watcher, updates) = ConfigWatcher::new(&path);
        spawn_alias_reloader(updates, app.config.clone(), app.resolver.clone());
        match watcher.run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "Config watcher unavailable; aliases will not hot-reload");
                None
            }
        }
    } else {
        None
    };

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| ServerError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(&app, HandlerRegistry::with_echo_fallback());
    server.run(listener, shutdown.wait()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
