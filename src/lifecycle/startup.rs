//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the handler catalog
//! - Compile attribute routes into a fresh table
//! - Register the gateway endpoint and build the resolver
//!
//! # Design Decisions
//! - Fail fast: a catalog that cannot be read is fatal
//! - Compilation happens before the table is shared, so request handling
//!   never observes a half-built table

use std::path::Path;
use std::sync::Arc;

use crate::compile::compile_routes;
use crate::config::schema::RoutingConfig;
use crate::gateway::resolver::{register_endpoint, GatewayResolver};
use crate::metadata::catalog::{CatalogError, HandlerCatalog};
use crate::routing::router::{RouteTable, SharedRouteTable};

/// Everything the server needs once routes are compiled.
#[derive(Clone)]
pub struct Application {
    pub config: Arc<RoutingConfig>,
    pub catalog: Arc<HandlerCatalog>,
    pub table: SharedRouteTable,
    pub resolver: Arc<GatewayResolver>,
    /// Routes registered by the compile pass.
    pub compiled_routes: usize,
}

/// Read the catalog manifest named by `routing.catalog`, or start empty.
pub fn load_catalog(config: &RoutingConfig) -> Result<HandlerCatalog, CatalogError> {
    match &config.routing.catalog {
        Some(path) => {
            let catalog = HandlerCatalog::load(Path::new(path))?;
            tracing::info!(path = %path, classes = catalog.len(), "Handler catalog loaded");
            Ok(catalog)
        }
        None => {
            tracing::warn!("No handler catalog configured; only the gateway endpoint will be routed");
            Ok(HandlerCatalog::new())
        }
    }
}

/// Compile routes and wire the gateway.
pub fn bootstrap(config: RoutingConfig, catalog: HandlerCatalog) -> Application {
    let mut table = RouteTable::new();
    let compiled_routes = compile_routes(&mut table, &catalog, &config);

    if config.gateway.enabled {
        register_endpoint(&mut table, &config.gateway);
        tracing::info!(endpoint = %config.gateway.endpoint, "Gateway endpoint registered");
    }

    let table = SharedRouteTable::new(table);
    let catalog = Arc::new(catalog);
    let resolver = Arc::new(GatewayResolver::new(table.clone(), catalog.clone(), &config.gateway));

    Application {
        config: Arc::new(config),
        catalog,
        table,
        resolver,
        compiled_routes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GATEWAY_ROUTE_NAME;
    use crate::routing::router::RoutingTable;

    #[test]
    fn test_bootstrap_registers_gateway() {
        let app = bootstrap(RoutingConfig::default(), HandlerCatalog::new());
        let table = app.table.read();
        assert_eq!(table.uri_by_name(GATEWAY_ROUTE_NAME).as_deref(), Some("gateway.do"));
        assert_eq!(app.compiled_routes, 0);
    }

    #[test]
    fn test_gateway_can_be_disabled() {
        let mut config = RoutingConfig::default();
        config.gateway.enabled = false;
        let app = bootstrap(config, HandlerCatalog::new());
        assert!(app.table.read().is_empty());
    }

    #[test]
    fn test_missing_catalog_file_is_an_error() {
        let mut config = RoutingConfig::default();
        config.routing.catalog = Some("/nonexistent/handlers.toml".into());
        assert!(load_catalog(&config).is_err());
    }
}
