//! Route compilation subsystem.
//!
//! # Data Flow
//! ```text
//! routing.directories (config)
//!     → discovery.rs (walk + glob filter → file → class name)
//!     → catalog lookup (unknown classes skipped)
//!     → resolve/ (class metadata, per-method descriptors)
//!     → resource.rs (resource/singleton shorthand expansion)
//!     → registrar.rs (groups + registration into the routing table)
//! ```
//!
//! # Design Decisions
//! - Compilation runs once at startup, before the table is shared
//! - A resource class registers its shorthand routes only, unless
//!   `exclusive_resources` is turned off

pub mod discovery;
pub mod registrar;
pub mod resource;

pub use discovery::{class_name_from_path, normalize_namespace, scan};
pub use registrar::RouteRegistrar;
pub use resource::{expand, ResourceRoute};

use crate::config::schema::RoutingConfig;
use crate::metadata::catalog::HandlerCatalog;
use crate::routing::router::RoutingTable;

/// Compile every configured directory into `table`. Returns the number of
/// routes registered; zero when registration is disabled.
pub fn compile_routes<T: RoutingTable>(table: &mut T, catalog: &HandlerCatalog, config: &RoutingConfig) -> usize {
    if !config.routing.enabled {
        tracing::info!("Attribute route registration disabled");
        return 0;
    }

    let mut registrar = RouteRegistrar::new(table, catalog, config);
    registrar.directories(&config.routing.directories);
    let registered = registrar.registered();

    tracing::info!(
        directories = config.routing.directories.len(),
        routes = registered,
        "Attribute routes compiled"
    );
    registered
}
