//! Attribute-driven route registration with a single-endpoint gateway.

pub mod admin;
pub mod compile;
pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod metadata;
pub mod observability;
pub mod resolve;
pub mod routing;

pub use config::schema::RoutingConfig;
pub use gateway::GatewayResolver;
pub use http::{HandlerRegistry, HttpServer};
pub use lifecycle::{bootstrap, Application, Shutdown};
pub use metadata::{HandlerCatalog, HandlerClass, HandlerMethod, HandlerRef};
pub use routing::{RouteTable, RoutingTable, SharedRouteTable};
