//! Routing table subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup, and just-in-time from the gateway):
//!     add_route(verbs, uri, action)
//!     → route.rs (RegisteredRoute, scoped by the active GroupScope)
//!     → router.rs (stored in registration order)
//!
//! Incoming Request (method, host, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (template + constraint evaluation)
//!     → Return: Found(route, params) | MethodNotAllowed | NotFound
//! ```
//!
//! # Design Decisions
//! - The table owns collision handling; the compiler only submits records
//! - Matchers compile lazily and are cached per route
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod route;
pub mod router;

pub use route::{GroupScope, RegisteredRoute};
pub use router::{MatchedRoute, RouteMatch, RouteTable, RoutingTable, SharedRouteTable};
