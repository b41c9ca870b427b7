//! Gateway endpoint: one physical route dispatching to many logical ones.
//!
//! # Data Flow
//! ```text
//! POST /gateway.do {action, version, ...}
//!     → resolver.rs (extract action/version)
//!     → alias.rs (per-version prefix substitution)
//!     → named route in the table?  → its uri
//!     → convention.rs (dotted name → Namespace\NameController::method)
//!     → catalog verification → synthesize + register route (once per name)
//!     → dispatch.rs (fill {params}, rewrite method/uri, keep headers and body)
//!     → Dispatch boundary (routing table again)
//! ```
//!
//! # Design Decisions
//! - Unresolved actions dispatch to a sentinel path with GET; the table's
//!   not-found handling is the observable failure
//! - Aliases hot-swap through `ArcSwap`; resolution reads a snapshot

pub mod alias;
pub mod convention;
pub mod dispatch;
pub mod resolver;

pub use alias::{AliasMap, AliasTable, DEFAULT_VERSION};
pub use convention::{derive_handler_reference, synthesized_path, HandlerReference};
pub use dispatch::{replace_route_parameters, rewrite_request, Dispatch};
pub use resolver::{
    register_endpoint, GatewayInput, GatewayResolution, GatewayResolver, ResolutionOutcome,
    GATEWAY_ROUTE_NAME, SENTINEL_PATH,
};
