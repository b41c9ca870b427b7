//! Declaration merge engine.
//!
//! # Data Flow
//! ```text
//! HandlerClass
//!     → class.rs (RouteAttributes: prefix, domain, groups, middleware,
//!       wheres, defaults, flags, resource descriptor)
//!     → ClassMetadata (resolved once per class per pass)
//!
//! HandlerMethod + ClassMetadata
//!     → method.rs (MethodAttributes: action, name, overrides)
//!     → EffectiveRouteDescriptor (one per route declaration)
//! ```
//!
//! # Design Decisions
//! - Middleware order is fixed: class, method, then registrar ambient
//! - Maps merge key-wise with the method side winning
//! - Flags fall back method → class → configuration

pub mod class;
pub mod method;

pub use class::{ClassMetadata, ResourceDescriptor, RouteAttributes};
pub use method::{EffectiveRouteDescriptor, MethodAttributes};
