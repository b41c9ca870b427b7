//! Declarative routing metadata.
//!
//! # Data Flow
//! ```text
//! HandlerCatalog (code or TOML manifest)
//!     → handler.rs (HandlerClass / HandlerMethod descriptors)
//!     → attributes.rs (typed declarations per element)
//!     → reader.rs (kind lookup + left fold)
//!     → resolve/ (merge policy)
//! ```
//!
//! # Design Decisions
//! - Declarations are plain data, no runtime introspection
//! - Absence of a declaration is a normal result, never an error
//! - Reader applies no precedence rules; resolvers own them

pub mod attributes;
pub mod catalog;
pub mod handler;
pub mod reader;

pub use attributes::{Attribute, AttributeKind, Route, Verb};
pub use catalog::{CatalogError, HandlerCatalog};
pub use handler::{HandlerClass, HandlerMethod, HandlerRef, Visibility};
pub use reader::Annotated;
