//! HTTP hosting subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, trace, timeout)
//!     → route table match (routing/)
//!         → gateway route?  → request.rs (input) → gateway/ → redispatch
//!         → handlers.rs (bound handler or echo fallback)
//!     → response.rs (404 / 405 / 501 shapes)
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::{HandlerContext, HandlerRegistry};
pub use server::{AppState, HttpServer, ServerError};
