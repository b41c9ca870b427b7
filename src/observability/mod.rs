//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! registrar, gateway, http server
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (request spans with request ids)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - The request id survives gateway redispatch

pub mod logging;
pub mod metrics;
pub mod tracing;
