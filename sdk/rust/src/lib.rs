//! Typed client for the attribute-routing gateway and admin API.

mod client;

pub use client::{GatewayCall, GatewayClient, RouteSummary};
