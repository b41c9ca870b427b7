//! Request spans.
//!
//! Every request is wrapped in a span carrying its request id, so log lines
//! from the gateway and the redispatched request correlate.

use axum::http::Request;
use tower_http::request_id::RequestId;
use tower_http::trace::MakeSpan;
use tracing::Span;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Span factory for `TraceLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}
