//! Error responses produced by the dispatcher itself.
//!
//! Handler responses pass through untouched; only routing failures are
//! shaped here, always as a small JSON document.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::metadata::attributes::Verb;
use crate::metadata::handler::HandlerRef;

fn error(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(json!({
            "error": status.canonical_reason().unwrap_or("error"),
            "message": message,
        })),
    )
        .into_response()
}

pub fn not_found(path: &str) -> Response {
    error(StatusCode::NOT_FOUND, format!("No route matches {path}"))
}

/// 405 with an `Allow` header listing the verbs the path answers.
pub fn method_not_allowed(allowed: &[Verb]) -> Response {
    let allow = allowed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let mut response = error(StatusCode::METHOD_NOT_ALLOWED, format!("Allowed methods: {allow}"));
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

pub fn bad_request(message: impl Into<String>) -> Response {
    error(StatusCode::BAD_REQUEST, message.into())
}

/// A route matched but nothing is bound to its handler.
pub fn handler_missing(action: &HandlerRef) -> Response {
    error(StatusCode::NOT_IMPLEMENTED, format!("No handler bound to {action}"))
}
