//! Request inspection.
//!
//! # Responsibilities
//! - Determine the host a request is addressed to
//! - Collect gateway input from the query string and the body
//!
//! # Design Decisions
//! - Body fields override query fields of the same name
//! - An unreadable body contributes nothing; resolution then works from the
//!   query alone

use axum::body::Bytes;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Uri};
use serde_json::Value;
use url::form_urlencoded;

use crate::gateway::resolver::GatewayInput;

/// Largest gateway body read into memory.
pub const GATEWAY_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Host without port, from the `Host` header or an absolute request uri.
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let raw = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.host())?;
    let host = match raw.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => raw,
    };
    Some(host.to_ascii_lowercase())
}

fn merge_pairs(input: &mut GatewayInput, encoded: &[u8]) {
    for (key, value) in form_urlencoded::parse(encoded) {
        input.insert(key.into_owned(), Value::String(value.into_owned()));
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Gateway input: query parameters, then body fields (JSON object or
/// urlencoded form).
pub fn gateway_input(parts: &Parts, body: &Bytes) -> GatewayInput {
    let mut input = GatewayInput::new();
    if let Some(query) = parts.uri.query() {
        merge_pairs(&mut input, query.as_bytes());
    }

    if body.is_empty() {
        return input;
    }

    if is_form(&parts.headers) {
        merge_pairs(&mut input, body);
        return input;
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => input.extend(fields),
        Ok(_) => tracing::debug!("Gateway body is JSON but not an object; ignored"),
        Err(e) => tracing::debug!(error = %e, "Gateway body is not JSON; ignored"),
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, content_type: Option<&str>) -> Parts {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_json_body_overrides_query() {
        let input = gateway_input(
            &parts("/gateway.do?action=old&version=2.0.0", Some("application/json")),
            &Bytes::from_static(br#"{"action":"utils.ping.ping","id":7}"#),
        );
        assert_eq!(input["action"], "utils.ping.ping");
        assert_eq!(input["version"], "2.0.0");
        assert_eq!(input["id"], 7);
    }

    #[test]
    fn test_form_body() {
        let input = gateway_input(
            &parts("/gateway.do", Some("application/x-www-form-urlencoded")),
            &Bytes::from_static(b"action=photos.show&photo=a%20b"),
        );
        assert_eq!(input["action"], "photos.show");
        assert_eq!(input["photo"], "a b");
    }

    #[test]
    fn test_garbage_body_ignored() {
        let input = gateway_input(&parts("/gateway.do?action=ping", None), &Bytes::from_static(b"not json"));
        assert_eq!(input.len(), 1);
    }

    #[test]
    fn test_request_host_strips_port() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "API.example.com:8080".parse().unwrap());
        assert_eq!(
            request_host(&headers, &Uri::from_static("/")).as_deref(),
            Some("api.example.com")
        );
        assert_eq!(request_host(&HeaderMap::new(), &Uri::from_static("/")), None);
    }
}
