//! Rewriting a gateway request into the request it stands for.

use std::sync::LazyLock;

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{Method, Request, Uri};
use axum::response::Response;
use futures_util::future::BoxFuture;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::{Captures, Regex};
use serde_json::Value;

use crate::gateway::resolver::{GatewayInput, GatewayResolution};

static ROUTE_PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("route parameter pattern is valid"));

/// Characters escaped in a substituted value so it stays one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// The external dispatch boundary: hands a request to the routing table and
/// returns whatever it answers.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, request: Request<Body>) -> BoxFuture<'static, Response>;
}

fn input_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Fill `{param}` placeholders from `input`, percent-encoding each value as
/// a path segment; unknown placeholders stay as written.
pub fn replace_route_parameters(uri: &str, input: &GatewayInput) -> String {
    ROUTE_PARAMETER
        .replace_all(uri, |captures: &Captures<'_>| match input.get(&captures[1]) {
            Some(value) => utf8_percent_encode(&input_text(value), PATH_SEGMENT).to_string(),
            None => captures[0].to_string(),
        })
        .into_owned()
}

/// Build the request to redispatch: resolved path, original or forced-safe
/// method, original headers (cookies included), query and body.
pub fn rewrite_request(
    parts: &Parts,
    body: Bytes,
    resolution: &GatewayResolution,
    input: &GatewayInput,
) -> Request<Body> {
    let mut method = if resolution.preserves_method() {
        parts.method.clone()
    } else {
        Method::GET
    };

    let path = replace_route_parameters(&resolution.path, input);
    let path = format!("/{}", path.trim_start_matches('/'));
    let target = match parts.uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };
    let uri = match target.parse::<Uri>() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::debug!(target = %target, error = %e, "Rewritten uri is invalid; using the sentinel path");
            // The sentinel is only ever probed with a safe verb.
            method = Method::GET;
            Uri::from_static("/__gateway_unresolved__")
        }
    };

    let mut request = Request::new(Body::from(body));
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.version_mut() = parts.version;
    *request.headers_mut() = parts.headers.clone();
    request
}
