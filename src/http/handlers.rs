//! Binding handler references to async functions.
//!
//! The route table only knows `Class@method` references; the registry maps
//! them to code. Anything unbound falls through to the fallback handler, if
//! one is installed.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::future::BoxFuture;
use serde_json::json;

use crate::metadata::handler::HandlerRef;
use crate::routing::route::RegisteredRoute;

/// What a handler receives: the matched route, its parameters, the request.
pub struct HandlerContext {
    pub route: RegisteredRoute,
    pub params: BTreeMap<String, String>,
    pub request: Request<Body>,
}

pub type Handler = Arc<dyn Fn(HandlerContext) -> BoxFuture<'static, Response> + Send + Sync>;

#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerRef, Handler>,
    fallback: Option<Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose fallback describes the matched route as JSON.
    pub fn with_echo_fallback() -> Self {
        Self::new().fallback(echo)
    }

    pub fn bind<F, Fut>(mut self, action: HandlerRef, handler: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.handlers.insert(action, boxed(handler));
        self
    }

    pub fn fallback<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.fallback = Some(boxed(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The bound handler, else the fallback.
    pub fn handler(&self, action: &HandlerRef) -> Option<Handler> {
        self.handlers.get(action).or(self.fallback.as_ref()).cloned()
    }
}

fn boxed<F, Fut>(handler: F) -> Handler
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |ctx| -> BoxFuture<'static, Response> { Box::pin(handler(ctx)) })
}

/// Describes the route that matched instead of running application code.
pub async fn echo(ctx: HandlerContext) -> Response {
    Json(json!({
        "action": ctx.route.action.to_string(),
        "name": ctx.route.name,
        "uri": ctx.route.uri(),
        "method": ctx.request.method().as_str(),
        "params": ctx.params,
        "middleware": ctx.route.gathered_middleware(),
        "scope_bindings": ctx.route.scope_bindings,
        "with_trashed": ctx.route.with_trashed,
    }))
    .into_response()
}
