//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum Router: admin routes plus a catch-all dispatcher
//! - Wire up middleware (request id, tracing, timeout)
//! - Match every request against the route table
//! - Resolve gateway requests and redispatch the rewritten request
//! - Record dispatch metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::schema::RoutingConfig;
use crate::config::ConfigError;
use crate::gateway::dispatch::{rewrite_request, Dispatch};
use crate::gateway::resolver::{GatewayResolver, GATEWAY_ROUTE_NAME};
use crate::http::handlers::{HandlerContext, HandlerRegistry};
use crate::http::request::{gateway_input, request_host, GATEWAY_BODY_LIMIT};
use crate::http::response;
use crate::lifecycle::startup::Application;
use crate::metadata::catalog::CatalogError;
use crate::observability::metrics;
use crate::observability::tracing::RequestSpan;
use crate::routing::router::{MatchedRoute, RouteMatch, SharedRouteTable};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("handler catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RoutingConfig>,
    pub table: SharedRouteTable,
    pub resolver: Arc<GatewayResolver>,
    pub handlers: Arc<HandlerRegistry>,
    pub started: Instant,
}

impl AppState {
    pub fn new(app: &Application, handlers: HandlerRegistry) -> Self {
        Self {
            config: app.config.clone(),
            table: app.table.clone(),
            resolver: app.resolver.clone(),
            handlers: Arc::new(handlers),
            started: Instant::now(),
        }
    }
}

impl Dispatch for AppState {
    fn dispatch(&self, request: Request<Body>) -> BoxFuture<'static, Response> {
        let state = self.clone();
        Box::pin(async move { route_request(state, request).await })
    }
}

/// HTTP server for the compiled route table.
pub struct HttpServer {
    router: Router,
    config: Arc<RoutingConfig>,
}

impl HttpServer {
    pub fn new(app: &Application, handlers: HandlerRegistry) -> Self {
        let state = AppState::new(app, handlers);
        let router = Self::build_router(&app.config, state);
        Self {
            router,
            config: app.config.clone(),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RoutingConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state.clone());

        if config.admin.enabled {
            router = router.merge(setup_admin_router(state));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            gateway = %self.config.gateway.endpoint,
            admin = self.config.admin.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    route_request(state, request).await
}

/// Match, then run the gateway or the bound handler.
async fn route_request(state: AppState, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let host = request_host(request.headers(), request.uri());

    let matched = state.table.read().match_route(&method, host.as_deref(), &path);

    let response = match matched {
        RouteMatch::Found(matched) if matched.route.name.as_deref() == Some(GATEWAY_ROUTE_NAME) => {
            gateway(&state, request).await
        }
        RouteMatch::Found(matched) => invoke(&state, matched, request).await,
        RouteMatch::MethodNotAllowed(allowed) => response::method_not_allowed(&allowed),
        RouteMatch::NotFound => {
            tracing::debug!(method = %method, path = %path, "No route matched");
            response::not_found(&path)
        }
    };

    metrics::record_dispatch(method.as_str(), response.status().as_u16(), start);
    response
}

async fn invoke(state: &AppState, matched: MatchedRoute, request: Request<Body>) -> Response {
    let Some(handler) = state.handlers.handler(&matched.route.action) else {
        tracing::warn!(action = %matched.route.action, "Route matched but no handler is bound");
        return response::handler_missing(&matched.route.action);
    };

    handler(HandlerContext {
        route: matched.route,
        params: matched.params,
        request,
    })
    .await
}

/// Resolve the logical action and hand the rewritten request back to the
/// table.
async fn gateway(state: &AppState, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, GATEWAY_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Gateway body could not be read");
            return response::bad_request("Gateway request body could not be read");
        }
    };

    let input = gateway_input(&parts, &body);
    let resolution = state.resolver.resolve_input(&input);
    let rewritten = rewrite_request(&parts, body, &resolution, &input);

    tracing::debug!(
        outcome = resolution.outcome.as_str(),
        method = %rewritten.method(),
        uri = %rewritten.uri(),
        "Redispatching gateway request"
    );
    state.dispatch(rewritten).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::startup::bootstrap;
    use crate::metadata::attributes::Route;
    use crate::metadata::catalog::HandlerCatalog;
    use crate::metadata::handler::{HandlerClass, HandlerMethod, HandlerRef};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use tower::ServiceExt;

    fn catalog() -> HandlerCatalog {
        let mut catalog = HandlerCatalog::new();
        catalog.register(
            HandlerClass::new("App\\Http\\Controllers\\Utils\\PingController")
                .method(HandlerMethod::public("ping"))
                .method(HandlerMethod::public("pong").with(Route::post("utils/pong").named("utils.ping.pong"))),
        );
        catalog
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn server() -> HttpServer {
        let app = bootstrap(RoutingConfig::default(), catalog());
        let handlers = HandlerRegistry::with_echo_fallback().bind(
            HandlerRef::new("App\\Http\\Controllers\\Utils\\PingController", "ping"),
            |_ctx| async { "pong".into_response() },
        );
        HttpServer::new(&app, handlers)
    }

    #[tokio::test]
    async fn test_gateway_synthesizes_and_redispatches() {
        let router = server().router();
        let response = router
            .oneshot(
                Request::post("/gateway.do")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"action":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"pong");
    }

    #[tokio::test]
    async fn test_gateway_carries_encoded_parameters() {
        use crate::metadata::attributes::Verb;
        use crate::routing::router::RoutingTable;

        let app = bootstrap(RoutingConfig::default(), catalog());
        app.table
            .write()
            .add_route(&[Verb::Get], "albums/{album}", HandlerRef::new("App\\AlbumController", "show"))
            .name("albums.show");
        let router = HttpServer::new(&app, HandlerRegistry::with_echo_fallback()).router();

        let response = router
            .oneshot(
                Request::get("/gateway.do?action=albums.show&album=summer%20trip")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let echo = body_json(response).await;
        assert_eq!(echo["params"]["album"], "summer trip");
        assert_eq!(echo["name"], "albums.show");
    }

    #[tokio::test]
    async fn test_unresolved_action_is_not_found() {
        let router = server().router();
        let response = router
            .oneshot(Request::post("/gateway.do?action=nope.nothing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_path_and_wrong_method() {
        let router = server().router();
        let response = router
            .clone()
            .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Not Found");

        let response = router
            .oneshot(Request::get("/gateway.do").body(Body::empty()).unwrap())
            .await
            .unwrap();
        // The gateway answers every verb; without an action it falls to the sentinel.
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_routes_absent_by_default() {
        let router = server().router();
        let response = router
            .oneshot(Request::get("/admin/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
