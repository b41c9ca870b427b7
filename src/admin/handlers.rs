use axum::{extract::State, Json};
use serde::Serialize;

use crate::gateway::alias::AliasTable;
use crate::http::server::AppState;
use crate::metadata::attributes::Verb;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub routes: usize,
    pub synthesized_routes: usize,
    pub bound_handlers: usize,
}

#[derive(Serialize)]
pub struct RouteSummary {
    pub verbs: Vec<Verb>,
    pub domain: Option<String>,
    pub uri: String,
    pub name: Option<String>,
    pub action: String,
    pub middleware: Vec<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    // Release the table lock before touching the resolver.
    let routes = state.table.read().len();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started.elapsed().as_secs(),
        routes,
        synthesized_routes: state.resolver.synthesized_count(),
        bound_handlers: state.handlers.len(),
    })
}

pub async fn get_routes(State(state): State<AppState>) -> Json<Vec<RouteSummary>> {
    let table = state.table.read();
    let routes = table
        .routes()
        .iter()
        .map(|route| RouteSummary {
            verbs: route.verbs.clone(),
            domain: route.domain.clone(),
            uri: route.uri().to_string(),
            name: route.name.clone(),
            action: route.action.to_string(),
            middleware: route.gathered_middleware(),
        })
        .collect();
    Json(routes)
}

/// The alias table currently in effect (reflects hot reloads).
pub async fn get_aliases(State(state): State<AppState>) -> Json<AliasTable> {
    Json(state.resolver.aliases().as_ref().clone())
}
