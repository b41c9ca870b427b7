//! Gateway resolution: `(action, version)` → route path.
//!
//! # Responsibilities
//! - Extract action and version from the request input
//! - Apply per-version alias substitution
//! - Prefer an existing named route
//! - Otherwise derive a handler by convention, verify it in the catalog and
//!   register a synthetic route for it, once per resolved name
//!
//! # Design Decisions
//! - Never fails: anything unresolvable maps to [`SENTINEL_PATH`]
//! - Synthesis runs under the table write lock and re-checks the memo there,
//!   so concurrent first use registers exactly one route
//! - Failed resolutions are not memoized; a handler added to the catalog
//!   later is picked up on the next request

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::schema::GatewayConfig;
use crate::gateway::alias::AliasTable;
use crate::gateway::convention::{derive_handler_reference, synthesized_path};
use crate::metadata::attributes::Verb;
use crate::metadata::catalog::HandlerCatalog;
use crate::metadata::handler::HandlerRef;
use crate::observability::metrics;
use crate::routing::router::{RoutingTable, SharedRouteTable};

/// Path dispatched for actions that resolve to nothing.
pub const SENTINEL_PATH: &str = "__gateway_unresolved__";

/// Name the gateway endpoint itself is registered under.
pub const GATEWAY_ROUTE_NAME: &str = "gateway";

/// Handler reference of the gateway endpoint route.
pub fn gateway_handler() -> HandlerRef {
    HandlerRef::invokable(GATEWAY_ROUTE_NAME)
}

/// Request input the gateway reads fields from.
pub type GatewayInput = Map<String, Value>;

/// Reads a field (action or version) out of the request input.
pub type Extractor = Arc<dyn Fn(&GatewayInput) -> Option<String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// A route with the resolved name already existed.
    Named,
    /// A route was synthesized by this call.
    Synthesized,
    /// A route synthesized by an earlier call was reused.
    Memoized,
    Unresolved,
}

impl ResolutionOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionOutcome::Named => "named",
            ResolutionOutcome::Synthesized => "synthesized",
            ResolutionOutcome::Memoized => "memoized",
            ResolutionOutcome::Unresolved => "unresolved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayResolution {
    /// Route uri template, or [`SENTINEL_PATH`].
    pub path: String,
    /// Alias-substituted action name, when an action was given.
    pub name: Option<String>,
    pub outcome: ResolutionOutcome,
}

impl GatewayResolution {
    fn unresolved(name: Option<String>) -> Self {
        Self {
            path: SENTINEL_PATH.to_string(),
            name,
            outcome: ResolutionOutcome::Unresolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome != ResolutionOutcome::Unresolved
    }

    /// Unresolved requests are only probed with a safe verb.
    pub fn preserves_method(&self) -> bool {
        self.is_resolved()
    }
}

/// Reads `field` as a string; numbers and booleans are stringified.
pub fn field_extractor(field: impl Into<String>) -> Extractor {
    let field = field.into();
    Arc::new(move |input: &GatewayInput| match input.get(&field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

pub struct GatewayResolver {
    table: SharedRouteTable,
    catalog: Arc<HandlerCatalog>,
    aliases: ArcSwap<AliasTable>,
    default_version: String,
    namespace: String,
    synthesized_verbs: Vec<Verb>,
    action: Extractor,
    version: Extractor,
    synthesized: DashMap<String, String>,
}

impl GatewayResolver {
    pub fn new(table: SharedRouteTable, catalog: Arc<HandlerCatalog>, config: &GatewayConfig) -> Self {
        Self {
            table,
            catalog,
            aliases: ArcSwap::from_pointee(config.alias.clone()),
            default_version: config.default_version.clone(),
            namespace: config.namespace.clone(),
            synthesized_verbs: config.synthesized_verbs.clone(),
            action: field_extractor(config.action_field.clone()),
            version: field_extractor(config.version_field.clone()),
            synthesized: DashMap::new(),
        }
    }

    pub fn with_action_extractor(mut self, extractor: Extractor) -> Self {
        self.action = extractor;
        self
    }

    pub fn with_version_extractor(mut self, extractor: Extractor) -> Self {
        self.version = extractor;
        self
    }

    pub fn table(&self) -> &SharedRouteTable {
        &self.table
    }

    pub fn aliases(&self) -> Arc<AliasTable> {
        self.aliases.load_full()
    }

    /// Swap in a new alias table; in-flight resolutions keep the old one.
    pub fn reload_aliases(&self, aliases: AliasTable) {
        self.aliases.store(Arc::new(aliases));
    }

    /// Names synthesized so far.
    pub fn synthesized_count(&self) -> usize {
        self.synthesized.len()
    }

    pub fn resolve_input(&self, input: &GatewayInput) -> GatewayResolution {
        let action = (self.action)(input);
        let version = (self.version)(input);
        self.resolve(action.as_deref(), version.as_deref())
    }

    pub fn resolve(&self, action: Option<&str>, version: Option<&str>) -> GatewayResolution {
        let resolution = match action.filter(|a| !a.is_empty()) {
            Some(action) => {
                let name = self
                    .aliases
                    .load()
                    .substitute_or(action, version, &self.default_version);
                self.resolve_name(name)
            }
            None => GatewayResolution::unresolved(None),
        };

        metrics::record_gateway_resolution(resolution.outcome.as_str());
        tracing::debug!(
            action = ?action,
            version = ?version,
            resolved = ?resolution.name,
            path = %resolution.path,
            outcome = resolution.outcome.as_str(),
            "Gateway action resolved"
        );
        resolution
    }

    fn resolve_name(&self, name: String) -> GatewayResolution {
        // The gateway never resolves to itself.
        if name == GATEWAY_ROUTE_NAME {
            return GatewayResolution::unresolved(Some(name));
        }

        if let Some(uri) = self.table.read().uri_by_name(&name) {
            return GatewayResolution {
                path: uri,
                name: Some(name),
                outcome: ResolutionOutcome::Named,
            };
        }

        if let Some(uri) = self.memoized(&name) {
            return GatewayResolution {
                path: uri,
                name: Some(name),
                outcome: ResolutionOutcome::Memoized,
            };
        }

        match self.synthesize(&name) {
            Some((uri, outcome)) => GatewayResolution {
                path: uri,
                name: Some(name),
                outcome,
            },
            None => GatewayResolution::unresolved(Some(name)),
        }
    }

    fn memoized(&self, name: &str) -> Option<String> {
        self.synthesized.get(name).map(|entry| entry.value().clone())
    }

    /// Derive, verify and register a route for `name`.
    ///
    /// Lock order is table, then memo. The memo is only written while the
    /// table write lock is held and no memo guard outlives a statement, so a
    /// reader holding the table lock may still query the memo.
    fn synthesize(&self, name: &str) -> Option<(String, ResolutionOutcome)> {
        let reference = derive_handler_reference(name)?;
        let class_path = reference.class_path(&self.namespace);

        let verified = self
            .catalog
            .class(&class_path)
            .is_some_and(|class| class.public_method(&reference.method).is_some());
        if !verified {
            tracing::debug!(action = %name, class = %class_path, method = %reference.method, "No public handler for gateway action");
            return None;
        }

        let mut table = self.table.write();
        // Another request may have registered the name since the reads above.
        if let Some(uri) = self.memoized(name) {
            return Some((uri, ResolutionOutcome::Memoized));
        }
        if let Some(uri) = table.uri_by_name(name) {
            return Some((uri, ResolutionOutcome::Named));
        }
        let uri = table
            .add_route(
                &self.synthesized_verbs,
                &synthesized_path(name),
                reference.handler_ref(&self.namespace),
            )
            .name(name)
            .uri()
            .to_string();
        self.synthesized.insert(name.to_string(), uri.clone());
        drop(table);

        metrics::record_routes_registered(1);
        tracing::info!(action = %name, uri = %uri, handler = %class_path, "Synthesized gateway route");
        Some((uri, ResolutionOutcome::Synthesized))
    }
}

/// Register the gateway endpoint itself: every verb, named `gateway`.
pub fn register_endpoint<T: RoutingTable>(table: &mut T, config: &GatewayConfig) {
    table
        .add_route(&Verb::ALL, &config.endpoint, gateway_handler())
        .name(GATEWAY_ROUTE_NAME)
        .middleware(config.middleware.iter().cloned());
}
