//! Route table: storage, group scoping, named lookup and request matching.
//!
//! # Responsibilities
//! - Store registered routes in registration order
//! - Apply the active group scope to every new route
//! - Answer named-route lookups
//! - Match a request to a route, or report method-not-allowed / not-found
//!
//! # Design Decisions
//! - Registering into an occupied (verbs, domain, uri) slot replaces the
//!   earlier route, so re-running a registration pass is harmless
//! - Later registrations win name lookups
//! - First matching route wins request matching (registration order)

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use axum::http::Method;

use crate::metadata::attributes::Verb;
use crate::metadata::handler::HandlerRef;
use crate::routing::route::{GroupScope, RegisteredRoute};

/// The routing-table contract the compiler and gateway register against.
pub trait RoutingTable {
    /// Register a route inside the current group scope and return it for
    /// further configuration.
    fn add_route(&mut self, verbs: &[Verb], uri: &str, action: HandlerRef) -> &mut RegisteredRoute;

    fn push_group(&mut self, scope: GroupScope);

    fn pop_group(&mut self);

    fn has_named_route(&self, name: &str) -> bool;

    /// URI template of the named route.
    fn uri_by_name(&self, name: &str) -> Option<String>;

    /// Registered routes, in registration order.
    fn routes(&self) -> &[RegisteredRoute];

    /// Run `body` with `scope` pushed on top of the current scope.
    fn group<F>(&mut self, scope: GroupScope, body: F)
    where
        Self: Sized,
        F: FnOnce(&mut Self),
    {
        self.push_group(scope);
        body(self);
        self.pop_group();
    }
}

/// Result of matching a request against the table.
#[derive(Debug, Clone)]
pub enum RouteMatch {
    Found(MatchedRoute),
    /// The path exists but not for this verb; carries the allowed verbs.
    MethodNotAllowed(Vec<Verb>),
    NotFound,
}

/// A matched route plus its resolved parameters (defaults included).
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    pub route: RegisteredRoute,
    pub params: BTreeMap<String, String>,
}

/// In-memory routing table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RegisteredRoute>,
    scopes: Vec<GroupScope>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> &[RegisteredRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn route_by_name(&self, name: &str) -> Option<&RegisteredRoute> {
        self.routes
            .iter()
            .rev()
            .find(|route| route.name.as_deref() == Some(name))
    }

    /// Scope currently applied to new routes.
    pub fn current_scope(&self) -> GroupScope {
        self.scopes.last().cloned().unwrap_or_default()
    }

    pub fn match_route(&self, method: &Method, host: Option<&str>, path: &str) -> RouteMatch {
        let verb = Verb::from_method(method);
        let mut allowed: Vec<Verb> = Vec::new();

        for route in &self.routes {
            let Some(compiled) = route.compiled() else {
                continue;
            };
            let Some(mut params) = compiled.match_parts(host, path) else {
                continue;
            };
            if verb.is_some_and(|verb| route.answers(verb)) {
                for (key, value) in &route.defaults {
                    params.entry(key.clone()).or_insert_with(|| value.clone());
                }
                return RouteMatch::Found(MatchedRoute {
                    route: route.clone(),
                    params,
                });
            }
            for verb in &route.verbs {
                if !allowed.contains(verb) {
                    allowed.push(*verb);
                }
            }
        }

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed(allowed)
        }
    }
}

impl RoutingTable for RouteTable {
    fn add_route(&mut self, verbs: &[Verb], uri: &str, action: HandlerRef) -> &mut RegisteredRoute {
        let route = RegisteredRoute::scoped(&self.current_scope(), verbs, uri, action);

        let index = match self.routes.iter().position(|existing| existing.same_slot(&route)) {
            Some(index) => {
                tracing::debug!(uri = %route.uri, "Replacing route registered for the same verbs and path");
                self.routes[index] = route;
                index
            }
            None => {
                self.routes.push(route);
                self.routes.len() - 1
            }
        };
        &mut self.routes[index]
    }

    fn push_group(&mut self, scope: GroupScope) {
        let merged = self.current_scope().merge(&scope);
        self.scopes.push(merged);
    }

    fn pop_group(&mut self) {
        self.scopes.pop();
    }

    fn has_named_route(&self, name: &str) -> bool {
        self.route_by_name(name).is_some()
    }

    fn uri_by_name(&self, name: &str) -> Option<String> {
        self.route_by_name(name).map(|route| route.uri().to_string())
    }

    fn routes(&self) -> &[RegisteredRoute] {
        &self.routes
    }
}

/// Route table shared between request handlers and the gateway.
#[derive(Debug, Clone, Default)]
pub struct SharedRouteTable {
    inner: Arc<RwLock<RouteTable>>,
}

impl SharedRouteTable {
    pub fn new(table: RouteTable) -> Self {
        Self {
            inner: Arc::new(RwLock::new(table)),
        }
    }

    // A poisoned lock only means a panic happened mid-registration; the
    // table itself is still structurally valid.
    pub fn read(&self) -> RwLockReadGuard<'_, RouteTable> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, RouteTable> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(method: &str) -> HandlerRef {
        HandlerRef::new("App\\PhotoController", method)
    }

    #[test]
    fn test_group_scope_applies_and_pops() {
        let mut table = RouteTable::new();
        table.group(
            GroupScope {
                prefix: Some("admin".into()),
                name_prefix: Some("admin.".into()),
                ..GroupScope::default()
            },
            |table| {
                table
                    .add_route(&[Verb::Get], "photos", action("index"))
                    .name("photos");
            },
        );
        table.add_route(&[Verb::Get], "public", action("public"));

        assert_eq!(table.uri_by_name("admin.photos").as_deref(), Some("admin/photos"));
        assert_eq!(table.routes()[1].uri(), "public");
        assert!(table.current_scope().prefix.is_none());
    }

    #[test]
    fn test_same_slot_replaces() {
        let mut table = RouteTable::new();
        table.add_route(&[Verb::Post], "ping", action("a"));
        table.add_route(&[Verb::Post], "/ping/", action("b"));
        table.add_route(&[Verb::Get], "ping", action("c"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.routes()[0].action, action("b"));
    }

    #[test]
    fn test_match_outcomes() {
        let mut table = RouteTable::new();
        table
            .add_route(&[Verb::Get], "photos/{photo}/{format?}", action("show"))
            .set_defaults(BTreeMap::from([("format".to_string(), "json".to_string())]));

        match table.match_route(&Method::GET, None, "/photos/3") {
            RouteMatch::Found(found) => {
                assert_eq!(found.params["photo"], "3");
                assert_eq!(found.params["format"], "json");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            table.match_route(&Method::DELETE, None, "/photos/3"),
            RouteMatch::MethodNotAllowed(allowed) if allowed == vec![Verb::Get, Verb::Head]
        ));
        assert!(matches!(
            table.match_route(&Method::GET, None, "/videos"),
            RouteMatch::NotFound
        ));
    }
}
