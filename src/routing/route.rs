//! Compiled route records and group scopes.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::metadata::attributes::{normalize_verbs, Verb};
use crate::metadata::handler::HandlerRef;
use crate::routing::matcher::CompiledRoute;

/// Joins URI pieces with single slashes, dropping empty pieces.
pub fn join_uri<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = parts
        .into_iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

/// Context pushed around a block of registrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupScope {
    pub domain: Option<String>,
    pub prefix: Option<String>,
    pub wheres: BTreeMap<String, String>,
    pub name_prefix: Option<String>,
    pub middleware: Vec<String>,
    pub without_middleware: Vec<String>,
}

impl GroupScope {
    /// Nest `inner` inside `self`: prefixes and name prefixes concatenate,
    /// the inner domain replaces the outer one, maps merge with inner winning
    /// and middleware lists append.
    pub fn merge(&self, inner: &GroupScope) -> GroupScope {
        let prefix = match (&self.prefix, &inner.prefix) {
            (Some(outer), Some(inner)) => Some(join_uri([outer.as_str(), inner.as_str()])),
            (outer, inner) => inner.clone().or_else(|| outer.clone()),
        };
        let name_prefix = match (&self.name_prefix, &inner.name_prefix) {
            (Some(outer), Some(inner)) => Some(format!("{outer}{inner}")),
            (outer, inner) => inner.clone().or_else(|| outer.clone()),
        };
        let mut wheres = self.wheres.clone();
        wheres.extend(inner.wheres.clone());

        GroupScope {
            domain: inner.domain.clone().or_else(|| self.domain.clone()),
            prefix,
            wheres,
            name_prefix,
            middleware: [self.middleware.as_slice(), inner.middleware.as_slice()].concat(),
            without_middleware: [
                self.without_middleware.as_slice(),
                inner.without_middleware.as_slice(),
            ]
            .concat(),
        }
    }
}

/// A route as submitted to the routing table.
///
/// The `&mut self` setters mirror the handle a route table returns from
/// `add_route`, so registration reads as a chain.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredRoute {
    pub verbs: Vec<Verb>,
    pub domain: Option<String>,
    pub uri: String,
    pub name: Option<String>,
    pub action: HandlerRef,
    /// Group, class and method middleware, in that order.
    pub middleware: Vec<String>,
    /// Registrar-wide middleware, always applied after everything else.
    pub ambient_middleware: Vec<String>,
    pub without_middleware: Vec<String>,
    pub wheres: BTreeMap<String, String>,
    pub defaults: BTreeMap<String, String>,
    pub scope_bindings: Option<bool>,
    pub with_trashed: bool,
    #[serde(skip)]
    name_prefix: String,
    #[serde(skip)]
    compiled: OnceLock<Option<CompiledRoute>>,
}

impl RegisteredRoute {
    pub fn new(verbs: &[Verb], uri: &str, action: HandlerRef) -> Self {
        Self {
            verbs: normalize_verbs(verbs),
            domain: None,
            uri: join_uri([uri]),
            name: None,
            action,
            middleware: Vec::new(),
            ambient_middleware: Vec::new(),
            without_middleware: Vec::new(),
            wheres: BTreeMap::new(),
            defaults: BTreeMap::new(),
            scope_bindings: None,
            with_trashed: false,
            name_prefix: String::new(),
            compiled: OnceLock::new(),
        }
    }

    /// Build a route inside `scope`.
    pub fn scoped(scope: &GroupScope, verbs: &[Verb], uri: &str, action: HandlerRef) -> Self {
        let mut route = Self::new(
            verbs,
            &join_uri([scope.prefix.as_deref().unwrap_or(""), uri]),
            action,
        );
        route.domain = scope.domain.clone();
        route.wheres = scope.wheres.clone();
        route.middleware = scope.middleware.clone();
        route.without_middleware = scope.without_middleware.clone();
        route.name_prefix = scope.name_prefix.clone().unwrap_or_default();
        route
    }

    /// Set the route name; the enclosing group's name prefix is prepended.
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = Some(format!("{}{}", self.name_prefix, name));
        self
    }

    pub fn middleware<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn ambient_middleware<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ambient_middleware
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn without_middleware<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.without_middleware
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn set_wheres(&mut self, wheres: BTreeMap<String, String>) -> &mut Self {
        self.wheres.extend(wheres);
        self.compiled = OnceLock::new();
        self
    }

    pub fn set_defaults(&mut self, defaults: BTreeMap<String, String>) -> &mut Self {
        self.defaults.extend(defaults);
        self
    }

    pub fn scope_bindings(&mut self) -> &mut Self {
        self.scope_bindings = Some(true);
        self
    }

    pub fn without_scoped_bindings(&mut self) -> &mut Self {
        self.scope_bindings = Some(false);
        self
    }

    pub fn with_trashed(&mut self, with_trashed: bool) -> &mut Self {
        self.with_trashed = with_trashed;
        self
    }

    /// URI template without a leading slash (`/` for the root).
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Request path of the template, with a leading slash.
    pub fn path(&self) -> String {
        if self.uri == "/" {
            "/".to_string()
        } else {
            format!("/{}", self.uri)
        }
    }

    pub fn answers(&self, verb: Verb) -> bool {
        self.verbs.contains(&verb)
    }

    /// Middleware that actually runs: excluded names are removed from the
    /// declared tiers, then ambient middleware is appended untouched.
    pub fn gathered_middleware(&self) -> Vec<String> {
        self.middleware
            .iter()
            .filter(|name| !self.without_middleware.contains(name))
            .chain(self.ambient_middleware.iter())
            .cloned()
            .collect()
    }

    /// Whether two routes occupy the same slot in a table.
    pub fn same_slot(&self, other: &RegisteredRoute) -> bool {
        self.uri == other.uri && self.domain == other.domain && {
            let mut a = self.verbs.clone();
            let mut b = other.verbs.clone();
            a.sort();
            b.sort();
            a == b
        }
    }

    pub(crate) fn compiled(&self) -> Option<&CompiledRoute> {
        self.compiled
            .get_or_init(|| match CompiledRoute::compile(self) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    tracing::warn!(uri = %self.uri, error = %e, "Route constraints do not compile; route disabled");
                    None
                }
            })
            .as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action() -> HandlerRef {
        HandlerRef::new("App\\PhotoController", "index")
    }

    #[test]
    fn test_join_uri() {
        assert_eq!(join_uri(["/api/", "/photos"]), "api/photos");
        assert_eq!(join_uri(["", ""]), "/");
        assert_eq!(join_uri(["a//b", "c/"]), "a/b/c");
    }

    #[test]
    fn test_scope_merge_composes() {
        let outer = GroupScope {
            prefix: Some("api".into()),
            name_prefix: Some("api.".into()),
            domain: Some("example.com".into()),
            middleware: vec!["web".into()],
            ..GroupScope::default()
        };
        let inner = GroupScope {
            prefix: Some("v1".into()),
            name_prefix: Some("v1.".into()),
            middleware: vec!["auth".into()],
            ..GroupScope::default()
        };
        let merged = outer.merge(&inner);
        assert_eq!(merged.prefix.as_deref(), Some("api/v1"));
        assert_eq!(merged.name_prefix.as_deref(), Some("api.v1."));
        assert_eq!(merged.domain.as_deref(), Some("example.com"));
        assert_eq!(merged.middleware, vec!["web", "auth"]);
    }

    #[test]
    fn test_scoped_route_takes_prefixes() {
        let scope = GroupScope {
            prefix: Some("admin".into()),
            name_prefix: Some("admin.".into()),
            ..GroupScope::default()
        };
        let mut route = RegisteredRoute::scoped(&scope, &[Verb::Get], "/photos", action());
        route.name("photos.index");
        assert_eq!(route.uri(), "admin/photos");
        assert_eq!(route.path(), "/admin/photos");
        assert_eq!(route.name.as_deref(), Some("admin.photos.index"));
        assert_eq!(route.verbs, vec![Verb::Get, Verb::Head]);
    }

    #[test]
    fn test_ambient_middleware_survives_exclusion() {
        let mut route = RegisteredRoute::new(&[Verb::Get], "/", action());
        route
            .middleware(["web", "auth"])
            .ambient_middleware(["auth", "bindings"])
            .without_middleware(["auth"]);
        assert_eq!(route.gathered_middleware(), vec!["web", "auth", "bindings"]);
    }
}
