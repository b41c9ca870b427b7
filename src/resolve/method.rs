//! Method-level declaration merge.
//!
//! Method declarations override class declarations without touching the
//! class's [`ClassMetadata`]; every merge copies.

use std::collections::BTreeMap;

use heck::ToKebabCase;
use serde::Serialize;

use crate::metadata::attributes::{Attribute, AttributeKind, Route, Verb};
use crate::metadata::handler::{HandlerClass, HandlerMethod, HandlerRef};
use crate::metadata::reader;
use crate::resolve::class::{
    collect_defaults, collect_middleware, collect_wheres, declared_scope_bindings,
    declared_with_trashed, ClassMetadata,
};
use crate::routing::route::RegisteredRoute;
use crate::routing::router::RoutingTable;

/// One compiled route declaration, before group scoping is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveRouteDescriptor {
    pub verbs: Vec<Verb>,
    pub uri: String,
    pub name: String,
    pub action: HandlerRef,
    /// Class then method middleware.
    pub middleware: Vec<String>,
    /// Registrar-wide middleware, appended last and never subtracted.
    pub ambient_middleware: Vec<String>,
    pub without_middleware: Vec<String>,
    pub wheres: BTreeMap<String, String>,
    pub defaults: BTreeMap<String, String>,
    pub scope_bindings: Option<bool>,
    pub with_trashed: bool,
}

impl EffectiveRouteDescriptor {
    /// Submit the descriptor to `table` inside its current group scope.
    pub fn register<'t, T: RoutingTable>(&self, table: &'t mut T) -> &'t mut RegisteredRoute {
        let route = table.add_route(&self.verbs, &self.uri, self.action.clone());
        route
            .name(&self.name)
            .middleware(self.middleware.iter().cloned())
            .ambient_middleware(self.ambient_middleware.iter().cloned())
            .without_middleware(self.without_middleware.iter().cloned())
            .set_wheres(self.wheres.clone())
            .set_defaults(self.defaults.clone())
            .with_trashed(self.with_trashed);
        match self.scope_bindings {
            Some(true) => route.scope_bindings(),
            Some(false) => route.without_scoped_bindings(),
            None => route,
        }
    }
}

/// Reads one method's declarations on top of its class's resolved metadata.
pub struct MethodAttributes<'a> {
    class: &'a HandlerClass,
    metadata: &'a ClassMetadata,
    method: &'a HandlerMethod,
}

impl<'a> MethodAttributes<'a> {
    pub fn new(class: &'a HandlerClass, metadata: &'a ClassMetadata, method: &'a HandlerMethod) -> Self {
        Self {
            class,
            metadata,
            method,
        }
    }

    pub fn method(&self) -> &'a HandlerMethod {
        self.method
    }

    /// `Class@method`, or the class itself for the invokable method.
    pub fn route_action(&self) -> HandlerRef {
        HandlerRef::new(&self.class.name, &self.method.name)
    }

    /// Conventional uri/name when a route declaration gives none.
    pub fn route_name(&self) -> String {
        self.method.name.to_kebab_case()
    }

    pub fn set_scope_bindings_if_available<'r>(
        &self,
        route: &'r mut RegisteredRoute,
    ) -> &'r mut RegisteredRoute {
        match declared_scope_bindings(self.method).or(self.metadata.scope_bindings) {
            Some(true) => route.scope_bindings(),
            Some(false) => route.without_scoped_bindings(),
            None => route,
        }
    }

    pub fn set_with_trashed_if_available<'r>(
        &self,
        route: &'r mut RegisteredRoute,
    ) -> &'r mut RegisteredRoute {
        route.with_trashed(declared_with_trashed(self.method).unwrap_or(self.metadata.with_trashed))
    }

    pub fn set_wheres_if_available<'r>(&self, route: &'r mut RegisteredRoute) -> &'r mut RegisteredRoute {
        let mut wheres = self.metadata.wheres.clone();
        wheres.extend(collect_wheres(self.method));
        route.set_wheres(wheres)
    }

    pub fn set_defaults_if_available<'r>(&self, route: &'r mut RegisteredRoute) -> &'r mut RegisteredRoute {
        let mut defaults = self.metadata.defaults.clone();
        defaults.extend(collect_defaults(self.method));
        route.set_defaults(defaults)
    }

    /// Class middleware, then method middleware (including `extra` from the
    /// route declaration itself), then `ambient`.
    pub fn add_middleware_to_route<'r>(
        &self,
        route: &'r mut RegisteredRoute,
        extra: &[String],
        ambient: &[String],
    ) -> &'r mut RegisteredRoute {
        route
            .middleware(
                self.metadata
                    .middleware
                    .iter()
                    .cloned()
                    .chain(collect_middleware(self.method, AttributeKind::Middleware))
                    .chain(extra.iter().cloned()),
            )
            .ambient_middleware(ambient.iter().cloned())
    }

    pub fn add_without_middleware_to_route<'r>(
        &self,
        route: &'r mut RegisteredRoute,
        extra: &[String],
    ) -> &'r mut RegisteredRoute {
        route.without_middleware(
            self.metadata
                .without_middleware
                .iter()
                .cloned()
                .chain(collect_middleware(self.method, AttributeKind::WithoutMiddleware))
                .chain(extra.iter().cloned()),
        )
    }

    /// Route declarations on the method, in declaration order.
    pub fn route_declarations(&self) -> Vec<&'a Route> {
        reader::declarations(self.method, &[AttributeKind::Route])
            .into_iter()
            .filter_map(|attribute| match attribute {
                Attribute::Route(route) => Some(route),
                _ => None,
            })
            .collect()
    }

    /// Every route declaration merged with class metadata. `ambient` is the
    /// registrar middleware, `excluded` the registrar's removal list.
    pub fn descriptors(&self, ambient: &[String], excluded: &[String]) -> Vec<EffectiveRouteDescriptor> {
        let convention = self.route_name();
        self.route_declarations()
            .into_iter()
            .map(|declaration| {
                let mut route =
                    RegisteredRoute::new(&declaration.methods(), &declaration.uri_or(&convention), self.route_action());
                self.set_scope_bindings_if_available(&mut route);
                self.set_with_trashed_if_available(&mut route);
                self.set_wheres_if_available(&mut route);
                self.set_defaults_if_available(&mut route);
                self.add_middleware_to_route(&mut route, &declaration.middleware, ambient);
                let without: Vec<String> = declaration
                    .without_middleware
                    .iter()
                    .chain(excluded)
                    .cloned()
                    .collect();
                self.add_without_middleware_to_route(&mut route, &without);

                EffectiveRouteDescriptor {
                    verbs: route.verbs,
                    // Keep the declared uri untouched; the table joins it with the group prefix.
                    uri: declaration.uri_or(&convention),
                    name: declaration.name_or(&convention),
                    action: route.action,
                    middleware: route.middleware,
                    ambient_middleware: route.ambient_middleware,
                    without_middleware: route.without_middleware,
                    wheres: route.wheres,
                    defaults: route.defaults,
                    scope_bindings: route.scope_bindings,
                    with_trashed: route.with_trashed,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::metadata::attributes::{
        Defaults, Middleware, ScopeBindings, Where, WithTrashed, WithoutMiddleware,
    };
    use crate::resolve::class::RouteAttributes;
    use crate::routing::router::RouteTable;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn controller(class_middleware: &[&str]) -> HandlerClass {
        let mut class = HandlerClass::new("App\\Http\\Controllers\\PhotoController");
        if !class_middleware.is_empty() {
            class = class.with(Middleware { middleware: names(class_middleware) });
        }
        class
    }

    fn resolve(class: &HandlerClass) -> ClassMetadata {
        RouteAttributes::new(class, &RoutingConfig::default()).resolve()
    }

    #[test]
    fn test_route_action_and_name() {
        let class = controller(&[]);
        let metadata = resolve(&class);
        let method = HandlerMethod::public("showArchived");
        let attrs = MethodAttributes::new(&class, &metadata, &method);
        assert_eq!(attrs.route_name(), "show-archived");
        assert_eq!(attrs.route_action().to_string(), "App\\Http\\Controllers\\PhotoController@showArchived");

        let invoke = HandlerMethod::public("invoke");
        let attrs = MethodAttributes::new(&class, &metadata, &invoke);
        assert_eq!(attrs.route_action().method, None);
    }

    #[test]
    fn test_middleware_precedence_class_method_ambient() {
        let cases: [(&[&str], &[&str], &[&str]); 4] = [
            (&[], &[], &[]),
            (&["c1"], &[], &["a1"]),
            (&[], &["m1", "m2"], &[]),
            (&["c1", "c2"], &["m1"], &["a1", "a2"]),
        ];
        for (class_mw, method_mw, ambient) in cases {
            let class = controller(class_mw);
            let metadata = resolve(&class);
            let mut method = HandlerMethod::public("index");
            if !method_mw.is_empty() {
                method = method.with(Middleware { middleware: names(method_mw) });
            }
            let attrs = MethodAttributes::new(&class, &metadata, &method);

            let mut route = RegisteredRoute::new(&[Verb::Get], "photos", attrs.route_action());
            attrs.add_middleware_to_route(&mut route, &[], &names(ambient));

            let expected: Vec<String> = class_mw
                .iter()
                .chain(method_mw)
                .chain(ambient)
                .map(|s| s.to_string())
                .collect();
            assert_eq!(route.gathered_middleware(), expected);
        }
    }

    #[test]
    fn test_without_middleware_cannot_remove_ambient() {
        let class = controller(&["auth"]);
        let metadata = resolve(&class);
        let method = HandlerMethod::public("index")
            .with(WithoutMiddleware { middleware: names(&["auth"]) })
            .with(Route::get("photos"));
        let attrs = MethodAttributes::new(&class, &metadata, &method);

        let descriptor = attrs.descriptors(&names(&["auth"]), &[]).remove(0);
        assert_eq!(descriptor.middleware, names(&["auth"]));
        assert_eq!(descriptor.without_middleware, names(&["auth"]));

        let mut table = RouteTable::new();
        let route = descriptor.register(&mut table);
        assert_eq!(route.gathered_middleware(), names(&["auth"]));
    }

    #[test]
    fn test_method_wheres_and_defaults_override_class() {
        let class = controller(&[])
            .with(Where::number("id"))
            .with(Where::alpha("slug"))
            .with(Defaults { key: "format".into(), value: "html".into() });
        let metadata = resolve(&class);
        let method = HandlerMethod::public("show")
            .with(Where::uuid("id"))
            .with(Defaults { key: "format".into(), value: "json".into() })
            .with(Defaults { key: "page".into(), value: "1".into() });
        let attrs = MethodAttributes::new(&class, &metadata, &method);

        let mut route = RegisteredRoute::new(&[Verb::Get], "p/{id}", attrs.route_action());
        attrs.set_wheres_if_available(&mut route);
        attrs.set_defaults_if_available(&mut route);

        assert_eq!(route.wheres["id"], Where::uuid("id").constraint);
        assert_eq!(route.wheres["slug"], "[a-zA-Z]+");
        assert_eq!(route.defaults["format"], "json");
        assert_eq!(route.defaults["page"], "1");
        // Class metadata is untouched.
        assert_eq!(metadata.wheres["id"], "[0-9]+");
    }

    #[test]
    fn test_flags_method_over_class_over_config() {
        let mut config = RoutingConfig::default();
        config.routing.scope_bindings = Some(true);
        let class = controller(&[]).with(WithTrashed { enabled: true });
        let metadata = RouteAttributes::new(&class, &config).resolve();

        let plain = HandlerMethod::public("index");
        let attrs = MethodAttributes::new(&class, &metadata, &plain);
        let mut route = RegisteredRoute::new(&[Verb::Get], "/", attrs.route_action());
        attrs.set_scope_bindings_if_available(&mut route);
        attrs.set_with_trashed_if_available(&mut route);
        assert_eq!(route.scope_bindings, Some(true));
        assert!(route.with_trashed);

        let explicit = HandlerMethod::public("index")
            .with(ScopeBindings { enabled: false })
            .with(WithTrashed { enabled: false });
        let attrs = MethodAttributes::new(&class, &metadata, &explicit);
        let mut route = RegisteredRoute::new(&[Verb::Get], "/", attrs.route_action());
        attrs.set_scope_bindings_if_available(&mut route);
        attrs.set_with_trashed_if_available(&mut route);
        assert_eq!(route.scope_bindings, Some(false));
        assert!(!route.with_trashed);
    }

    #[test]
    fn test_each_route_declaration_compiles_separately() {
        let class = controller(&[]);
        let metadata = resolve(&class);
        let method = HandlerMethod::public("listPhotos")
            .with(Route::get("photos").named("photos.list"))
            .with(Route::post("photos/search").with_middleware(["throttle"]))
            .with(Route::new(vec![Verb::Put], None));
        let attrs = MethodAttributes::new(&class, &metadata, &method);

        let descriptors = attrs.descriptors(&[], &names(&["csrf"]));
        assert_eq!(descriptors.len(), 3);
        assert_eq!(descriptors[0].name, "photos.list");
        assert_eq!(descriptors[0].verbs, vec![Verb::Get, Verb::Head]);
        assert_eq!(descriptors[1].name, "list-photos");
        assert_eq!(descriptors[1].middleware, names(&["throttle"]));
        assert_eq!(descriptors[1].without_middleware, names(&["csrf"]));
        assert_eq!(descriptors[2].uri, "list-photos");
    }
}
