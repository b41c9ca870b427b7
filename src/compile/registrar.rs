//! Route registrar: handler classes → routing table.
//!
//! # Responsibilities
//! - Map discovered files to class names and look them up in the catalog
//! - Expand resource/singleton shorthands inside the class's domain/prefix
//! - Compile every public method's route declarations inside each of the
//!   class's group contexts
//! - Apply registrar-wide middleware and removals
//!
//! # Design Decisions
//! - Unknown classes are skipped, never fatal
//! - The table owns collision handling; re-running a pass is harmless

use std::path::{Path, PathBuf};

use crate::compile::discovery::{class_name_from_path, display_path, normalize_namespace, scan};
use crate::compile::resource::expand;
use crate::config::schema::{DirectoryConfig, RoutingConfig};
use crate::metadata::attributes::AttributeKind;
use crate::metadata::catalog::HandlerCatalog;
use crate::metadata::handler::{HandlerClass, HandlerRef, Visibility};
use crate::metadata::reader;
use crate::observability::metrics;
use crate::resolve::class::{ClassMetadata, RouteAttributes};
use crate::resolve::method::MethodAttributes;
use crate::routing::route::GroupScope;
use crate::routing::router::RoutingTable;

pub struct RouteRegistrar<'a, T: RoutingTable> {
    table: &'a mut T,
    catalog: &'a HandlerCatalog,
    config: &'a RoutingConfig,
    base_path: String,
    root_namespace: String,
    middleware: Vec<String>,
    without_middleware: Vec<String>,
    registered: usize,
}

impl<'a, T: RoutingTable> RouteRegistrar<'a, T> {
    /// Registrar seeded from the `routing` configuration section.
    pub fn new(table: &'a mut T, catalog: &'a HandlerCatalog, config: &'a RoutingConfig) -> Self {
        let mut registrar = Self {
            table,
            catalog,
            config,
            base_path: String::new(),
            root_namespace: String::new(),
            middleware: config.routing.middleware.clone(),
            without_middleware: config.routing.excluded_middleware.clone(),
            registered: 0,
        };
        registrar
            .use_base_path(&config.routing.base_path)
            .use_root_namespace(&config.routing.root_namespace);
        registrar
    }

    pub fn use_base_path(&mut self, base_path: &str) -> &mut Self {
        self.base_path = base_path.replace('\\', "/");
        self
    }

    pub fn use_root_namespace(&mut self, root_namespace: &str) -> &mut Self {
        self.root_namespace = normalize_namespace(root_namespace);
        self
    }

    /// Replace the ambient middleware appended to every route.
    pub fn use_middleware<I, S>(&mut self, middleware: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware = middleware.into_iter().map(Into::into).collect();
        self
    }

    pub fn use_without_middleware<I, S>(&mut self, middleware: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.without_middleware = middleware.into_iter().map(Into::into).collect();
        self
    }

    pub fn middleware(&self) -> &[String] {
        &self.middleware
    }

    pub fn without_middleware(&self) -> &[String] {
        &self.without_middleware
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn root_namespace(&self) -> &str {
        &self.root_namespace
    }

    /// Routes submitted so far.
    pub fn registered(&self) -> usize {
        self.registered
    }

    /// Run `body` inside a routing group.
    pub fn group<F>(&mut self, scope: GroupScope, body: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        self.table.push_group(scope);
        body(self);
        self.table.pop_group();
        self
    }

    /// Register every configured directory, each inside its own group.
    pub fn directories(&mut self, directories: &[DirectoryConfig]) {
        for directory in directories {
            let namespace = directory
                .namespace
                .clone()
                .unwrap_or_else(|| self.config.routing.root_namespace.clone());
            let base_path = directory.base_path.clone().unwrap_or_else(|| {
                if directory.namespace.is_some() {
                    directory.path.clone()
                } else {
                    self.config.routing.base_path.clone()
                }
            });

            self.use_root_namespace(&namespace).use_base_path(&base_path);
            self.group(directory.group_scope(), |registrar| {
                registrar.register_directory(
                    &[PathBuf::from(&directory.path)],
                    &directory.patterns,
                    &directory.not_patterns,
                );
            });
        }
    }

    pub fn register_directory(&mut self, directories: &[PathBuf], patterns: &[String], not_patterns: &[String]) {
        for file in scan(directories, patterns, not_patterns) {
            self.register_file(&file);
        }
    }

    pub fn register_file(&mut self, path: &Path) {
        let class = class_name_from_path(&display_path(path), &self.base_path, &self.root_namespace);
        self.register_class(&class);
    }

    pub fn register_class(&mut self, name: &str) {
        let Some(class) = self.catalog.class(name) else {
            tracing::debug!(class = %name, "No handler class registered under this name; skipped");
            return;
        };

        // Routes replacing an existing slot are not new registrations.
        let before = self.table.routes().len();
        self.register_routes(&class);
        let count = self.table.routes().len() - before;
        self.registered += count;
        metrics::record_routes_registered(count);
        tracing::debug!(class = %name, routes = count, "Handler class registered");
    }

    fn register_routes(&mut self, class: &HandlerClass) {
        let attributes = RouteAttributes::new(class, self.config);
        let metadata = attributes.resolve();

        if attributes.is_resource_contract() {
            if attributes.resource().is_some() && attributes.is_singleton() {
                tracing::warn!(class = %class.name, "Both resource and singleton declared; using the singleton");
            }
            let scope = GroupScope {
                domain: metadata.domain.clone(),
                prefix: metadata.prefix.clone(),
                ..GroupScope::default()
            };
            self.group(scope, |registrar| registrar.register_resource_routes(class, &metadata));

            if self.config.routing.exclusive_resources {
                if has_route_declarations(class) {
                    tracing::debug!(class = %class.name, "Resource class; per-method routes ignored");
                }
                return;
            }
        }

        for group in &metadata.groups {
            self.group(group.clone(), |registrar| registrar.register_method_routes(class, &metadata));
        }
    }

    fn register_resource_routes(&mut self, class: &HandlerClass, metadata: &ClassMetadata) {
        let Some(descriptor) = &metadata.resource else {
            return;
        };
        for route in expand(descriptor) {
            self.table
                .add_route(&route.verbs, &route.uri, HandlerRef::new(&class.name, route.action))
                .name(&route.name)
                .middleware(self.middleware.iter().chain(&metadata.middleware).cloned())
                .without_middleware(
                    self.without_middleware
                        .iter()
                        .chain(&metadata.without_middleware)
                        .cloned(),
                );
        }
    }

    fn register_method_routes(&mut self, class: &HandlerClass, metadata: &ClassMetadata) {
        let methods = class
            .declared_methods(Visibility::Public)
            .filter(|method| reader::has(*method, &[AttributeKind::Routing]));

        for method in methods {
            let attributes = MethodAttributes::new(class, metadata, method);
            for descriptor in attributes.descriptors(&self.middleware, &self.without_middleware) {
                descriptor.register(&mut *self.table);
            }
        }
    }
}

fn has_route_declarations(class: &HandlerClass) -> bool {
    class
        .declared_methods(Visibility::Public)
        .any(|method| reader::has(method, &[AttributeKind::Route]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::attributes::{
        Domain, Group, Middleware, Prefix, Resource, Route, Singleton, Verb, Where,
        WithoutMiddleware,
    };
    use crate::metadata::handler::HandlerMethod;
    use crate::routing::router::RouteTable;

    fn photo_controller() -> HandlerClass {
        HandlerClass::new("App\\Http\\Controllers\\PhotoController")
            .with(Resource::new("photos").only(["index", "show"]))
            .method(HandlerMethod::public("index").with(Route::get("extra")))
            .method(HandlerMethod::public("archive").with(Route::post("photos/archive")))
    }

    fn compile(classes: Vec<HandlerClass>, config: &RoutingConfig) -> RouteTable {
        let mut catalog = HandlerCatalog::new();
        let names: Vec<String> = classes.iter().map(|c| c.name.clone()).collect();
        for class in classes {
            catalog.register(class);
        }
        let mut table = RouteTable::new();
        let mut registrar = RouteRegistrar::new(&mut table, &catalog, config);
        for name in names {
            registrar.register_class(&name);
        }
        table
    }

    #[test]
    fn test_resource_only_ignores_method_routes() {
        let table = compile(vec![photo_controller()], &RoutingConfig::default());
        let routes: Vec<(String, Option<String>)> = table
            .routes()
            .iter()
            .map(|r| (r.uri().to_string(), r.name.clone()))
            .collect();
        assert_eq!(
            routes,
            vec![
                ("photos".to_string(), Some("photos.index".to_string())),
                ("photos/{photo}".to_string(), Some("photos.show".to_string())),
            ]
        );
        assert!(table.routes().iter().all(|r| r.verbs == vec![Verb::Get, Verb::Head]));
    }

    #[test]
    fn test_non_exclusive_resources_also_compile_method_routes() {
        let mut config = RoutingConfig::default();
        config.routing.exclusive_resources = false;
        let table = compile(vec![photo_controller()], &config);
        assert_eq!(table.len(), 4);
        assert_eq!(table.uri_by_name("archive").as_deref(), Some("photos/archive"));
    }

    #[test]
    fn test_resource_scoped_by_class_prefix_and_domain() {
        let class = HandlerClass::new("App\\Http\\Controllers\\ProfileController")
            .with(Prefix { prefix: "account".into() })
            .with(Domain { domain: "{tenant}.example.com".into() })
            .with(Singleton::new("profile"))
            .with(Middleware { middleware: vec!["auth".into()] });
        let mut config = RoutingConfig::default();
        config.routing.middleware = vec!["bindings".into()];
        let table = compile(vec![class], &config);

        let show = table.route_by_name("profile.show").unwrap();
        assert_eq!(show.uri(), "account/profile");
        assert_eq!(show.domain.as_deref(), Some("{tenant}.example.com"));
        assert_eq!(show.middleware, vec!["bindings", "auth"]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_method_routes_inside_group() {
        let class = HandlerClass::new("App\\Http\\Controllers\\Admin\\UserController")
            .with(Group {
                prefix: Some("admin".into()),
                name_prefix: Some("admin.".into()),
                ..Group::default()
            })
            .with(Where::number("user"))
            .with(Middleware { middleware: vec!["auth".into()] })
            .method(
                HandlerMethod::public("show")
                    .with(Route::get("users/{user}").named("users.show"))
                    .with(WithoutMiddleware { middleware: vec!["auth".into()] }),
            )
            .method(HandlerMethod::public("helper"))
            .method(HandlerMethod::private("hidden").with(Route::get("hidden")));
        let mut config = RoutingConfig::default();
        config.routing.middleware = vec!["web".into()];
        let table = compile(vec![class], &config);

        assert_eq!(table.len(), 1);
        let route = table.route_by_name("admin.users.show").unwrap();
        assert_eq!(route.uri(), "admin/users/{user}");
        assert_eq!(route.wheres["user"], "[0-9]+");
        assert_eq!(route.gathered_middleware(), vec!["web"]);
    }

    #[test]
    fn test_unknown_class_is_skipped() {
        let config = RoutingConfig::default();
        let catalog = HandlerCatalog::new();
        let mut table = RouteTable::new();
        let mut registrar = RouteRegistrar::new(&mut table, &catalog, &config);
        registrar.register_class("App\\Missing");
        assert_eq!(registrar.registered(), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_reregistering_a_class_counts_only_new_routes() {
        let config = RoutingConfig::default();
        let mut catalog = HandlerCatalog::new();
        catalog.register(
            HandlerClass::new("App\\Http\\Controllers\\PingController")
                .method(HandlerMethod::public("ping").with(Route::get("ping"))),
        );
        let mut table = RouteTable::new();
        let mut registrar = RouteRegistrar::new(&mut table, &catalog, &config);

        registrar.register_class("App\\Http\\Controllers\\PingController");
        assert_eq!(registrar.registered(), 1);
        registrar.register_class("App\\Http\\Controllers\\PingController");
        assert_eq!(registrar.registered(), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_registrar_settings() {
        let config = RoutingConfig::default();
        let catalog = HandlerCatalog::new();
        let mut table = RouteTable::new();
        let mut registrar = RouteRegistrar::new(&mut table, &catalog, &config);
        registrar
            .use_root_namespace("Modules/Blog")
            .use_base_path("C:\\site\\modules")
            .use_middleware(["web"])
            .use_without_middleware(["csrf"]);
        assert_eq!(registrar.root_namespace(), "Modules\\Blog\\");
        assert_eq!(registrar.base_path(), "C:/site/modules");
        assert_eq!(registrar.middleware(), ["web".to_string()]);
        assert_eq!(registrar.without_middleware(), ["csrf".to_string()]);
    }
}
