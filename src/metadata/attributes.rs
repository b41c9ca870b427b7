//! Routing declarations attached to handler classes and methods.
//!
//! Each declaration kind is its own struct so it can be built in code or
//! deserialized from a catalog manifest. [`Attribute`] is the closed set of
//! kinds the resolvers understand.

use std::collections::BTreeMap;

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// HTTP verb accepted by a route declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Verb {
    /// Every verb, in the order `any` routes list them.
    pub const ALL: [Verb; 7] = [
        Verb::Get,
        Verb::Head,
        Verb::Post,
        Verb::Put,
        Verb::Patch,
        Verb::Delete,
        Verb::Options,
    ];

    pub fn as_method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Head => Method::HEAD,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
            Verb::Options => Method::OPTIONS,
        }
    }

    pub fn from_method(method: &Method) -> Option<Self> {
        Verb::ALL.into_iter().find(|verb| verb.as_method() == *method)
    }

    /// Whether the verb never mutates server state.
    pub fn is_safe(self) -> bool {
        matches!(self, Verb::Get | Verb::Head | Verb::Options)
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_method().as_str())
    }
}

/// Expands a verb list the way route declarations do: `GET` always answers `HEAD` too.
pub fn normalize_verbs(verbs: &[Verb]) -> Vec<Verb> {
    let mut out: Vec<Verb> = Vec::with_capacity(verbs.len() + 1);
    for verb in verbs {
        if !out.contains(verb) {
            out.push(*verb);
        }
        if *verb == Verb::Get && !out.contains(&Verb::Head) {
            out.push(Verb::Head);
        }
    }
    out
}

/// URI prefix applied to every route of a class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Prefix {
    pub prefix: String,
}

/// Host pattern applied to every route of a class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Domain {
    pub domain: String,
}

/// Host pattern read from the configuration store, with a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DomainFromConfig {
    pub key: String,
    #[serde(default)]
    pub default: Option<String>,
}

/// One group declaration. Repeated groups compose in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Group {
    pub domain: Option<String>,
    pub prefix: Option<String>,
    #[serde(rename = "where")]
    pub wheres: BTreeMap<String, String>,
    #[serde(rename = "as")]
    pub name_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Middleware {
    pub middleware: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WithoutMiddleware {
    pub middleware: Vec<String>,
}

/// Constraint on a path parameter, as an unanchored regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Where {
    pub param: String,
    pub constraint: String,
}

impl Where {
    pub fn new(param: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            constraint: constraint.into(),
        }
    }

    pub fn number(param: impl Into<String>) -> Self {
        Self::new(param, "[0-9]+")
    }

    pub fn alpha(param: impl Into<String>) -> Self {
        Self::new(param, "[a-zA-Z]+")
    }

    pub fn alpha_numeric(param: impl Into<String>) -> Self {
        Self::new(param, "[a-zA-Z0-9]+")
    }

    pub fn uuid(param: impl Into<String>) -> Self {
        Self::new(
            param,
            r"[\da-fA-F]{8}-[\da-fA-F]{4}-[\da-fA-F]{4}-[\da-fA-F]{4}-[\da-fA-F]{12}",
        )
    }

    pub fn ulid(param: impl Into<String>) -> Self {
        Self::new(param, "[0-7][0-9a-hjkmnp-tv-zA-HJKMNP-TV-Z]{25}")
    }

    /// Restricts the parameter to one of the given literal values.
    pub fn one_of<I, S>(param: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = values
            .into_iter()
            .map(|v| regex::escape(v.as_ref()))
            .collect();
        Self::new(param, alternatives.join("|"))
    }
}

/// Default value for a route parameter or key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScopeBindings {
    #[serde(default = "enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WithTrashed {
    #[serde(default = "enabled")]
    pub enabled: bool,
}

fn enabled() -> bool {
    true
}

/// How the routes of a resource are named.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ResourceNames {
    /// Replaces the resource name as the naming base (`<base>.<action>`).
    Base(String),
    /// Explicit name per action; unlisted actions keep the default.
    PerAction(BTreeMap<String, String>),
}

/// Resource shorthand: a conventional CRUD route set for the class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Resource {
    pub resource: String,
    /// Api resources omit the `create` and `edit` form routes.
    pub api: bool,
    pub shallow: Option<bool>,
    pub only: Option<Vec<String>>,
    pub except: Option<Vec<String>>,
    pub names: Option<ResourceNames>,
    pub parameters: Option<BTreeMap<String, String>>,
}

impl Resource {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            ..Self::default()
        }
    }

    pub fn api(resource: impl Into<String>) -> Self {
        Self {
            api: true,
            ..Self::new(resource)
        }
    }

    pub fn only<I: IntoIterator<Item = S>, S: Into<String>>(mut self, actions: I) -> Self {
        self.only = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    pub fn except<I: IntoIterator<Item = S>, S: Into<String>>(mut self, actions: I) -> Self {
        self.except = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    pub fn shallow(mut self, shallow: bool) -> Self {
        self.shallow = Some(shallow);
        self
    }

    pub fn names(mut self, names: ResourceNames) -> Self {
        self.names = Some(names);
        self
    }

    pub fn parameter(mut self, resource: impl Into<String>, param: impl Into<String>) -> Self {
        self.parameters
            .get_or_insert_with(BTreeMap::new)
            .insert(resource.into(), param.into());
        self
    }
}

/// Singleton shorthand: a resource with exactly one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Singleton {
    pub singleton: String,
    pub api: bool,
    pub creatable: Option<bool>,
    pub destroyable: Option<bool>,
    pub only: Option<Vec<String>>,
    pub except: Option<Vec<String>>,
    pub names: Option<ResourceNames>,
    pub parameters: Option<BTreeMap<String, String>>,
}

impl Singleton {
    pub fn new(singleton: impl Into<String>) -> Self {
        Self {
            singleton: singleton.into(),
            ..Self::default()
        }
    }

    pub fn api(singleton: impl Into<String>) -> Self {
        Self {
            api: true,
            ..Self::new(singleton)
        }
    }

    pub fn creatable(mut self) -> Self {
        self.creatable = Some(true);
        self
    }

    pub fn destroyable(mut self) -> Self {
        self.destroyable = Some(true);
        self
    }
}

/// A route declaration on a method. Uri and name default to method-name
/// conventions when absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Route {
    pub verbs: Vec<Verb>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub without_middleware: Vec<String>,
}

impl Route {
    pub fn new(verbs: impl Into<Vec<Verb>>, uri: Option<&str>) -> Self {
        Self {
            verbs: verbs.into(),
            uri: uri.map(str::to_string),
            name: None,
            middleware: Vec::new(),
            without_middleware: Vec::new(),
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(vec![Verb::Get], Some(uri))
    }

    pub fn post(uri: &str) -> Self {
        Self::new(vec![Verb::Post], Some(uri))
    }

    pub fn put(uri: &str) -> Self {
        Self::new(vec![Verb::Put], Some(uri))
    }

    pub fn patch(uri: &str) -> Self {
        Self::new(vec![Verb::Patch], Some(uri))
    }

    pub fn delete(uri: &str) -> Self {
        Self::new(vec![Verb::Delete], Some(uri))
    }

    pub fn options(uri: &str) -> Self {
        Self::new(vec![Verb::Options], Some(uri))
    }

    pub fn any(uri: &str) -> Self {
        Self::new(Verb::ALL.to_vec(), Some(uri))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_middleware<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.middleware.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn without_middleware<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        names: I,
    ) -> Self {
        self.without_middleware
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Verbs with the implicit `HEAD` for `GET` routes.
    pub fn methods(&self) -> Vec<Verb> {
        normalize_verbs(&self.verbs)
    }

    pub fn uri_or(&self, fallback: &str) -> String {
        self.uri.clone().unwrap_or_else(|| fallback.to_string())
    }

    pub fn name_or(&self, fallback: &str) -> String {
        self.name.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// Every declaration kind a handler class or method can carry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attribute {
    Prefix(Prefix),
    Domain(Domain),
    DomainFromConfig(DomainFromConfig),
    Group(Group),
    Middleware(Middleware),
    WithoutMiddleware(WithoutMiddleware),
    Where(Where),
    Defaults(Defaults),
    ScopeBindings(ScopeBindings),
    WithTrashed(WithTrashed),
    Resource(Resource),
    Singleton(Singleton),
    Route(Route),
}

/// Declaration kinds used as lookup keys. The two contract kinds match a
/// family of concrete kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Prefix,
    Domain,
    DomainFromConfig,
    Group,
    Middleware,
    WithoutMiddleware,
    Where,
    Defaults,
    ScopeBindings,
    WithTrashed,
    Resource,
    Singleton,
    Route,
    /// `Resource` or `Singleton`.
    ResourceContract,
    /// Any declaration at all.
    Routing,
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Prefix(_) => AttributeKind::Prefix,
            Attribute::Domain(_) => AttributeKind::Domain,
            Attribute::DomainFromConfig(_) => AttributeKind::DomainFromConfig,
            Attribute::Group(_) => AttributeKind::Group,
            Attribute::Middleware(_) => AttributeKind::Middleware,
            Attribute::WithoutMiddleware(_) => AttributeKind::WithoutMiddleware,
            Attribute::Where(_) => AttributeKind::Where,
            Attribute::Defaults(_) => AttributeKind::Defaults,
            Attribute::ScopeBindings(_) => AttributeKind::ScopeBindings,
            Attribute::WithTrashed(_) => AttributeKind::WithTrashed,
            Attribute::Resource(_) => AttributeKind::Resource,
            Attribute::Singleton(_) => AttributeKind::Singleton,
            Attribute::Route(_) => AttributeKind::Route,
        }
    }
}

impl AttributeKind {
    /// Kind match including the contract families.
    pub fn matches(self, attribute: &Attribute) -> bool {
        let actual = attribute.kind();
        match self {
            AttributeKind::Routing => true,
            AttributeKind::ResourceContract => {
                matches!(actual, AttributeKind::Resource | AttributeKind::Singleton)
            }
            kind => kind == actual,
        }
    }
}

macro_rules! impl_into_attribute {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Attribute {
                fn from(value: $ty) -> Self {
                    Attribute::$ty(value)
                }
            }
        )*
    };
}

impl_into_attribute!(
    Prefix,
    Domain,
    DomainFromConfig,
    Group,
    Middleware,
    WithoutMiddleware,
    Where,
    Defaults,
    ScopeBindings,
    WithTrashed,
    Resource,
    Singleton,
    Route,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_answers_head() {
        assert_eq!(Route::get("/a").methods(), vec![Verb::Get, Verb::Head]);
        assert_eq!(Route::post("/a").methods(), vec![Verb::Post]);
        assert_eq!(Route::any("/a").methods().len(), Verb::ALL.len());
    }

    #[test]
    fn test_contract_kinds_match_families() {
        let resource = Attribute::from(Resource::new("photos"));
        let singleton = Attribute::from(Singleton::new("profile"));
        let prefix = Attribute::from(Prefix { prefix: "x".into() });

        assert!(AttributeKind::ResourceContract.matches(&resource));
        assert!(AttributeKind::ResourceContract.matches(&singleton));
        assert!(!AttributeKind::ResourceContract.matches(&prefix));
        assert!(AttributeKind::Routing.matches(&prefix));
        assert!(!AttributeKind::Resource.matches(&singleton));
    }

    #[test]
    fn test_where_one_of_escapes_values() {
        let w = Where::one_of("format", ["json", "x.ml"]);
        assert_eq!(w.constraint, r"json|x\.ml");
    }

    #[test]
    fn test_attribute_deserializes_from_toml() {
        let attr: Attribute = toml::from_str(
            r#"
            kind = "route"
            verbs = ["GET"]
            uri = "/photos"
            name = "photos.list"
            "#,
        )
        .unwrap();
        assert_eq!(attr, Attribute::Route(Route::get("/photos").named("photos.list")));

        let attr: Attribute = toml::from_str("kind = \"scope_bindings\"").unwrap();
        assert_eq!(attr, Attribute::ScopeBindings(ScopeBindings { enabled: true }));
    }
}
