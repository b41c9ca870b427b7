//! Class-level declaration merge.
//!
//! Every operation is independent and side-effect free; [`RouteAttributes::resolve`]
//! runs them all once and freezes the result as [`ClassMetadata`].

use std::collections::BTreeMap;

use heck::ToKebabCase;
use serde::Serialize;

use crate::config::RoutingConfig;
use crate::metadata::attributes::{Attribute, AttributeKind, Resource, ResourceNames, Singleton};
use crate::metadata::handler::HandlerClass;
use crate::metadata::reader::{self, Annotated};
use crate::routing::route::{join_uri, GroupScope};

/// Shorthand CRUD descriptor, normalized across resources and singletons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    pub name: String,
    pub is_api: bool,
    pub is_singleton: bool,
    pub shallow: bool,
    pub only: Option<Vec<String>>,
    pub except: Option<Vec<String>>,
    pub names: Option<ResourceNames>,
    pub parameters: BTreeMap<String, String>,
    pub creatable: bool,
    pub destroyable: bool,
}

/// Effective class context, computed once per class per compilation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassMetadata {
    pub prefix: Option<String>,
    pub domain: Option<String>,
    pub groups: Vec<GroupScope>,
    pub middleware: Vec<String>,
    pub without_middleware: Vec<String>,
    pub wheres: BTreeMap<String, String>,
    pub defaults: BTreeMap<String, String>,
    pub scope_bindings: Option<bool>,
    pub with_trashed: bool,
    pub resource: Option<ResourceDescriptor>,
}

/// Normalizes a prefix: split on `/`, drop empty segments, rejoin.
pub fn normalize_prefix<'a, I>(parts: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = join_uri(parts);
    (joined != "/").then_some(joined)
}

/// Reads a handler class's declarations against the configuration store.
pub struct RouteAttributes<'a> {
    class: &'a HandlerClass,
    config: &'a RoutingConfig,
}

impl<'a> RouteAttributes<'a> {
    pub fn new(class: &'a HandlerClass, config: &'a RoutingConfig) -> Self {
        Self { class, config }
    }

    pub fn class(&self) -> &'a HandlerClass {
        self.class
    }

    /// The last prefix declaration wins, even when it normalizes to the root.
    pub fn prefix(&self) -> Option<String> {
        reader::fold(self.class, &[AttributeKind::Prefix], None, |acc, attribute| match attribute {
            Attribute::Prefix(p) => normalize_prefix([p.prefix.as_str()]),
            _ => acc,
        })
        .flatten()
    }

    /// Domain read from the configuration store, or the declaration's fallback.
    pub fn domain_from_config(&self) -> Option<String> {
        reader::last(self.class, &[AttributeKind::DomainFromConfig], |attribute| match attribute {
            Attribute::DomainFromConfig(d) => self
                .config
                .value(&d.key)
                .map(str::to_string)
                .or_else(|| d.default.clone()),
            _ => None,
        })
    }

    /// Explicit domain declaration, else the config-sourced domain.
    pub fn domain(&self) -> Option<String> {
        reader::last(self.class, &[AttributeKind::Domain], |attribute| match attribute {
            Attribute::Domain(d) if !d.domain.is_empty() => Some(d.domain.clone()),
            _ => None,
        })
        .or_else(|| self.domain_from_config())
    }

    /// The class's group contexts. All group declarations fold into one
    /// context on top of the class prefix and domain; without any group
    /// declaration that base context is returned alone.
    pub fn groups(&self) -> Vec<GroupScope> {
        let base = GroupScope {
            domain: self.domain(),
            prefix: self.prefix(),
            ..GroupScope::default()
        };
        let folded = reader::fold(self.class, &[AttributeKind::Group], base.clone(), |mut acc, attribute| {
            if let Attribute::Group(group) = attribute {
                if let Some(prefix) = &group.prefix {
                    acc.prefix = normalize_prefix([acc.prefix.as_deref().unwrap_or(""), prefix.as_str()]);
                }
                if let Some(domain) = group.domain.as_ref().filter(|d| !d.is_empty()) {
                    acc.domain = Some(domain.clone());
                }
                acc.wheres.extend(group.wheres.clone());
                if let Some(name) = &group.name_prefix {
                    acc.name_prefix = Some(format!("{}{}", acc.name_prefix.take().unwrap_or_default(), name));
                }
            }
            acc
        });
        vec![folded.unwrap_or(base)]
    }

    /// Group derived from the class name: namespace segments below
    /// `<root>\Http\Controllers` plus the short name without `Controller`,
    /// kebab-cased, as both prefix and name prefix.
    #[deprecated(note = "class-name-derived groups are kept for compatibility only; declare a Group instead")]
    pub fn conventional_group(&self) -> GroupScope {
        let mut segments: Vec<String> = self
            .class
            .namespace_segments()
            .into_iter()
            .skip(3)
            .map(|segment| segment.to_kebab_case())
            .collect();
        let short = self.class.short_name();
        segments.push(short.strip_suffix("Controller").unwrap_or(short).to_kebab_case());

        GroupScope {
            domain: self.domain(),
            prefix: self
                .prefix()
                .or_else(|| normalize_prefix(segments.iter().map(String::as_str))),
            name_prefix: Some(format!("{}.", segments.join("."))),
            ..GroupScope::default()
        }
    }

    pub fn is_resource_contract(&self) -> bool {
        reader::has(self.class, &[AttributeKind::ResourceContract])
    }

    /// A plain resource declaration with no competing singleton.
    pub fn is_resource(&self) -> bool {
        reader::has(self.class, &[AttributeKind::Resource]) && !self.is_singleton()
    }

    /// Singleton declarations take precedence over resource declarations.
    pub fn is_singleton(&self) -> bool {
        reader::has(self.class, &[AttributeKind::Singleton])
    }

    pub fn resource(&self) -> Option<String> {
        reader::last(self.class, &[AttributeKind::Resource], |attribute| match attribute {
            Attribute::Resource(r) => Some(r.resource.clone()),
            _ => None,
        })
    }

    pub fn api_resource(&self) -> bool {
        reader::last(self.class, &[AttributeKind::Resource], |attribute| match attribute {
            Attribute::Resource(r) => Some(r.api),
            _ => None,
        })
        .unwrap_or(false)
    }

    pub fn shallow(&self) -> Option<bool> {
        reader::last(self.class, &[AttributeKind::Resource], |attribute| match attribute {
            Attribute::Resource(r) => r.shallow,
            _ => None,
        })
    }

    pub fn singleton(&self) -> Option<String> {
        reader::last(self.class, &[AttributeKind::Singleton], |attribute| match attribute {
            Attribute::Singleton(s) => Some(s.singleton.clone()),
            _ => None,
        })
    }

    pub fn api_singleton(&self) -> bool {
        reader::last(self.class, &[AttributeKind::Singleton], |attribute| match attribute {
            Attribute::Singleton(s) => Some(s.api),
            _ => None,
        })
        .unwrap_or(false)
    }

    pub fn creatable(&self) -> Option<bool> {
        reader::last(self.class, &[AttributeKind::Singleton], |attribute| match attribute {
            Attribute::Singleton(s) => s.creatable,
            _ => None,
        })
    }

    pub fn destroyable(&self) -> Option<bool> {
        reader::last(self.class, &[AttributeKind::Singleton], |attribute| match attribute {
            Attribute::Singleton(s) => s.destroyable,
            _ => None,
        })
    }

    pub fn only(&self) -> Option<Vec<String>> {
        self.shorthand_option(|r| r.only.clone(), |s| s.only.clone())
    }

    pub fn except(&self) -> Option<Vec<String>> {
        self.shorthand_option(|r| r.except.clone(), |s| s.except.clone())
    }

    pub fn names(&self) -> Option<ResourceNames> {
        self.shorthand_option(|r| r.names.clone(), |s| s.names.clone())
    }

    pub fn parameters(&self) -> Option<BTreeMap<String, String>> {
        self.shorthand_option(|r| r.parameters.clone(), |s| s.parameters.clone())
    }

    /// Field shared by both shorthand kinds, read from the declaration that
    /// wins (singleton over resource).
    fn shorthand_option<T>(
        &self,
        from_resource: impl Fn(&Resource) -> Option<T>,
        from_singleton: impl Fn(&Singleton) -> Option<T>,
    ) -> Option<T> {
        let kind = if self.is_singleton() {
            AttributeKind::Singleton
        } else {
            AttributeKind::Resource
        };
        reader::last(self.class, &[kind], |attribute| match attribute {
            Attribute::Resource(r) => from_resource(r),
            Attribute::Singleton(s) => from_singleton(s),
            _ => None,
        })
    }

    pub fn resource_descriptor(&self) -> Option<ResourceDescriptor> {
        let (name, is_api, is_singleton) = if self.is_singleton() {
            (self.singleton()?, self.api_singleton(), true)
        } else {
            (self.resource()?, self.api_resource(), false)
        };
        Some(ResourceDescriptor {
            name,
            is_api,
            is_singleton,
            shallow: self.shallow().unwrap_or(false),
            only: self.only(),
            except: self.except(),
            names: self.names(),
            parameters: self.parameters().unwrap_or_default(),
            creatable: self.creatable() == Some(true),
            destroyable: self.destroyable() == Some(true),
        })
    }

    pub fn middleware(&self) -> Vec<String> {
        collect_middleware(self.class, AttributeKind::Middleware)
    }

    pub fn without_middleware(&self) -> Vec<String> {
        collect_middleware(self.class, AttributeKind::WithoutMiddleware)
    }

    pub fn wheres(&self) -> BTreeMap<String, String> {
        collect_wheres(self.class)
    }

    pub fn defaults(&self) -> BTreeMap<String, String> {
        collect_defaults(self.class)
    }

    /// Explicit declaration, else the global default (`None` = undecided).
    pub fn scope_bindings(&self) -> Option<bool> {
        declared_scope_bindings(self.class).or(self.config.routing.scope_bindings)
    }

    pub fn with_trashed(&self) -> bool {
        declared_with_trashed(self.class).unwrap_or(false)
    }

    pub fn resolve(&self) -> ClassMetadata {
        ClassMetadata {
            prefix: self.prefix(),
            domain: self.domain(),
            groups: self.groups(),
            middleware: self.middleware(),
            without_middleware: self.without_middleware(),
            wheres: self.wheres(),
            defaults: self.defaults(),
            scope_bindings: self.scope_bindings(),
            with_trashed: self.with_trashed(),
            resource: self.resource_descriptor(),
        }
    }
}

// Merge helpers shared with the method resolver.

pub(crate) fn collect_middleware<E: Annotated + ?Sized>(element: &E, kind: AttributeKind) -> Vec<String> {
    reader::fold(element, &[kind], Vec::new(), |mut acc, attribute| {
        match attribute {
            Attribute::Middleware(m) => acc.extend(m.middleware.iter().cloned()),
            Attribute::WithoutMiddleware(m) => acc.extend(m.middleware.iter().cloned()),
            _ => {}
        }
        acc
    })
    .unwrap_or_default()
}

pub(crate) fn collect_wheres<E: Annotated + ?Sized>(element: &E) -> BTreeMap<String, String> {
    reader::fold(element, &[AttributeKind::Where], BTreeMap::new(), |mut acc, attribute| {
        if let Attribute::Where(w) = attribute {
            acc.insert(w.param.clone(), w.constraint.clone());
        }
        acc
    })
    .unwrap_or_default()
}

pub(crate) fn collect_defaults<E: Annotated + ?Sized>(element: &E) -> BTreeMap<String, String> {
    reader::fold(element, &[AttributeKind::Defaults], BTreeMap::new(), |mut acc, attribute| {
        if let Attribute::Defaults(d) = attribute {
            acc.insert(d.key.clone(), d.value.clone());
        }
        acc
    })
    .unwrap_or_default()
}

pub(crate) fn declared_scope_bindings<E: Annotated + ?Sized>(element: &E) -> Option<bool> {
    reader::last(element, &[AttributeKind::ScopeBindings], |attribute| match attribute {
        Attribute::ScopeBindings(s) => Some(s.enabled),
        _ => None,
    })
}

pub(crate) fn declared_with_trashed<E: Annotated + ?Sized>(element: &E) -> Option<bool> {
    reader::last(element, &[AttributeKind::WithTrashed], |attribute| match attribute {
        Attribute::WithTrashed(w) => Some(w.enabled),
        _ => None,
    })
}
