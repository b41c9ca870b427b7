//! Resource and singleton shorthand expansion.
//!
//! A resource named `photos` expands to the conventional CRUD set:
//!
//! | action  | verbs       | uri                  |
//! |---------|-------------|----------------------|
//! | index   | GET         | photos               |
//! | create  | GET         | photos/create        |
//! | store   | POST        | photos               |
//! | show    | GET         | photos/{photo}       |
//! | edit    | GET         | photos/{photo}/edit  |
//! | update  | PUT, PATCH  | photos/{photo}       |
//! | destroy | DELETE      | photos/{photo}       |
//!
//! Dotted names nest: `photos.comments` lives under `photos/{photo}/comments`.

use serde::Serialize;

use crate::metadata::attributes::{ResourceNames, Verb};
use crate::resolve::class::ResourceDescriptor;
use crate::routing::route::join_uri;

const RESOURCE_ACTIONS: [&str; 7] = ["index", "create", "store", "show", "edit", "update", "destroy"];
const SINGLETON_ACTIONS: [&str; 6] = ["create", "store", "show", "edit", "update", "destroy"];

/// Actions without a page of their own in api resources.
const FORM_ACTIONS: [&str; 2] = ["create", "edit"];

/// One route of an expanded shorthand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRoute {
    pub action: &'static str,
    pub verbs: Vec<Verb>,
    pub uri: String,
    pub name: String,
}

/// Naive English singular, enough for resource names.
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some(stem) = lower.strip_suffix("ies").filter(|stem| !stem.is_empty()) {
        return format!("{}y", &word[..stem.len()]);
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") && word.len() > 1 {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

fn verbs_for(action: &str) -> Vec<Verb> {
    match action {
        "store" => vec![Verb::Post],
        "update" => vec![Verb::Put, Verb::Patch],
        "destroy" => vec![Verb::Delete],
        _ => vec![Verb::Get],
    }
}

fn suffix_for(action: &str) -> &'static str {
    match action {
        "create" => "create",
        "edit" => "edit",
        _ => "",
    }
}

fn is_member(action: &str) -> bool {
    matches!(action, "show" | "edit" | "update" | "destroy")
}

struct Expansion<'a> {
    descriptor: &'a ResourceDescriptor,
    segments: Vec<&'a str>,
}

impl<'a> Expansion<'a> {
    fn new(descriptor: &'a ResourceDescriptor) -> Self {
        Self {
            descriptor,
            segments: descriptor
                .name
                .split('.')
                .filter(|segment| !segment.is_empty())
                .collect(),
        }
    }

    fn parameter(&self, segment: &str) -> String {
        self.descriptor
            .parameters
            .get(segment)
            .cloned()
            .unwrap_or_else(|| singularize(segment).replace('-', "_"))
    }

    /// `parent/{parent}/...` up to, but excluding, the last segment.
    fn parent_prefix(&self) -> String {
        let parents = &self.segments[..self.segments.len().saturating_sub(1)];
        let parts: Vec<String> = parents
            .iter()
            .map(|segment| format!("{}/{{{}}}", segment, self.parameter(segment)))
            .collect();
        join_uri(parts.iter().map(String::as_str))
    }

    fn last(&self) -> &str {
        self.segments.last().copied().unwrap_or("")
    }

    fn name(&self, action: &str) -> String {
        match &self.descriptor.names {
            Some(ResourceNames::PerAction(names)) if names.contains_key(action) => names[action].clone(),
            Some(ResourceNames::Base(base)) => format!("{base}.{action}"),
            _ => format!("{}.{}", self.segments.join("."), action),
        }
    }

    fn actions(&self, all: &[&'static str], defaults: Vec<&'static str>) -> Vec<&'static str> {
        let descriptor = self.descriptor;
        all.iter()
            .copied()
            .filter(|action| defaults.contains(action))
            .filter(|action| !(descriptor.is_api && FORM_ACTIONS.contains(action)))
            .filter(|action| {
                descriptor
                    .only
                    .as_ref()
                    .map_or(true, |only| only.iter().any(|o| o == action))
            })
            .filter(|action| {
                descriptor
                    .except
                    .as_ref()
                    .map_or(true, |except| !except.iter().any(|e| e == action))
            })
            .collect()
    }

    fn resource_uri(&self, action: &str) -> String {
        let last = self.last();
        let base = if is_member(action) && self.descriptor.shallow {
            String::new()
        } else {
            self.parent_prefix()
        };
        let member = if is_member(action) {
            format!("{{{}}}", self.parameter(last))
        } else {
            String::new()
        };
        join_uri([base.as_str(), last, member.as_str(), suffix_for(action)])
    }

    fn singleton_uri(&self, action: &str) -> String {
        join_uri([self.parent_prefix().as_str(), self.last(), suffix_for(action)])
    }
}

/// Expand a resource or singleton descriptor into concrete routes.
pub fn expand(descriptor: &ResourceDescriptor) -> Vec<ResourceRoute> {
    let expansion = Expansion::new(descriptor);
    if expansion.segments.is_empty() {
        return Vec::new();
    }

    if descriptor.is_singleton {
        let mut defaults = vec!["show", "edit", "update"];
        if descriptor.creatable {
            defaults.extend(["create", "store", "destroy"]);
        }
        if descriptor.destroyable {
            defaults.push("destroy");
        }
        expansion
            .actions(&SINGLETON_ACTIONS, defaults)
            .into_iter()
            .map(|action| ResourceRoute {
                action,
                verbs: verbs_for(action),
                uri: expansion.singleton_uri(action),
                name: expansion.name(action),
            })
            .collect()
    } else {
        expansion
            .actions(&RESOURCE_ACTIONS, RESOURCE_ACTIONS.to_vec())
            .into_iter()
            .map(|action| ResourceRoute {
                action,
                verbs: verbs_for(action),
                uri: expansion.resource_uri(action),
                name: expansion.name(action),
            })
            .collect()
    }
}
