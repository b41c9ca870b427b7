//! Dotted action name → handler reference.
//!
//! `utils.ping.pong` names `Utils\PingController::pong`: every segment is
//! studly-cased, all but the last two become namespace segments, the
//! second-to-last becomes the controller and the last the method. A single
//! segment names an invokable controller.

use heck::{ToKebabCase, ToUpperCamelCase};
use serde::Serialize;

use crate::compile::discovery::normalize_namespace;
use crate::metadata::handler::{HandlerRef, INVOKABLE_METHOD, NAMESPACE_SEPARATOR};

const CONTROLLER_SUFFIX: &str = "Controller";

/// Handler a dotted action name points at, relative to a root namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerReference {
    pub namespace: Vec<String>,
    pub class_name: String,
    pub method: String,
}

impl HandlerReference {
    /// Fully-qualified class name under `root_namespace`.
    pub fn class_path(&self, root_namespace: &str) -> String {
        let mut path = normalize_namespace(root_namespace);
        for segment in &self.namespace {
            path.push_str(segment);
            path.push(NAMESPACE_SEPARATOR);
        }
        path.push_str(&self.class_name);
        path
    }

    pub fn handler_ref(&self, root_namespace: &str) -> HandlerRef {
        HandlerRef::new(self.class_path(root_namespace), &self.method)
    }
}

fn lower_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn segments(dotted: &str) -> Vec<String> {
    dotted
        .split('.')
        .map(|segment| segment.to_upper_camel_case())
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Derive the handler for a dotted action name; `None` for a name with no
/// usable segment.
pub fn derive_handler_reference(dotted: &str) -> Option<HandlerReference> {
    let mut segments = segments(dotted);
    match segments.len() {
        0 => None,
        1 => Some(HandlerReference {
            namespace: Vec::new(),
            class_name: format!("{}{}", segments[0], CONTROLLER_SUFFIX),
            method: INVOKABLE_METHOD.to_string(),
        }),
        n => {
            let method = lower_first(&segments[n - 1]);
            let class_name = format!("{}{}", segments[n - 2], CONTROLLER_SUFFIX);
            segments.truncate(n - 2);
            Some(HandlerReference {
                namespace: segments,
                class_name,
                method,
            })
        }
    }
}

/// Path a synthesized route is registered under: kebab-cased segments
/// joined by `/`.
pub fn synthesized_path(dotted: &str) -> String {
    segments(dotted)
        .iter()
        .map(|segment| segment.to_kebab_case())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_segments() {
        let reference = derive_handler_reference("utils.ping.pong").unwrap();
        assert_eq!(reference.namespace, vec!["Utils"]);
        assert_eq!(reference.class_name, "PingController");
        assert_eq!(reference.method, "pong");
        assert_eq!(
            reference.class_path("App\\Http\\Controllers\\"),
            "App\\Http\\Controllers\\Utils\\PingController"
        );
        assert_eq!(synthesized_path("utils.ping.pong"), "utils/ping/pong");
    }

    #[test]
    fn test_segments_are_studly_cased() {
        let reference = derive_handler_reference("admin.reports.user_profile.show_archived").unwrap();
        assert_eq!(reference.namespace, vec!["Admin", "Reports"]);
        assert_eq!(reference.class_name, "UserProfileController");
        assert_eq!(reference.method, "showArchived");
        assert_eq!(
            synthesized_path("admin.reports.user_profile.show_archived"),
            "admin/reports/user-profile/show-archived"
        );
    }

    #[test]
    fn test_two_segments_live_in_root() {
        let reference = derive_handler_reference("orders.create").unwrap();
        assert!(reference.namespace.is_empty());
        assert_eq!(reference.class_path("App"), "App\\OrdersController");
        assert_eq!(reference.handler_ref("App").to_string(), "App\\OrdersController@create");
    }

    #[test]
    fn test_single_segment_is_invokable() {
        let reference = derive_handler_reference("ping").unwrap();
        assert_eq!(reference.class_name, "PingController");
        assert_eq!(reference.method, "invoke");
        assert_eq!(reference.handler_ref("App").method, None);
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(derive_handler_reference(""), None);
        assert_eq!(derive_handler_reference(".."), None);
    }
}
