//! Handler class and method descriptors.

use serde::{Deserialize, Serialize};

use crate::metadata::attributes::Attribute;
use crate::metadata::reader::Annotated;

/// Separator between namespace segments of a class name.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// Method name that makes a class directly callable.
pub const INVOKABLE_METHOD: &str = "invoke";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// A method of a handler class with its own declarations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HandlerMethod {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl HandlerMethod {
    pub fn public(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            attributes: Vec::new(),
        }
    }

    pub fn private(name: impl Into<String>) -> Self {
        Self {
            visibility: Visibility::Private,
            ..Self::public(name)
        }
    }

    pub fn with(mut self, attribute: impl Into<Attribute>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

impl Annotated for HandlerMethod {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

/// A controller-like unit: a fully-qualified name, class-level declarations
/// and its methods in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HandlerClass {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub methods: Vec<HandlerMethod>,
}

impl HandlerClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with(mut self, attribute: impl Into<Attribute>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn method(mut self, method: HandlerMethod) -> Self {
        self.methods.push(method);
        self
    }

    /// Class name without its namespace.
    pub fn short_name(&self) -> &str {
        self.name
            .rsplit(NAMESPACE_SEPARATOR)
            .next()
            .unwrap_or(&self.name)
    }

    /// Namespace segments, outermost first.
    pub fn namespace_segments(&self) -> Vec<&str> {
        let mut segments: Vec<&str> = self
            .name
            .split(NAMESPACE_SEPARATOR)
            .filter(|s| !s.is_empty())
            .collect();
        segments.pop();
        segments
    }

    pub fn declared_methods(&self, visibility: Visibility) -> impl Iterator<Item = &HandlerMethod> {
        self.methods
            .iter()
            .filter(move |method| method.visibility == visibility)
    }

    pub fn public_method(&self, name: &str) -> Option<&HandlerMethod> {
        self.declared_methods(Visibility::Public)
            .find(|method| method.name == name)
    }
}

impl Annotated for HandlerClass {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

/// What a route points at: a class method, or the class itself when it is
/// invokable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct HandlerRef {
    pub class: String,
    pub method: Option<String>,
}

impl HandlerRef {
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        let method = method.into();
        Self {
            class: class.into(),
            method: (method != INVOKABLE_METHOD).then_some(method),
        }
    }

    pub fn invokable(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: None,
        }
    }

    /// Method actually called, resolving the invokable convention.
    pub fn method_name(&self) -> &str {
        self.method.as_deref().unwrap_or(INVOKABLE_METHOD)
    }
}

impl std::fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{}@{}", self.class, method),
            None => f.write_str(&self.class),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_segments() {
        let class = HandlerClass::new("App\\Http\\Controllers\\Utils\\PingController");
        assert_eq!(class.short_name(), "PingController");
        assert_eq!(class.namespace_segments(), vec!["App", "Http", "Controllers", "Utils"]);
    }

    #[test]
    fn test_public_method_lookup_skips_private() {
        let class = HandlerClass::new("PingController")
            .method(HandlerMethod::public("ping"))
            .method(HandlerMethod::private("secret"));
        assert!(class.public_method("ping").is_some());
        assert!(class.public_method("secret").is_none());
        assert!(class.public_method("missing").is_none());
    }

    #[test]
    fn test_invokable_handler_ref() {
        let r = HandlerRef::new("App\\InvokeController", "invoke");
        assert_eq!(r.method, None);
        assert_eq!(r.method_name(), "invoke");
        assert_eq!(r.to_string(), "App\\InvokeController");

        let r = HandlerRef::new("App\\PhotoController", "show");
        assert_eq!(r.to_string(), "App\\PhotoController@show");
    }
}
