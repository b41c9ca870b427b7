//! Registration table of known handler classes.
//!
//! Stands in for class introspection: discovery produces class names, the
//! catalog answers whether such a class exists and what it declares.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::metadata::handler::HandlerClass;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Default, Deserialize)]
struct CatalogManifest {
    #[serde(default)]
    classes: Vec<HandlerClass>,
}

/// Handler classes keyed by fully-qualified name.
#[derive(Debug, Clone, Default)]
pub struct HandlerCatalog {
    classes: HashMap<String, Arc<HandlerClass>>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML manifest made of `[[classes]]` tables.
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let manifest: CatalogManifest = toml::from_str(content)?;
        let mut catalog = Self::new();
        for class in manifest.classes {
            catalog.register(class);
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let catalog = Self::from_toml(&content)?;
        tracing::info!(path = ?path, classes = catalog.len(), "Handler catalog loaded");
        Ok(catalog)
    }

    /// Register a class, replacing any earlier class of the same name.
    pub fn register(&mut self, class: HandlerClass) -> &mut Self {
        self.classes.insert(class.name.clone(), Arc::new(class));
        self
    }

    pub fn class(&self, name: &str) -> Option<Arc<HandlerClass>> {
        self.classes.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Class names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
