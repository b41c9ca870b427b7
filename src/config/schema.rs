//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the routing
//! service. All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::gateway::alias::{AliasTable, DEFAULT_VERSION};
use crate::metadata::attributes::Verb;
use crate::routing::route::GroupScope;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutingConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Declarative route registration.
    pub routing: RegistrationConfig,

    /// Gateway endpoint settings.
    pub gateway: GatewayConfig,

    /// Free-form key/value store read by `DomainFromConfig` declarations.
    pub values: BTreeMap<String, String>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,
}

impl RoutingConfig {
    /// Look up a configuration-store value.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Automatic route registration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Registration only happens when this is `true`.
    pub enabled: bool,

    /// Path to the handler catalog manifest (TOML).
    pub catalog: Option<String>,

    /// Default base path that discovered files are made relative to.
    pub base_path: String,

    /// Default namespace prepended to derived class names.
    pub root_namespace: String,

    /// Directories scanned for handler files.
    pub directories: Vec<DirectoryConfig>,

    /// Middleware applied to every registered route, after all declared middleware.
    pub middleware: Vec<String>,

    /// Middleware removed from every registered route.
    pub excluded_middleware: Vec<String>,

    /// Global scoped-binding default: `None` leaves the choice to the route layer.
    pub scope_bindings: Option<bool>,

    /// When `true`, classes with a resource or singleton declaration only
    /// register the shorthand routes and ignore per-method route declarations.
    pub exclusive_resources: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            catalog: None,
            base_path: "app".to_string(),
            root_namespace: "App\\".to_string(),
            directories: vec![DirectoryConfig::new("app/Http/Controllers")],
            middleware: Vec::new(),
            excluded_middleware: Vec::new(),
            scope_bindings: None,
            exclusive_resources: true,
        }
    }
}

/// One scanned directory and the group options applied around it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub path: String,

    /// Namespace for classes in this directory; defaults to the root namespace.
    pub namespace: Option<String>,

    /// Base path for class-name derivation. Defaults to `path` when a
    /// namespace is given, otherwise to the global base path.
    pub base_path: Option<String>,

    /// Only register files matching these globs (default `*.rs`).
    pub patterns: Vec<String>,

    /// Skip files matching these globs.
    pub not_patterns: Vec<String>,

    pub prefix: Option<String>,
    pub domain: Option<String>,
    #[serde(rename = "as")]
    pub name_prefix: Option<String>,
    pub middleware: Vec<String>,
    #[serde(rename = "where")]
    pub wheres: BTreeMap<String, String>,
}

impl DirectoryConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Group options wrapped around the whole directory.
    pub fn group_scope(&self) -> GroupScope {
        GroupScope {
            domain: self.domain.clone(),
            prefix: self.prefix.clone(),
            wheres: self.wheres.clone(),
            name_prefix: self.name_prefix.clone(),
            middleware: self.middleware.clone(),
            without_middleware: Vec::new(),
        }
    }
}

/// Gateway endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub enabled: bool,

    /// Path of the single gateway endpoint.
    pub endpoint: String,

    /// Middleware recorded on the gateway route.
    pub middleware: Vec<String>,

    /// `version → {alias prefix → canonical prefix}`.
    pub alias: AliasTable,

    /// Version assumed when a request carries none.
    pub default_version: String,

    /// Namespace convention-derived handler classes live under.
    pub namespace: String,

    /// Verbs of routes synthesized on first use.
    pub synthesized_verbs: Vec<Verb>,

    /// Input field holding the action name.
    pub action_field: String,

    /// Input field holding the API version.
    pub version_field: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "gateway.do".to_string(),
            middleware: Vec::new(),
            alias: AliasTable::default(),
            default_version: DEFAULT_VERSION.to_string(),
            namespace: "App\\Http\\Controllers\\".to_string(),
            synthesized_verbs: vec![Verb::Post],
            action_field: "action".to_string(),
            version_field: "version".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}
