//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that declared `where` constraints are valid regular expressions
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RoutingConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RoutingConfig;

/// One failed check, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &RoutingConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    for (i, directory) in config.routing.directories.iter().enumerate() {
        if directory.path.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("routing.directories[{i}].path"),
                "must not be empty",
            ));
        }
        for (param, constraint) in &directory.wheres {
            if let Err(e) = regex::Regex::new(constraint) {
                errors.push(ValidationError::new(
                    format!("routing.directories[{i}].where.{param}"),
                    format!("invalid pattern: {e}"),
                ));
            }
        }
    }

    let gateway = &config.gateway;
    if gateway.endpoint.trim_matches('/').is_empty() {
        errors.push(ValidationError::new("gateway.endpoint", "must not be empty"));
    }
    if gateway.synthesized_verbs.is_empty() {
        errors.push(ValidationError::new("gateway.synthesized_verbs", "must list at least one verb"));
    }
    if gateway.action_field.is_empty() {
        errors.push(ValidationError::new("gateway.action_field", "must not be empty"));
    }
    if gateway.default_version.is_empty() {
        errors.push(ValidationError::new("gateway.default_version", "must not be empty"));
    }
    for (version, aliases) in gateway.alias.versions() {
        for (alias, _) in aliases.entries() {
            if alias.is_empty() {
                errors.push(ValidationError::new(
                    format!("gateway.alias.\"{version}\""),
                    "alias keys must not be empty",
                ));
            }
        }
    }

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("expected 'pretty' or 'json', got '{}'", observability.log_format),
        ));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::new("admin.api_key", "must be set when admin is enabled"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DirectoryConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&RoutingConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = RoutingConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.timeouts.request_secs = 0;
        config.observability.log_format = "xml".into();
        let mut dir = DirectoryConfig::new("handlers");
        dir.wheres.insert("id".into(), "[0-9".into());
        config.routing.directories.push(dir);

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "timeouts.request_secs",
                "routing.directories[1].where.id",
                "observability.log_format",
            ]
        );
    }

    #[test]
    fn test_admin_key_required_when_enabled() {
        let mut config = RoutingConfig::default();
        config.admin.enabled = true;
        config.admin.api_key = " ".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].to_string(), "admin.api_key: must be set when admin is enabled");
    }
}
