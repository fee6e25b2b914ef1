//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject policies that would trip on the first request
//! - Validate addresses and admin credentials
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(policy_errors) = config.breaker.to_policies() {
        errors.extend(policy_errors);
    }

    for name in config.breaker.services.keys() {
        if name.trim().is_empty() {
            errors.push(ValidationError::new(
                "breaker.services",
                "service name must not be empty",
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if config.admin.enabled {
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "admin.bind_address",
                format!("invalid socket address '{}'", config.admin.bind_address),
            ));
        }
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new(
                "admin.api_key",
                "must be set when the admin API is enabled",
            ));
        }
        if config.admin.request_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "admin.request_timeout_secs",
                "must be greater than zero",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
