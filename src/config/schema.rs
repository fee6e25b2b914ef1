//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the breaker
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::validation::ValidationError;
use crate::resilience::policy::{Policy, PolicyError};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Breaker policies.
    pub breaker: BreakerSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// `[breaker]` section: default policy plus per-service overrides.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BreakerSettings {
    /// Policy for any dependency without an override.
    pub defaults: PolicySettings,

    /// Per-dependency overrides, keyed by service name. Unset fields fall
    /// back to `defaults`.
    pub services: HashMap<String, PolicyOverride>,
}

/// Policy as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PolicySettings {
    /// Consecutive failures before opening.
    pub failure_threshold: u32,

    /// Seconds an open breaker waits before probing.
    pub recovery_timeout_secs: u64,

    /// Consecutive half-open successes before closing.
    pub success_threshold: u32,

    /// Requests observed before the breaker may trip.
    pub min_volume: u64,

    /// Concurrent probes admitted while half-open.
    pub half_open_max_probes: u32,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            failure_threshold: Policy::DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout_secs: Policy::DEFAULT_RECOVERY_TIMEOUT.as_secs(),
            success_threshold: Policy::DEFAULT_SUCCESS_THRESHOLD,
            min_volume: Policy::DEFAULT_MIN_VOLUME,
            half_open_max_probes: Policy::DEFAULT_HALF_OPEN_MAX_PROBES,
        }
    }
}

impl PolicySettings {
    pub fn to_policy(&self) -> Result<Policy, PolicyError> {
        Policy::builder()
            .failure_threshold(self.failure_threshold)
            .recovery_timeout(Duration::from_secs(self.recovery_timeout_secs))
            .success_threshold(self.success_threshold)
            .min_volume(self.min_volume)
            .half_open_max_probes(self.half_open_max_probes)
            .build()
    }

    /// Apply an override on top of these settings.
    pub fn merged(&self, over: &PolicyOverride) -> PolicySettings {
        PolicySettings {
            failure_threshold: over.failure_threshold.unwrap_or(self.failure_threshold),
            recovery_timeout_secs: over
                .recovery_timeout_secs
                .unwrap_or(self.recovery_timeout_secs),
            success_threshold: over.success_threshold.unwrap_or(self.success_threshold),
            min_volume: over.min_volume.unwrap_or(self.min_volume),
            half_open_max_probes: over
                .half_open_max_probes
                .unwrap_or(self.half_open_max_probes),
        }
    }
}

/// Partial policy for one service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PolicyOverride {
    pub failure_threshold: Option<u32>,
    pub recovery_timeout_secs: Option<u64>,
    pub success_threshold: Option<u32>,
    pub min_volume: Option<u64>,
    pub half_open_max_probes: Option<u32>,
}

impl BreakerSettings {
    /// Resolve the default policy and every override into validated policies.
    pub fn to_policies(&self) -> Result<(Policy, HashMap<String, Policy>), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let default = match self.defaults.to_policy() {
            Ok(policy) => Some(policy),
            Err(e) => {
                errors.push(ValidationError::new("breaker.defaults", e.to_string()));
                None
            }
        };

        let mut overrides = HashMap::new();
        for (name, over) in &self.services {
            match self.defaults.merged(over).to_policy() {
                Ok(policy) => {
                    overrides.insert(name.clone(), policy);
                }
                Err(e) => errors.push(ValidationError::new(
                    format!("breaker.services.{}", name),
                    e.to_string(),
                )),
            }
        }

        match default {
            Some(default) if errors.is_empty() => Ok((default, overrides)),
            _ => Err(errors),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
            request_timeout_secs: 10,
        }
    }
}
