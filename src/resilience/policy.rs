//! Per-dependency breaker policy.
//!
//! A `Policy` is validated once, at construction, and never changes for the
//! lifetime of the breaker that owns it. Zero thresholds are rejected here
//! instead of producing a breaker that trips on its first request.

use std::time::Duration;
use thiserror::Error;

/// Errors produced when a policy is constructed with unusable values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("failure_threshold must be at least 1")]
    ZeroFailureThreshold,

    #[error("success_threshold must be at least 1")]
    ZeroSuccessThreshold,

    #[error("recovery_timeout must be greater than zero")]
    ZeroRecoveryTimeout,

    #[error("half_open_max_probes must be at least 1")]
    ZeroProbeLimit,
}

/// Immutable breaker configuration for one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    failure_threshold: u32,
    recovery_timeout: Duration,
    success_threshold: u32,
    min_volume: u64,
    half_open_max_probes: u32,
}

impl Policy {
    pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
    pub const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 3;
    pub const DEFAULT_MIN_VOLUME: u64 = 10;
    pub const DEFAULT_HALF_OPEN_MAX_PROBES: u32 = 1;

    /// Create a validated policy with a single half-open probe slot.
    pub fn new(
        failure_threshold: u32,
        recovery_timeout: Duration,
        success_threshold: u32,
        min_volume: u64,
    ) -> Result<Self, PolicyError> {
        Self::builder()
            .failure_threshold(failure_threshold)
            .recovery_timeout(recovery_timeout)
            .success_threshold(success_threshold)
            .min_volume(min_volume)
            .build()
    }

    /// Start from the defaults and override selectively.
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// Consecutive failures required to trip Closed → Open.
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Time an Open breaker waits before admitting a probe.
    pub fn recovery_timeout(&self) -> Duration {
        self.recovery_timeout
    }

    /// Consecutive probe successes required to close from HalfOpen.
    pub fn success_threshold(&self) -> u32 {
        self.success_threshold
    }

    /// Total requests that must be observed before the breaker may trip.
    pub fn min_volume(&self) -> u64 {
        self.min_volume
    }

    /// Maximum concurrently admitted calls while HalfOpen.
    pub fn half_open_max_probes(&self) -> u32 {
        self.half_open_max_probes
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            failure_threshold: Self::DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: Self::DEFAULT_RECOVERY_TIMEOUT,
            success_threshold: Self::DEFAULT_SUCCESS_THRESHOLD,
            min_volume: Self::DEFAULT_MIN_VOLUME,
            half_open_max_probes: Self::DEFAULT_HALF_OPEN_MAX_PROBES,
        }
    }
}

/// Builder for [`Policy`]; validation happens in [`PolicyBuilder::build`].
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    inner: Policy,
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self {
            inner: Policy::default(),
        }
    }
}

impl PolicyBuilder {
    pub fn failure_threshold(mut self, value: u32) -> Self {
        self.inner.failure_threshold = value;
        self
    }

    pub fn recovery_timeout(mut self, value: Duration) -> Self {
        self.inner.recovery_timeout = value;
        self
    }

    pub fn success_threshold(mut self, value: u32) -> Self {
        self.inner.success_threshold = value;
        self
    }

    pub fn min_volume(mut self, value: u64) -> Self {
        self.inner.min_volume = value;
        self
    }

    pub fn half_open_max_probes(mut self, value: u32) -> Self {
        self.inner.half_open_max_probes = value;
        self
    }

    pub fn build(self) -> Result<Policy, PolicyError> {
        let policy = self.inner;
        if policy.failure_threshold == 0 {
            return Err(PolicyError::ZeroFailureThreshold);
        }
        if policy.success_threshold == 0 {
            return Err(PolicyError::ZeroSuccessThreshold);
        }
        if policy.recovery_timeout.is_zero() {
            return Err(PolicyError::ZeroRecoveryTimeout);
        }
        if policy.half_open_max_probes == 0 {
            return Err(PolicyError::ZeroProbeLimit);
        }
        Ok(policy)
    }
}
