//! Breaker-owned counters and the read-only snapshot built from them.

use serde::{Serialize, Serializer};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::resilience::circuit_breaker::CircuitState;

/// Mutable request counters for one breaker.
///
/// Only the owning breaker mutates these, always under its lock. At most one
/// of the two streak counters is non-zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    total_requests: u64,
    failed_requests: u64,
    successful_requests: u64,
    consecutive_failures: u64,
    consecutive_successes: u64,
    last_failure_time: Option<SystemTime>,
}

impl Stats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Count an admitted call, before its work runs.
    pub(crate) fn record_dispatch(&mut self) {
        self.total_requests += 1;
    }

    pub(crate) fn record_success(&mut self) {
        self.successful_requests += 1;
        self.consecutive_successes += 1;
        self.consecutive_failures = 0;
    }

    /// Count a success without extending the success streak.
    pub(crate) fn record_success_outside_streak(&mut self) {
        self.successful_requests += 1;
    }

    pub(crate) fn record_failure(&mut self, at: SystemTime) {
        self.failed_requests += 1;
        self.consecutive_failures += 1;
        self.consecutive_successes = 0;
        self.last_failure_time = Some(at);
    }

    pub(crate) fn clear_streaks(&mut self) {
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn failed_requests(&self) -> u64 {
        self.failed_requests
    }

    pub fn successful_requests(&self) -> u64 {
        self.successful_requests
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures
    }

    pub fn consecutive_successes(&self) -> u64 {
        self.consecutive_successes
    }

    pub fn last_failure_time(&self) -> Option<SystemTime> {
        self.last_failure_time
    }

    /// Failed share of all requests as a percentage, rounded to 2 decimals.
    pub fn failure_rate_percent(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        let rate = self.failed_requests as f64 / self.total_requests as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

/// Point-in-time view of a breaker, as reported to dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub failure_rate_percent: f64,
    pub consecutive_failures: u64,
    pub consecutive_successes: u64,
    #[serde(rename = "last_failure_time_ms", serialize_with = "serialize_opt_unix_millis")]
    pub last_failure_time: Option<SystemTime>,
    #[serde(rename = "state_changed_at_ms", serialize_with = "serialize_unix_millis")]
    pub state_changed_at: SystemTime,
    #[serde(rename = "time_in_current_state_secs", serialize_with = "serialize_secs")]
    pub time_in_current_state: Duration,
    pub probes_in_flight: u32,
}

fn unix_millis(time: &SystemTime) -> u64 {
    let millis = time.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}

fn serialize_unix_millis<S: Serializer>(time: &SystemTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(unix_millis(time))
}

fn serialize_opt_unix_millis<S: Serializer>(
    time: &Option<SystemTime>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match time {
        Some(t) => s.serialize_some(&unix_millis(t)),
        None => s.serialize_none(),
    }
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
