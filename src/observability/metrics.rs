//! Metrics collection and exposition.
//!
//! # Metrics
//! - `breaker_calls_total` (counter): completed guarded calls by breaker, outcome
//! - `breaker_rejections_total` (counter): fail-fast rejections by breaker
//! - `breaker_transitions_total` (counter): state changes by breaker, from, to
//! - `breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `breaker_registry_size` (gauge): number of registered breakers
//!
//! Recording is a no-op until [`init_metrics`] installs an exporter.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::CircuitState;

/// Install the Prometheus exporter with an HTTP scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_call(breaker: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!(
        "breaker_calls_total",
        "breaker" => breaker.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_rejection(breaker: &str) {
    ::metrics::counter!("breaker_rejections_total", "breaker" => breaker.to_string()).increment(1);
}

pub fn record_transition(breaker: &str, from: CircuitState, to: CircuitState) {
    ::metrics::counter!(
        "breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    record_state(breaker, to);
}

pub fn record_state(breaker: &str, state: CircuitState) {
    ::metrics::gauge!("breaker_state", "breaker" => breaker.to_string()).set(state_value(state));
}

pub fn record_registry_size(size: usize) {
    ::metrics::gauge!("breaker_registry_size").set(size as f64);
}

fn state_value(state: CircuitState) -> f64 {
    match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_values_ordered_by_severity() {
        assert!(state_value(CircuitState::Closed) < state_value(CircuitState::HalfOpen));
        assert!(state_value(CircuitState::HalfOpen) < state_value(CircuitState::Open));
    }

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_call("svc", true);
        record_rejection("svc");
        record_transition("svc", CircuitState::Closed, CircuitState::Open);
        record_registry_size(1);
    }
}
