//! Circuit breaker for downstream service protection.
//!
//! # States
//! - Closed: dependency presumed healthy, calls are dispatched
//! - Open: dependency presumed down, calls fail fast with [`OpenSignal`]
//! - Half-Open: recovery window, a bounded number of probes are dispatched
//!
//! # State Transitions
//! ```text
//! Closed → Open:     consecutive_failures >= failure_threshold
//!                    AND total_requests >= min_volume
//! Open → Half-Open:  recovery_timeout elapsed since the Open transition
//! Half-Open → Closed: consecutive probe successes >= success_threshold
//! Half-Open → Open:  any recorded failure
//! ```
//!
//! # Locking
//! Transitions are evaluated lazily, right before admission, and again when
//! an outcome is recorded. The lock is held for admission and for recording
//! only; the guarded work runs unlocked, so one hanging dependency call does
//! not serialize every other caller of the same breaker.
//!
//! Admission hands out a [`Permit`]. A permit dropped without an outcome
//! (the caller's future was cancelled or timed out) counts as a failure.

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::resilience::error::{BreakerError, OpenSignal};
use crate::resilience::policy::Policy;
use crate::resilience::stats::{BreakerSnapshot, Stats};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    stats: Stats,
    state_changed_at: Instant,
    state_changed_wall: SystemTime,
    /// Bumped on every transition. Probe permits belong to one epoch.
    epoch: u64,
    /// Bumped on reset. Outcomes from an older generation are dropped.
    generation: u64,
    probes_in_flight: u32,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            stats: Stats::new(),
            state_changed_at: Instant::now(),
            state_changed_wall: SystemTime::now(),
            epoch: 0,
            generation: 0,
            probes_in_flight: 0,
        }
    }
}

/// Per-dependency circuit breaker.
///
/// Share it behind an `Arc`; the registry hands out `Arc<CircuitBreaker>`.
pub struct CircuitBreaker {
    name: String,
    policy: Policy,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a Closed breaker with zeroed stats.
    pub fn new(name: impl Into<String>, policy: Policy) -> Self {
        let name = name.into();
        metrics::record_state(&name, CircuitState::Closed);
        Self {
            name,
            policy,
            inner: Mutex::new(Inner::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Stored state. An idle Open breaker stays Open here until a call
    /// arrives and finds the recovery timeout elapsed.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Copy of the current counters.
    pub fn stats(&self) -> Stats {
        self.lock().stats.clone()
    }

    /// Run `work` if the breaker admits it, recording the outcome.
    ///
    /// `work` is invoked at most once, and never while the breaker is Open.
    /// Errors from `work` are returned unchanged as [`BreakerError::Inner`].
    pub async fn call<F, Fut, T, E>(&self, work: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = self.acquire()?;
        match work().await {
            Ok(value) => {
                permit.complete(true);
                Ok(value)
            }
            Err(err) => {
                permit.complete(false);
                Err(BreakerError::Inner(err))
            }
        }
    }

    /// Synchronous variant of [`CircuitBreaker::call`].
    pub fn call_blocking<F, T, E>(&self, work: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let permit = self.acquire()?;
        match work() {
            Ok(value) => {
                permit.complete(true);
                Ok(value)
            }
            Err(err) => {
                permit.complete(false);
                Err(BreakerError::Inner(err))
            }
        }
    }

    /// Admission phase. Evaluates pending transitions and either hands out a
    /// permit or rejects with [`OpenSignal`].
    ///
    /// Callers that cannot express their work as a closure can drive the
    /// permit themselves; see [`Permit::complete`].
    pub fn acquire(&self) -> Result<Permit<'_>, OpenSignal> {
        let now = Instant::now();
        let mut inner = self.lock();
        self.evaluate(&mut inner, now);

        let state = inner.state;
        let probe = match state {
            CircuitState::Closed => false,
            CircuitState::Open => {
                let elapsed = now.saturating_duration_since(inner.state_changed_at);
                let retry_after = self.policy.recovery_timeout().saturating_sub(elapsed);
                drop(inner);
                return Err(self.reject(CircuitState::Open, Some(retry_after)));
            }
            CircuitState::HalfOpen => {
                if inner.probes_in_flight >= self.policy.half_open_max_probes() {
                    drop(inner);
                    return Err(self.reject(CircuitState::HalfOpen, None));
                }
                inner.probes_in_flight += 1;
                true
            }
        };

        inner.stats.record_dispatch();
        Ok(Permit {
            breaker: self,
            generation: inner.generation,
            epoch: inner.epoch,
            probe,
            settled: false,
        })
    }

    /// Read-only view of state and counters. Does not evaluate transitions.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let now = Instant::now();
        let inner = self.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            total_requests: inner.stats.total_requests(),
            successful_requests: inner.stats.successful_requests(),
            failed_requests: inner.stats.failed_requests(),
            failure_rate_percent: inner.stats.failure_rate_percent(),
            consecutive_failures: inner.stats.consecutive_failures(),
            consecutive_successes: inner.stats.consecutive_successes(),
            last_failure_time: inner.stats.last_failure_time(),
            state_changed_at: inner.state_changed_wall,
            time_in_current_state: now.saturating_duration_since(inner.state_changed_at),
            probes_in_flight: inner.probes_in_flight,
        }
    }

    /// Return to Closed with fresh stats, whatever the current state.
    ///
    /// Calls still in flight from before the reset are not recorded.
    pub fn reset(&self) {
        let mut inner = self.lock();
        let from = inner.state;
        inner.state = CircuitState::Closed;
        inner.stats = Stats::new();
        inner.state_changed_at = Instant::now();
        inner.state_changed_wall = SystemTime::now();
        inner.epoch += 1;
        inner.generation += 1;
        inner.probes_in_flight = 0;
        drop(inner);

        metrics::record_state(&self.name, CircuitState::Closed);
        tracing::info!(
            circuit_breaker = %self.name,
            from = %from,
            "Circuit breaker reset to closed"
        );
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner holds plain counters; a panic elsewhere cannot leave it torn.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reject(&self, state: CircuitState, retry_after: Option<std::time::Duration>) -> OpenSignal {
        metrics::record_rejection(&self.name);
        tracing::debug!(
            circuit_breaker = %self.name,
            state = %state,
            retry_after = ?retry_after,
            "Call rejected"
        );
        OpenSignal {
            name: self.name.clone(),
            state,
            retry_after,
        }
    }

    fn should_trip(&self, stats: &Stats) -> bool {
        stats.consecutive_failures() >= u64::from(self.policy.failure_threshold())
            && stats.total_requests() >= self.policy.min_volume()
    }

    /// Time- and volume-driven transitions: Closed → Open, Open → HalfOpen.
    fn evaluate(&self, inner: &mut Inner, now: Instant) {
        let state = inner.state;
        match state {
            CircuitState::Closed => {
                if self.should_trip(&inner.stats) {
                    self.transition(inner, CircuitState::Open, now);
                }
            }
            CircuitState::Open => {
                let elapsed = now.saturating_duration_since(inner.state_changed_at);
                if elapsed >= self.policy.recovery_timeout() {
                    self.transition(inner, CircuitState::HalfOpen, now);
                }
            }
            CircuitState::HalfOpen => {}
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState, now: Instant) {
        let from = inner.state;
        inner.state = to;
        inner.state_changed_at = now;
        inner.state_changed_wall = SystemTime::now();
        inner.epoch += 1;
        inner.probes_in_flight = 0;
        if to != CircuitState::Open {
            inner.stats.clear_streaks();
        }

        metrics::record_transition(&self.name, from, to);
        if to == CircuitState::Open {
            tracing::warn!(
                circuit_breaker = %self.name,
                from = %from,
                to = %to,
                consecutive_failures = inner.stats.consecutive_failures(),
                total_requests = inner.stats.total_requests(),
                "Circuit breaker opened"
            );
        } else {
            tracing::info!(
                circuit_breaker = %self.name,
                from = %from,
                to = %to,
                "Circuit breaker state changed"
            );
        }
    }

    /// Recording phase for one admitted call.
    fn settle(&self, permit: &Permit<'_>, success: bool) {
        let now = Instant::now();
        let mut inner = self.lock();
        if inner.generation != permit.generation {
            tracing::debug!(
                circuit_breaker = %self.name,
                "Discarding outcome of call admitted before reset"
            );
            return;
        }

        let current_probe = permit.probe && inner.epoch == permit.epoch;
        if current_probe {
            inner.probes_in_flight = inner.probes_in_flight.saturating_sub(1);
        }

        if success {
            if inner.state == CircuitState::HalfOpen && !current_probe {
                // Admitted before this half-open window; cannot vote to close.
                inner.stats.record_success_outside_streak();
            } else {
                inner.stats.record_success();
                if inner.state == CircuitState::HalfOpen
                    && inner.stats.consecutive_successes()
                        >= u64::from(self.policy.success_threshold())
                {
                    self.transition(&mut inner, CircuitState::Closed, now);
                }
            }
        } else {
            inner.stats.record_failure(SystemTime::now());
            let state = inner.state;
            match state {
                CircuitState::HalfOpen => self.transition(&mut inner, CircuitState::Open, now),
                CircuitState::Closed => self.evaluate(&mut inner, now),
                CircuitState::Open => {}
            }
        }
        drop(inner);

        metrics::record_call(&self.name, success);
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &inner.state)
            .field("stats", &inner.stats)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Admission granted by [`CircuitBreaker::acquire`].
///
/// Report the outcome with [`Permit::complete`]. Dropping the permit
/// without doing so records a failure.
#[must_use = "dropping a permit records a failure"]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    epoch: u64,
    probe: bool,
    settled: bool,
}

impl Permit<'_> {
    /// Whether this call was admitted as a half-open probe.
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn complete(mut self, success: bool) {
        self.settled = true;
        self.breaker.settle(&self, success);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!(
                circuit_breaker = %self.breaker.name,
                "Guarded call abandoned before completion, recording failure"
            );
            self.settled = true;
            self.breaker.settle(self, false);
        }
    }
}
