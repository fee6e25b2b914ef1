//! Fail-fast rejection and the error type returned by guarded calls.

use std::time::Duration;
use thiserror::Error;

use crate::resilience::circuit_breaker::CircuitState;

/// Returned instead of dispatching when a breaker refuses a call.
///
/// Never carries an underlying cause: no work was invoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit breaker '{name}' is {state}, call rejected")]
pub struct OpenSignal {
    /// Dependency the breaker protects.
    pub name: String,
    /// `Open`, or `HalfOpen` when every probe slot is taken.
    pub state: CircuitState,
    /// Remaining recovery timeout, if the breaker is Open.
    pub retry_after: Option<Duration>,
}

/// Outcome of a guarded call that did not produce a value.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The breaker rejected the call; `work` was not invoked.
    #[error(transparent)]
    Open(OpenSignal),

    /// `work` ran and returned this error, unchanged.
    #[error(transparent)]
    Inner(E),
}

impl<E> BreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open(_))
    }

    pub fn open_signal(&self) -> Option<&OpenSignal> {
        match self {
            BreakerError::Open(signal) => Some(signal),
            BreakerError::Inner(_) => None,
        }
    }

    /// The application error produced by `work`, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            BreakerError::Open(_) => None,
            BreakerError::Inner(e) => Some(e),
        }
    }
}

impl<E> From<OpenSignal> for BreakerError<E> {
    fn from(signal: OpenSignal) -> Self {
        BreakerError::Open(signal)
    }
}
