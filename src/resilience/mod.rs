//! Resilience subsystem: per-dependency circuit breakers.
//!
//! # Data Flow
//! ```text
//! Outbound call to dependency "svc":
//!     → registry.rs (get or create the breaker for "svc")
//!     → circuit_breaker.rs (admit or reject with OpenSignal)
//!     → work runs, outside the breaker lock
//!     → circuit_breaker.rs (record outcome, maybe transition)
//!     → stats.rs (counters, snapshot for the admin API)
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency name, never global
//! - Fail fast in Open state; no retries, backoff or fallback here
//! - Bounded probes in Half-Open (`half_open_max_probes`, default 1)
//! - Application errors are returned untouched

pub mod circuit_breaker;
pub mod error;
pub mod layer;
pub mod policy;
pub mod registry;
pub mod stats;

pub use circuit_breaker::{CircuitBreaker, CircuitState, Permit};
pub use error::{BreakerError, OpenSignal};
pub use layer::{CircuitBreakerLayer, CircuitBreakerService};
pub use policy::{Policy, PolicyBuilder, PolicyError};
pub use registry::BreakerRegistry;
pub use stats::{BreakerSnapshot, Stats};
