//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breakers and registry produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Admin API (snapshots, see admin/)
//! ```
//!
//! # Design Decisions
//! - Structured fields keyed by `circuit_breaker` name
//! - Metrics are cheap (atomic increments) and safe to call before an
//!   exporter is installed

pub mod logging;
pub mod metrics;
