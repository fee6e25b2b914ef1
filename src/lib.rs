//! Per-dependency circuit breakers for an API gateway.
//!
//! The gateway resolves a breaker by downstream service name and routes each
//! outbound call through it:
//!
//! ```no_run
//! use gateway_breaker::resilience::{BreakerError, BreakerRegistry, Policy};
//!
//! # async fn example() {
//! let registry = BreakerRegistry::new(Policy::default());
//! let breaker = registry.get("hotel-service");
//!
//! match breaker.call(|| async { Ok::<_, std::io::Error>("200 OK") }).await {
//!     Ok(body) => println!("{}", body),
//!     Err(BreakerError::Open(signal)) => println!("503: {}", signal),
//!     Err(BreakerError::Inner(e)) => println!("502: {}", e),
//! }
//! # }
//! ```

pub mod admin;
pub mod config;
pub mod observability;
pub mod resilience;

pub use config::schema::GatewayConfig;
pub use resilience::{BreakerError, BreakerRegistry, CircuitBreaker, CircuitState, OpenSignal, Policy};
