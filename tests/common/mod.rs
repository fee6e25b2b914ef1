//! Shared utilities for integration tests.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use gateway_breaker::admin::AdminServer;
use gateway_breaker::config::AdminConfig;
use gateway_breaker::{BreakerError, BreakerRegistry, CircuitBreaker, Policy};

/// Error returned by failing test work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamError {
    pub code: u16,
}

impl fmt::Display for DownstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "downstream returned {}", self.code)
    }
}

impl std::error::Error for DownstreamError {}

/// Counts how many times guarded work actually ran.
#[derive(Debug, Clone, Default)]
pub struct Invocations(Arc<AtomicU32>);

impl Invocations {
    pub fn count(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[allow(dead_code)]
pub async fn succeed(cb: &CircuitBreaker, calls: &Invocations) -> Result<(), BreakerError<DownstreamError>> {
    cb.call(|| async {
        calls.bump();
        Ok(())
    })
    .await
}

#[allow(dead_code)]
pub async fn fail(cb: &CircuitBreaker, calls: &Invocations) -> Result<(), BreakerError<DownstreamError>> {
    cb.call(|| async {
        calls.bump();
        Err(DownstreamError { code: 503 })
    })
    .await
}

#[allow(dead_code)]
pub fn policy(
    failure_threshold: u32,
    recovery_timeout: Duration,
    success_threshold: u32,
    min_volume: u64,
) -> Policy {
    Policy::new(failure_threshold, recovery_timeout, success_threshold, min_volume)
        .expect("test policy must be valid")
}

/// Start the admin API on an ephemeral port.
///
/// Dropping the returned sender shuts the server down.
#[allow(dead_code)]
pub async fn start_admin(
    registry: Arc<BreakerRegistry>,
    api_key: &str,
) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = AdminConfig::default();
    config.api_key = api_key.to_string();
    let server = AdminServer::new(registry, &config);

    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = server
            .run(listener, async move {
                let _ = rx.await;
            })
            .await;
    });

    (addr, tx)
}
