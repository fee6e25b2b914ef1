//! Tower middleware that guards an inner service with a circuit breaker.
//!
//! Lets a gateway wrap its outbound client stack once instead of calling
//! [`CircuitBreaker::call`] around every request by hand.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::error::BreakerError;

/// Applies [`CircuitBreakerService`] to inner services.
#[derive(Debug, Clone)]
pub struct CircuitBreakerLayer {
    breaker: Arc<CircuitBreaker>,
}

impl CircuitBreakerLayer {
    pub fn new(breaker: Arc<CircuitBreaker>) -> Self {
        Self { breaker }
    }
}

impl<S> Layer<S> for CircuitBreakerLayer {
    type Service = CircuitBreakerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CircuitBreakerService {
            inner,
            breaker: self.breaker.clone(),
        }
    }
}

/// Service wrapper produced by [`CircuitBreakerLayer`].
///
/// Every request is dispatched through the breaker; an error from the inner
/// service is recorded as a failure and returned as [`BreakerError::Inner`].
#[derive(Debug, Clone)]
pub struct CircuitBreakerService<S> {
    inner: S,
    breaker: Arc<CircuitBreaker>,
}

impl<S> CircuitBreakerService<S> {
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

impl<S, Req> Service<Req> for CircuitBreakerService<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = BreakerError<S::Error>;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(BreakerError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        // Use the instance that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let breaker = self.breaker.clone();

        Box::pin(async move { breaker.call(move || inner.call(req)).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::policy::Policy;
    use tower::{service_fn, ServiceExt};

    #[derive(Debug, PartialEq)]
    struct Upstream503;

    #[tokio::test]
    async fn test_layer_guards_inner_service() {
        let policy = Policy::builder()
            .failure_threshold(1)
            .min_volume(0)
            .build()
            .unwrap();
        let breaker = Arc::new(CircuitBreaker::new("flights", policy));
        let svc = CircuitBreakerLayer::new(breaker.clone()).layer(service_fn(|req: u32| async move {
            if req == 0 {
                Err(Upstream503)
            } else {
                Ok(req * 2)
            }
        }));

        assert_eq!(svc.clone().oneshot(2).await.unwrap(), 4);

        let err = svc.clone().oneshot(0).await.unwrap_err();
        assert!(matches!(err, BreakerError::Inner(Upstream503)));

        let err = svc.clone().oneshot(3).await.unwrap_err();
        assert!(err.is_open());

        let snapshot = breaker.snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.failed_requests, 1);
    }
}
