//! Admin API exposing breaker health to dashboards and operators.
//!
//! ```text
//! GET  /admin/status                 summary (counts of open/half-open)
//! GET  /admin/breakers               every snapshot, keyed by name
//! GET  /admin/breakers/{name}        one snapshot (404 if unknown)
//! POST /admin/breakers/{name}/reset  reset one breaker (404 if unknown)
//! POST /admin/reset                  reset every breaker
//! ```
//!
//! All routes require `Authorization: Bearer <api_key>`.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::config::AdminConfig;
use crate::resilience::BreakerRegistry;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<BreakerRegistry>,
    pub api_key: Arc<str>,
    pub started_at: Instant,
}

#[allow(deprecated)]
pub fn setup_admin_router(state: AdminState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/breakers", get(list_breakers))
        .route("/admin/breakers/{name}", get(get_breaker))
        .route("/admin/breakers/{name}/reset", post(reset_breaker))
        .route("/admin/reset", post(reset_all))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server for the admin API.
pub struct AdminServer {
    router: Router,
}

impl AdminServer {
    pub fn new(registry: Arc<BreakerRegistry>, config: &AdminConfig) -> Self {
        let state = AdminState {
            registry,
            api_key: Arc::from(config.api_key.as_str()),
            started_at: Instant::now(),
        };
        let router = setup_admin_router(state, Duration::from_secs(config.request_timeout_secs));
        Self { router }
    }

    /// Router without a listener, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Admin API starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Admin API stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn server() -> (Arc<BreakerRegistry>, Router) {
        let registry = Arc::new(BreakerRegistry::default());
        let mut config = AdminConfig::default();
        config.api_key = "test-key".into();
        let server = AdminServer::new(registry.clone(), &config);
        (registry, server.router())
    }

    #[tokio::test]
    async fn test_requires_bearer_token() {
        let (_, router) = server();
        let res = router
            .oneshot(Request::get("/admin/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_breaker_is_404() {
        let (registry, router) = server();
        registry.get("known");
        let res = router
            .oneshot(
                Request::get("/admin/breakers/unknown")
                    .header("authorization", "Bearer test-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(registry.len(), 1);
    }
}
