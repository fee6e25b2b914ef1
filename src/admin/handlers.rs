use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::admin::AdminState;
use crate::resilience::{BreakerSnapshot, CircuitState};

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub breakers: usize,
    pub open: usize,
    pub half_open: usize,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub reset: Vec<String>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let snapshots = state.registry.all_snapshots();
    let count = |wanted: CircuitState| snapshots.values().filter(|s| s.state == wanted).count();
    let open = count(CircuitState::Open);

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if open == 0 { "operational" } else { "degraded" },
        breakers: snapshots.len(),
        open,
        half_open: count(CircuitState::HalfOpen),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub async fn list_breakers(
    State(state): State<AdminState>,
) -> Json<BTreeMap<String, BreakerSnapshot>> {
    Json(state.registry.all_snapshots())
}

pub async fn get_breaker(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<BreakerSnapshot>, StatusCode> {
    state
        .registry
        .snapshot(&name)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn reset_breaker(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<ResetResponse>, StatusCode> {
    if state.registry.reset(&name) {
        tracing::info!(circuit_breaker = %name, "Breaker reset via admin API");
        Ok(Json(ResetResponse { reset: vec![name] }))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

pub async fn reset_all(State(state): State<AdminState>) -> Json<ResetResponse> {
    state.registry.reset_all();
    Json(ResetResponse {
        reset: state.registry.names(),
    })
}
