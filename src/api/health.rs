//! Health check endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed readiness response
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: ReadinessChecks,
}

/// Configured backend per capability
#[derive(Serialize)]
pub struct ReadinessChecks {
    pub transcription: CheckResult,
    pub completion: CheckResult,
    pub synthesis: CheckResult,
}

/// Result of a single readiness check
#[derive(Serialize)]
pub struct CheckResult {
    pub status: &'static str,
    pub backend: &'static str,
}

impl CheckResult {
    const fn ok(backend: &'static str) -> Self {
        Self {
            status: "ok",
            backend,
        }
    }
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe - which provider backends are wired up?
///
/// Providers are constructed at startup, so readiness reports configuration
/// rather than live provider reachability; a probe per request against paid
/// APIs would burn quota.
async fn ready(State(state): State<Arc<ApiState>>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ok",
        checks: ReadinessChecks {
            transcription: CheckResult::ok(state.stt.name()),
            completion: CheckResult::ok(state.llm.name()),
            synthesis: CheckResult::ok(state.tts.name()),
        },
    })
}

/// Build health router (liveness only, no state needed)
#[must_use]
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Build readiness router (needs state for backend names)
#[must_use]
pub fn ready_router(state: Arc<ApiState>) -> Router {
    Router::new().route("/ready", get(ready)).with_state(state)
}
