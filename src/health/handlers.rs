//! Liveness, readiness and health probe endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::health::state::HealthState;
use crate::manifest::Manifest;

/// State shared by the probe handlers.
#[derive(Clone)]
pub struct HealthContext {
    pub state: Arc<HealthState>,
    pub manifest: Option<Arc<Manifest>>,
}

#[derive(Debug, Serialize)]
pub struct LiveResponse {
    pub live: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub service: &'static str,
    pub job_name: Option<String>,
    pub job_version: Option<String>,
    pub status: &'static str,
    pub started_at: DateTime<Utc>,
    pub wrapper_version: &'static str,
}

/// Router serving `/live`, `/ready` and `/health`.
pub fn health_router(ctx: HealthContext) -> Router {
    Router::new()
        .route("/live", get(live))
        .route("/ready", get(ready))
        .route("/health", get(health))
        .with_state(ctx)
}

pub async fn live(State(ctx): State<HealthContext>) -> (StatusCode, Json<LiveResponse>) {
    let status = ctx.state.status();
    let code = if status.is_live() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        code,
        Json(LiveResponse {
            live: status.is_live(),
            status: status.as_str(),
            error: status.error().map(str::to_string),
        }),
    )
}

pub async fn ready(State(ctx): State<HealthContext>) -> (StatusCode, Json<ReadyResponse>) {
    let status = ctx.state.status();
    let code = if status.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        code,
        Json(ReadyResponse {
            ready: status.is_ready(),
            status: status.as_str(),
            error: status.error().map(str::to_string),
        }),
    )
}

pub async fn health(State(ctx): State<HealthContext>) -> Json<HealthReport> {
    let status = ctx.state.status();
    Json(HealthReport {
        service: "job",
        job_name: ctx.manifest.as_ref().map(|m| m.name.clone()),
        job_version: ctx.manifest.as_ref().map(|m| m.version.clone()),
        status: if status.is_ready() { "pass" } else { "fail" },
        started_at: ctx.state.started_at(),
        wrapper_version: env!("CARGO_PKG_VERSION"),
    })
}
