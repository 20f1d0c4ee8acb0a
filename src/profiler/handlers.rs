//! Profiler artifact endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::profiler::{MemoryProfiler, ProfilerError};

/// Routes under `/profiler`: `report`, `timeline` and `stats`.
pub fn profiler_router(profiler: Arc<MemoryProfiler>) -> Router {
    Router::new()
        .route("/profiler/report", get(report))
        .route("/profiler/timeline", get(timeline))
        .route("/profiler/stats", get(stats))
        .with_state(profiler)
}

async fn report(State(profiler): State<Arc<MemoryProfiler>>) -> Response {
    match profiler.get_report_bytes() {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/octet-stream"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"memory-report.bin\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn timeline(State(profiler): State<Arc<MemoryProfiler>>) -> Response {
    match tokio::task::spawn_blocking(move || profiler.get_timeline_html()).await {
        Ok(Ok(html)) => ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response(),
        Ok(Err(e)) => error_response(e),
        Err(e) => {
            tracing::error!(error = %e, "Timeline rendering panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn stats(State(profiler): State<Arc<MemoryProfiler>>) -> Response {
    match profiler.get_stats_output() {
        Ok(text) => text.into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(e: ProfilerError) -> Response {
    tracing::warn!(error = %e, "Profiler request failed");
    (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
}
