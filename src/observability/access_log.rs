//! Per-request access log.
//!
//! Successful probe and scrape requests are not logged; orchestrators hit
//! them every few seconds.

use std::time::Instant;

use axum::{
    body::Body,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};

use crate::http::request::X_REQUEST_ID;

const QUIET_PATHS: &[&str] = &["/live", "/ready", "/health", "/metrics"];

pub async fn access_log_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(req).await;
    let status = response.status();

    if !is_quiet(&method, &path, status.as_u16()) {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "access"
        );
    }

    response
}

fn is_quiet(method: &Method, path: &str, status: u16) -> bool {
    if method != Method::GET || status != 200 {
        return false;
    }
    let trimmed = match path.strip_suffix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => path,
    };
    QUIET_PATHS.contains(&trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_are_quiet_only_when_successful() {
        assert!(is_quiet(&Method::GET, "/live", 200));
        assert!(is_quiet(&Method::GET, "/ready/", 200));
        assert!(is_quiet(&Method::GET, "/metrics", 200));
        assert!(!is_quiet(&Method::GET, "/ready", 503));
        assert!(!is_quiet(&Method::POST, "/health", 200));
        assert!(!is_quiet(&Method::GET, "/perform", 200));
        assert!(!is_quiet(&Method::GET, "/", 200));
    }
}
