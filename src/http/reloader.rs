//! Swappable application.
//!
//! The listener starts with a placeholder router serving probes only. Once
//! the job is built, the full router is mounted in one atomic pointer swap;
//! requests in flight keep the router they started with.

use std::convert::Infallible;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{extract::Request, response::Response, Router};
use tower::ServiceExt;

pub struct AppReloader {
    current: ArcSwap<Router>,
}

impl AppReloader {
    pub fn new(initial: Router) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Replace the served application.
    pub fn mount(&self, router: Router) {
        self.current.store(Arc::new(router));
        tracing::debug!("Application mounted");
    }

    pub fn current(&self) -> Router {
        Router::clone(&self.current.load())
    }

    /// A router that forwards every request to whatever is mounted.
    pub fn into_router(self: Arc<Self>) -> Router {
        Router::new().fallback(move |request: Request| {
            let app = self.current();
            async move {
                let response: Result<Response, Infallible> = app.oneshot(request).await;
                match response {
                    Ok(response) => response,
                    Err(never) => match never {},
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get};

    async fn status_of(router: &Router, uri: &str) -> StatusCode {
        router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn mount_swaps_routes() {
        let reloader = Arc::new(AppReloader::new(Router::new().route("/a", get(|| async { "a" }))));
        let app = Arc::clone(&reloader).into_router();

        assert_eq!(status_of(&app, "/a").await, StatusCode::OK);
        assert_eq!(status_of(&app, "/b").await, StatusCode::NOT_FOUND);

        reloader.mount(Router::new().route("/b", get(|| async { "b" })));
        assert_eq!(status_of(&app, "/a").await, StatusCode::NOT_FOUND);
        assert_eq!(status_of(&app, "/b").await, StatusCode::OK);
    }
}
