//! HTTP server setup.
//!
//! # Responsibilities
//! - Serve probes and metrics from the first moment the listener is up
//! - Build the job router (root and `/api/v1`), the endpoint catalog and the
//!   profiler routes once the job exists
//! - Wire up middleware (tracing, request ID, body limit, access log)
//! - Run until the shutdown signal, then stop the profiler

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::WrapperConfig;
use crate::health::{health_router, HealthContext, HealthState};
use crate::http::reloader::AppReloader;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::job::{EndpointRegistry, JobEntrypoint, RegistryError, API_PREFIX};
use crate::lifecycle::startup::ServeError;
use crate::manifest::{load_manifest, Manifest};
use crate::observability::{access_log::access_log_middleware, metrics};
use crate::profiler::{profiler_router, MemoryProfiler};

/// HTTP server wrapping one job.
///
/// Cheap to clone; clones share health, profiler and the mounted app.
#[derive(Clone)]
pub struct JobServer {
    config: Arc<WrapperConfig>,
    health: Arc<HealthState>,
    manifest: Option<Arc<Manifest>>,
    profiler: Arc<MemoryProfiler>,
    reloader: Arc<AppReloader>,
}

impl JobServer {
    /// Create a server, loading the manifest named in `config`.
    ///
    /// A missing manifest is tolerated; an invalid one is an error.
    pub fn new(config: WrapperConfig, health: Arc<HealthState>) -> Result<Self, ServeError> {
        let manifest = load_manifest(Path::new(&config.manifest.path))?;
        Ok(Self::with_manifest(config, health, manifest))
    }

    pub fn with_manifest(
        config: WrapperConfig,
        health: Arc<HealthState>,
        manifest: Option<Manifest>,
    ) -> Self {
        let profiler = Arc::new(MemoryProfiler::new(config.profiler.clone()));
        let mut server = Self {
            config: Arc::new(config),
            health,
            manifest: manifest.map(Arc::new),
            profiler,
            reloader: Arc::new(AppReloader::new(Router::new())),
        };
        server.reloader = Arc::new(AppReloader::new(server.placeholder_router()));
        server
    }

    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    pub fn health(&self) -> &Arc<HealthState> {
        &self.health
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_deref()
    }

    pub fn profiler(&self) -> &Arc<MemoryProfiler> {
        &self.profiler
    }

    /// Probes plus metrics; present in every mounted app.
    fn base_router(&self) -> Router {
        let router = health_router(HealthContext {
            state: Arc::clone(&self.health),
            manifest: self.manifest.clone(),
        });
        if self.config.observability.metrics_enabled {
            metrics::prometheus_handle();
            router.route("/metrics", get(metrics::metrics_handler))
        } else {
            router
        }
    }

    /// App served while the job is being built.
    fn placeholder_router(&self) -> Router {
        self.base_router().fallback(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "job is not ready yet" })),
            )
        })
    }

    /// Full app for `job`.
    pub fn job_router<J: JobEntrypoint + ?Sized>(&self, job: Arc<J>) -> Result<Router, RegistryError> {
        let registry = EndpointRegistry::from_job(job)?;
        let api = registry.router()?;

        let catalog = Arc::new(registry.catalog());
        let mut versioned = api.clone().route(
            "/endpoints",
            get(move || {
                let catalog = Arc::clone(&catalog);
                async move { Json(catalog.as_ref().clone()) }
            }),
        );
        if self.profiler.is_enabled() {
            versioned = versioned.merge(profiler_router(Arc::clone(&self.profiler)));
        }

        tracing::info!(
            endpoints = registry.endpoints().len(),
            static_endpoints = registry.static_endpoints().len(),
            "Job routes built"
        );
        Ok(self.base_router().merge(api).nest(API_PREFIX, versioned))
    }

    /// Build the job router and swap it in.
    pub fn mount_job<J: JobEntrypoint + ?Sized>(&self, job: Arc<J>) -> Result<(), RegistryError> {
        let router = self.job_router(job)?;
        self.reloader.mount(router);
        Ok(())
    }

    /// The served application with all middleware applied.
    pub fn router(&self) -> Router {
        let mut app = Arc::clone(&self.reloader).into_router();
        if self.config.observability.access_log {
            app = app.layer(middleware::from_fn(access_log_middleware));
        }
        app.layer(DefaultBodyLimit::max(self.config.listener.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        &self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        self.profiler.stop();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
