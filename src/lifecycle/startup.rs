//! Startup orchestration.
//!
//! # Sequence
//! ```text
//! serve_job_class:
//!     manifest → bind → profiler → LiveNotReady → spawn "job-init" → serve
//!                                                    └─ build job → mount → LiveReady
//!                                                       (error or panic → LiveError)
//! serve_job_instance:
//!     manifest → bind → profiler → mount → LiveReady → serve
//! ```
//!
//! Manifest, bind and route registration errors of an already built job are
//! fatal. Failures while building the job never are: they are kept in the
//! health state for the orchestrator to see.

use std::any::Any;
use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, WrapperConfig};
use crate::health::HealthState;
use crate::http::JobServer;
use crate::job::{JobEntrypoint, RegistryError};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::manifest::ManifestError;

/// Boxed error returned by job factories.
pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("endpoint registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serve a job built on a background thread.
///
/// Probes are answered while `factory` runs: live but not ready, then ready
/// once the job routes are mounted, or live with the error if building
/// failed. Blocks until shutdown.
pub async fn serve_job_class<J, F>(config: WrapperConfig, factory: F) -> Result<(), ServeError>
where
    J: JobEntrypoint,
    F: FnOnce() -> Result<J, BoxError> + Send + 'static,
{
    let server = JobServer::new(config, Arc::new(HealthState::new()))?;
    let listener = bind(&server).await?;

    server.health().set_live();
    spawn_late_init(server.clone(), factory)?;

    run(&server, listener).await
}

/// Serve a job that already exists. The server is ready from the start.
pub async fn serve_job_instance<J>(config: WrapperConfig, job: Arc<J>) -> Result<(), ServeError>
where
    J: JobEntrypoint + ?Sized,
{
    let server = JobServer::new(config, Arc::new(HealthState::ready()))?;
    server.mount_job(job)?;
    let listener = bind(&server).await?;

    run(&server, listener).await
}

async fn bind(server: &JobServer) -> Result<TcpListener, ServeError> {
    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    if let Err(e) = server.profiler().start() {
        tracing::warn!(error = %e, "Memory profiler failed to start");
    }
    Ok(listener)
}

async fn run(server: &JobServer, listener: TcpListener) -> Result<(), ServeError> {
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    server.run(listener, receiver).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Build the job on a dedicated thread named `job-init`.
pub fn spawn_late_init<J, F>(server: JobServer, factory: F) -> std::io::Result<JoinHandle<()>>
where
    J: JobEntrypoint,
    F: FnOnce() -> Result<J, BoxError> + Send + 'static,
{
    thread::Builder::new()
        .name("job-init".into())
        .spawn(move || late_init(&server, factory))
}

/// Build the job, mount it and record the outcome in the health state.
pub fn late_init<J, F>(server: &JobServer, factory: F)
where
    J: JobEntrypoint,
    F: FnOnce() -> Result<J, BoxError>,
{
    tracing::debug!("Creating a job instance");
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), String> {
        let job = factory().map_err(|e| e.to_string())?;
        tracing::info!("Job instance created");
        server.mount_job(Arc::new(job)).map_err(|e| e.to_string())
    }));

    let error = match outcome {
        Ok(Ok(())) => {
            server.health().set_ready();
            tracing::info!("Server is ready");
            return;
        }
        Ok(Err(message)) => message,
        Err(payload) => format!("job panicked: {}", panic_message(&*payload)),
    };

    tracing::error!(error = %error, "Initialization error");
    server.health().set_error(error);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_readable() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*payload), "bang");

        let payload: Box<dyn Any + Send> = Box::new(7);
        assert_eq!(panic_message(&*payload), "unknown panic");
    }
}
