//! Job wrapper
//!
//! Serves a job as an HTTP API.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                     JOB WRAPPER                      │
//!                    │                                                      │
//!   Client Request   │  ┌─────────┐    ┌──────────┐    ┌────────────────┐   │
//!   ─────────────────┼─▶│  http   │───▶│ reloader │───▶│ job registry   │   │
//!                    │  │ server  │    │ (swap)   │    │ /perform, aux, │   │
//!                    │  └─────────┘    └──────────┘    │ static         │   │
//!                    │                      │          └───────┬────────┘   │
//!                    │                      ▼                  ▼            │
//!                    │               ┌────────────┐    ┌────────────────┐   │
//!                    │               │   health   │    │   datamodel    │   │
//!                    │               │ live/ready │    │  (coercion)    │   │
//!                    │               └────────────┘    └────────────────┘   │
//!                    │                                                      │
//!                    │  ┌────────────────────────────────────────────────┐  │
//!                    │  │ config │ manifest │ observability │ profiler   │  │
//!                    │  └────────────────────────────────────────────────┘  │
//!                    └──────────────────────────────────────────────────────┘
//! ```

mod samples;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use job_wrapper::config::validation::validate_config;
use job_wrapper::config::{load_config, ConfigError};
use job_wrapper::observability::init_logging;
use job_wrapper::profiler::TrackingAllocator;
use job_wrapper::serve_job_class;

use crate::samples::{AdderJob, MemoryLeakJob};

#[global_allocator]
static ALLOCATOR: TrackingAllocator = TrackingAllocator;

#[derive(Parser)]
#[command(name = "job-wrapper")]
#[command(version, about = "Serve a job as an HTTP API", long_about = None)]
struct Cli {
    /// Wrapper configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding config and environment
    #[arg(short, long)]
    bind: Option<String>,

    /// Bundled job to serve
    #[arg(long, value_enum, default_value_t = SampleJob::Adder)]
    job: SampleJob,
}

#[derive(Clone, Copy, ValueEnum)]
enum SampleJob {
    Adder,
    MemoryLeak,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    init_logging(&config.observability);
    tracing::info!("job-wrapper v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        manifest = %config.manifest.path,
        profiler = config.profiler.enabled,
        "Configuration loaded"
    );

    match cli.job {
        SampleJob::Adder => serve_job_class(config, || Ok(AdderJob)).await?,
        SampleJob::MemoryLeak => serve_job_class(config, || Ok(MemoryLeakJob::default())).await?,
    }

    Ok(())
}
