//! Memory profiler.
//!
//! # Data Flow
//! ```text
//! TrackingAllocator (allocator.rs, installed by the binary)
//!     → sampler thread, every sample_interval_ms
//!     → memory report (trace.rs, binary, flushed per sample)
//!     → on demand: timeline.rs (HTML) | stats text
//! ```
//!
//! # Design Decisions
//! - Gated by `MEMORY_PROFILER`; disabled profilers never touch the disk
//! - Starting removes any report left by a previous run
//! - Reading artifacts before a report exists is a caller error, not fatal

pub mod allocator;
pub mod timeline;
pub mod handlers;
pub mod trace;

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;

use crate::config::ProfilerConfig;

pub use allocator::{snapshot, MemorySnapshot, TrackingAllocator};
pub use handlers::profiler_router;
pub use trace::{read_trace, Trace, TraceHeader, TraceSample, TraceWriter};

#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error("memory report not found at {}", .0.display())]
    ReportNotFound(PathBuf),

    #[error("invalid memory report: {0}")]
    InvalidReport(String),

    #[error("profiler IO error: {0}")]
    Io(#[from] io::Error),
}

struct Sampler {
    stop: mpsc::Sender<()>,
    handle: JoinHandle<io::Result<()>>,
}

/// Records allocator counters to a report file while running.
pub struct MemoryProfiler {
    config: ProfilerConfig,
    sampler: Mutex<Option<Sampler>>,
}

impl MemoryProfiler {
    pub fn new(config: ProfilerConfig) -> Self {
        Self {
            config,
            sampler: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    pub fn report_path(&self) -> &Path {
        Path::new(&self.config.report_path)
    }

    pub fn timeline_path(&self) -> &Path {
        Path::new(&self.config.timeline_path)
    }

    /// Start sampling. No-op when disabled or already running.
    pub fn start(&self) -> Result<(), ProfilerError> {
        if !self.is_enabled() {
            return Ok(());
        }
        let mut sampler = self.lock();
        if sampler.is_some() {
            return Ok(());
        }

        let report_path = self.report_path();
        if report_path.is_file() {
            tracing::warn!(path = %report_path.display(), "Deleting previous memory report");
            fs::remove_file(report_path)?;
        }
        if !allocator::is_installed() {
            tracing::warn!("Tracking allocator is not installed, memory report will stay empty");
        }

        let header = TraceHeader {
            version: trace::VERSION,
            leaks: self.config.leaks,
            started_at_ms: Utc::now().timestamp_millis().max(0) as u64,
        };
        let mut writer = TraceWriter::new(BufWriter::new(File::create(report_path)?), header)?;
        let interval = Duration::from_millis(self.config.sample_interval_ms);
        let (stop, stop_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("memory-profiler".into())
            .spawn(move || {
                let started = Instant::now();
                let sample =
                    || TraceSample::from_snapshot(started.elapsed().as_millis() as u64, snapshot());
                loop {
                    writer.write_sample(&sample())?;
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                writer.write_sample(&sample())
            })?;

        *sampler = Some(Sampler { stop, handle });
        tracing::info!(
            path = %report_path.display(),
            leaks = self.config.leaks,
            "Memory profiler started"
        );
        Ok(())
    }

    /// Stop sampling and finish the report. No-op when not running.
    pub fn stop(&self) {
        let Some(sampler) = self.lock().take() else {
            return;
        };
        let _ = sampler.stop.send(());
        match sampler.handle.join() {
            Ok(Ok(())) => tracing::info!(
                path = %self.report_path().display(),
                "Memory profiler stopped, report saved"
            ),
            Ok(Err(e)) => tracing::error!(error = %e, "Memory profiler failed writing report"),
            Err(_) => tracing::error!("Memory profiler thread panicked"),
        }
    }

    /// Raw bytes of the memory report.
    pub fn get_report_bytes(&self) -> Result<Vec<u8>, ProfilerError> {
        let path = self.existing_report()?;
        Ok(fs::read(path)?)
    }

    /// Render the report as HTML, keeping a copy at the timeline path.
    pub fn get_timeline_html(&self) -> Result<String, ProfilerError> {
        let trace = self.read_report()?;
        let timeline_path = self.timeline_path();
        if timeline_path.is_file() {
            fs::remove_file(timeline_path)?;
        }
        let html = timeline::render_html(&trace);
        fs::write(timeline_path, &html)?;
        Ok(html)
    }

    /// Plain-text summary of the report.
    pub fn get_stats_output(&self) -> Result<String, ProfilerError> {
        let trace = self.read_report()?;
        Ok(format_stats(&trace))
    }

    fn read_report(&self) -> Result<Trace, ProfilerError> {
        let path = self.existing_report()?;
        read_trace(BufReader::new(File::open(path)?))
    }

    fn existing_report(&self) -> Result<&Path, ProfilerError> {
        let path = self.report_path();
        if !path.is_file() {
            return Err(ProfilerError::ReportNotFound(path.to_path_buf()));
        }
        Ok(path)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Sampler>> {
        self.sampler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MemoryProfiler {
    fn drop(&mut self) {
        self.stop();
    }
}

pub fn format_stats(trace: &Trace) -> String {
    use timeline::format_bytes;

    let last = trace.samples.last().copied().unwrap_or(TraceSample {
        elapsed_ms: 0,
        current_bytes: 0,
        peak_bytes: 0,
        allocations: 0,
        deallocations: 0,
    });
    let first_allocations = trace.samples.first().map(|s| s.allocations).unwrap_or(0);

    let mut lines = vec![
        format!("Samples: {}", trace.samples.len()),
        format!("Duration: {} ms", trace.duration_ms()),
        format!(
            "Total allocations: {}",
            last.allocations.saturating_sub(first_allocations)
        ),
        format!("Peak memory usage: {}", format_bytes(trace.peak_bytes())),
        format!("Current memory usage: {}", format_bytes(last.current_bytes)),
    ];
    if trace.header.leaks {
        let retained = trace.retained_bytes();
        lines.push(format!(
            "Leaked (retained since start): {}{}",
            if retained < 0 { "-" } else { "" },
            format_bytes(retained.unsigned_abs())
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path, enabled: bool) -> ProfilerConfig {
        ProfilerConfig {
            enabled,
            leaks: true,
            report_path: dir.join("memory-report.bin").to_string_lossy().into_owned(),
            timeline_path: dir.join("memory-timeline.html").to_string_lossy().into_owned(),
            sample_interval_ms: 10,
        }
    }

    #[test]
    fn artifacts_require_a_report() {
        let dir = tempfile::tempdir().unwrap();
        let profiler = MemoryProfiler::new(config(dir.path(), true));

        assert!(matches!(
            profiler.get_report_bytes(),
            Err(ProfilerError::ReportNotFound(_))
        ));
        assert!(matches!(
            profiler.get_timeline_html(),
            Err(ProfilerError::ReportNotFound(_))
        ));
        assert!(matches!(
            profiler.get_stats_output(),
            Err(ProfilerError::ReportNotFound(_))
        ));
    }

    #[test]
    fn disabled_profiler_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let profiler = MemoryProfiler::new(config(dir.path(), false));
        profiler.start().unwrap();
        assert!(!profiler.is_running());
        assert!(!profiler.report_path().exists());
    }

    #[test]
    fn start_stop_produces_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("memory-report.bin"), b"stale").unwrap();
        let profiler = MemoryProfiler::new(config(dir.path(), true));

        profiler.start().unwrap();
        assert!(profiler.is_running());
        std::thread::sleep(Duration::from_millis(30));
        profiler.stop();
        assert!(!profiler.is_running());

        let trace = read_trace(profiler.get_report_bytes().unwrap().as_slice()).unwrap();
        assert!(trace.header.leaks);
        assert!(trace.samples.len() >= 2);

        let html = profiler.get_timeline_html().unwrap();
        assert!(html.contains("<svg"));
        assert!(profiler.timeline_path().is_file());

        let stats = profiler.get_stats_output().unwrap();
        assert!(stats.contains("Peak memory usage"));
        assert!(stats.contains("Leaked"));
    }
}
