//! HTTP client for jobs served by the job wrapper.

pub mod client;

pub use client::{ClientError, HealthReport, JobClient, ProbeStatus};
