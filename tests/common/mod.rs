//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use job_wrapper::datamodel::Schema;
use job_wrapper::health::HealthState;
use job_wrapper::{
    EndpointConfig, JobEntrypoint, JobError, JobServer, ParamSpec, Params, Shutdown, WrapperConfig,
};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Adder with an `/explain` and a `/random` endpoint.
///
/// `/perform` adds integers, so `{"x": 40, "y": 2}` answers with the JSON
/// number `42` rather than `42.0`.
pub struct AdderJob;

impl AdderJob {
    fn explain(&self, params: &Params) -> Result<Value, JobError> {
        let x: f64 = params.get("x")?;
        let y: f64 = params.get("y")?;
        let result = x + y;
        Ok(json!({ "x_importance": x / result, "y_importance": y / result }))
    }
}

impl JobEntrypoint for AdderJob {
    fn perform(&self, params: &Params) -> Result<Value, JobError> {
        let x: i64 = params.get("x")?;
        let y: i64 = params.get("y")?;
        Ok(json!(x + y))
    }

    fn perform_params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::body("x", Schema::Int),
            ParamSpec::body("y", Schema::Int),
        ]
    }

    fn auxiliary_endpoints(self: Arc<Self>) -> Vec<EndpointConfig> {
        let job = Arc::clone(&self);
        vec![
            EndpointConfig::post("/explain", move |params: &Params| job.explain(params))
                .param(ParamSpec::body("x", Schema::Float))
                .param(ParamSpec::body("y", Schema::Float)),
            // chosen by fair dice roll
            EndpointConfig::get("/random", |_: &Params| Ok(4)),
            EndpointConfig::get("/fail", |_: &Params| -> Result<Value, JobError> {
                Err(JobError::failed("division by zero"))
            }),
        ]
    }

    fn docs_input_examples(&self) -> Map<String, Value> {
        let mut examples = Map::new();
        examples.insert("/perform".into(), json!({"x": 40, "y": 2}));
        examples.insert("/explain".into(), json!({"x": 1, "y": 2}));
        examples.insert("/random".into(), json!({}));
        examples
    }
}

/// Adder that declares no parameters and reads the body fields itself.
pub struct UndeclaredAdderJob;

impl JobEntrypoint for UndeclaredAdderJob {
    fn perform(&self, params: &Params) -> Result<Value, JobError> {
        let x: i64 = params.get("x")?;
        let y: i64 = params.get("y")?;
        Ok(json!(x + y))
    }
}

pub fn test_config() -> WrapperConfig {
    let mut config = WrapperConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config
}

/// Server with `job` mounted and ready.
pub fn ready_server<J: JobEntrypoint>(job: J) -> JobServer {
    let server = JobServer::with_manifest(test_config(), Arc::new(HealthState::ready()), None);
    server.mount_job(Arc::new(job)).expect("job routes should mount");
    server
}

/// Send one request through `router` in-process.
pub async fn request(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = request_raw(router, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

pub async fn request_raw(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let response = send(router, method, uri, body).await;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> axum::response::Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    router.clone().oneshot(request).await.unwrap()
}

/// Serve `server` on an ephemeral port.
pub async fn spawn_server(server: JobServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown)
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
