//! Static files and directories served next to job endpoints.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::http::{header, Method, StatusCode};
use job_wrapper::health::HealthState;
use job_wrapper::job::RegistryError;
use job_wrapper::{JobEntrypoint, JobError, JobServer, Params, StaticEndpoint};
use serde_json::Value;

mod common;

struct StaticJob {
    statics: Vec<StaticEndpoint>,
}

impl JobEntrypoint for StaticJob {
    fn perform(&self, _params: &Params) -> Result<Value, JobError> {
        Ok(Value::Null)
    }

    fn static_endpoints(&self) -> Vec<StaticEndpoint> {
        self.statics.clone()
    }
}

fn write_fixtures(root: &Path) {
    fs::write(root.join("xrai.yaml"), "name: Skynet").unwrap();
    let subfolder = root.join("docs").join("subfolder");
    fs::create_dir_all(&subfolder).unwrap();
    fs::write(subfolder.join("index.html"), "<body>index</body>").unwrap();
    fs::write(subfolder.join("Readme.md"), "# Readme").unwrap();
}

fn server() -> JobServer {
    JobServer::with_manifest(common::test_config(), Arc::new(HealthState::ready()), None)
}

#[tokio::test]
async fn test_static_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let server = server();
    server
        .mount_job(Arc::new(StaticJob {
            statics: vec![
                StaticEndpoint::file_with_type("/xrai", dir.path().join("xrai.yaml"), "application/x-yaml"),
                StaticEndpoint::directory("/docs", dir.path().join("docs")),
            ],
        }))
        .unwrap();
    let router = server.router();

    let response = common::send(&router, Method::GET, "/api/v1/xrai", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/x-yaml");
    let (_, body) = common::request_raw(&router, Method::GET, "/api/v1/xrai", None).await;
    assert_eq!(body, b"name: Skynet");

    let (status, _) = common::request_raw(&router, Method::GET, "/api/v1/docs", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = common::send(&router, Method::GET, "/api/v1/docs/subfolder/index.html", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.contains("text/html"));
    let (_, body) = common::request_raw(&router, Method::GET, "/api/v1/docs/subfolder/index.html", None).await;
    assert_eq!(body, b"<body>index</body>");

    let response = common::send(&router, Method::GET, "/docs/subfolder/Readme.md", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.contains("text/markdown"));
}

#[tokio::test]
async fn test_missing_static_file_fails_registration() {
    let dir = tempfile::tempdir().unwrap();

    let err = server()
        .mount_job(Arc::new(StaticJob {
            statics: vec![StaticEndpoint::file("/model", dir.path().join("missing.bin"))],
        }))
        .unwrap_err();
    assert!(matches!(err, RegistryError::StaticEndpoint { ref path, .. } if path == "/model"));
}

#[tokio::test]
async fn test_static_path_cannot_shadow_probes() {
    let dir = tempfile::tempdir().unwrap();
    write_fixtures(dir.path());

    let err = server()
        .mount_job(Arc::new(StaticJob {
            statics: vec![StaticEndpoint::directory("/health", dir.path().join("docs"))],
        }))
        .unwrap_err();
    assert!(matches!(err, RegistryError::ReservedPath(_)));
}
