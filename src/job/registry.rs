//! Endpoint registry.
//!
//! # Responsibilities
//! - Collect `/perform`, auxiliary and static endpoints of a job
//! - Reject declarations the server cannot serve (bad method, bad path,
//!   duplicates, clashes with built-in routes)
//! - Turn the declarations into an Axum router
//! - Describe the mounted endpoints for the catalog
//!
//! # Request Handling
//! ```text
//! path params + query + JSON body
//!     → collect_params (declared ParamSpecs, coerced by the datamodel engine)
//!     → handler on the blocking pool
//!     → JSON response
//! ```
//! Bad input is answered with 422, also when the handler itself reports a
//! missing or invalid parameter; other handler failures get 500. Both carry an
//! `{"error": ...}` body.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{on, MethodFilter, MethodRouter},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::datamodel::normalize;
use crate::job::endpoint::{EndpointConfig, Handler, JobError, ParamSource, ParamSpec, Params};
use crate::job::entrypoint::JobEntrypoint;
use crate::job::statics::StaticEndpoint;
use crate::observability::metrics;

/// Prefix under which every job route is served a second time.
pub const API_PREFIX: &str = "/api/v1";

/// Paths owned by the wrapper itself.
pub const RESERVED_PATHS: &[&str] = &["/live", "/ready", "/health", "/metrics", "/endpoints"];

/// Path prefix of the profiler routes.
pub const PROFILER_PREFIX: &str = "/profiler";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unsupported method {method} for endpoint {path}: only GET and POST are allowed")]
    UnsupportedMethod { path: String, method: String },

    #[error("endpoint {method} {path} is declared more than once")]
    DuplicateEndpoint { path: String, method: String },

    #[error("invalid endpoint path \"{path}\": {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("endpoint path {0} is reserved by the wrapper")]
    ReservedPath(String),

    #[error("static endpoint {path}: {reason}")]
    StaticEndpoint { path: String, reason: String },

    #[error("endpoint path {path} conflicts with {existing}: captures at the same position must share a name")]
    ConflictingPath { path: String, existing: String },
}

/// Catalog entry for one mounted endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointSummary {
    pub path: String,
    pub method: String,
    pub params: Vec<ParamSummary>,
    pub options: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_example: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamSummary {
    pub name: String,
    pub source: ParamSource,
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Validated set of job endpoints.
#[derive(Debug)]
pub struct EndpointRegistry {
    endpoints: Vec<EndpointConfig>,
    statics: Vec<StaticEndpoint>,
    input_examples: Map<String, Value>,
}

impl EndpointRegistry {
    /// Collect all endpoints declared by `job`.
    pub fn from_job<J: JobEntrypoint + ?Sized>(job: Arc<J>) -> Result<Self, RegistryError> {
        let performer = Arc::clone(&job);
        let perform = EndpointConfig::post("/perform", move |params: &Params| performer.perform(params))
            .params(job.perform_params())
            .option("summary", "Call main action");

        let mut endpoints = vec![perform];
        endpoints.extend(Arc::clone(&job).auxiliary_endpoints());

        Self::new(endpoints, job.static_endpoints(), job.docs_input_examples())
    }

    pub fn new(
        endpoints: Vec<EndpointConfig>,
        statics: Vec<StaticEndpoint>,
        input_examples: Map<String, Value>,
    ) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        let mut shapes: HashMap<String, String> = HashMap::new();
        for endpoint in &endpoints {
            let path = endpoint.path();
            validate_path(path)?;
            let existing = shapes.entry(route_shape(path)).or_insert_with(|| path.to_string());
            if existing.as_str() != path {
                return Err(RegistryError::ConflictingPath {
                    path: path.to_string(),
                    existing: existing.clone(),
                });
            }
            let method = endpoint.method();
            if *method != Method::GET && *method != Method::POST {
                return Err(RegistryError::UnsupportedMethod {
                    path: path.to_string(),
                    method: method.to_string(),
                });
            }
            if !seen.insert((path.to_string(), method.clone())) {
                return Err(RegistryError::DuplicateEndpoint {
                    path: path.to_string(),
                    method: method.to_string(),
                });
            }
        }

        {
            let dynamic_paths: HashSet<&str> = endpoints.iter().map(EndpointConfig::path).collect();
            let mut static_paths = HashSet::new();
            for endpoint in &statics {
                let path = endpoint.path();
                validate_path(path)?;
                if path.ends_with('/') {
                    return Err(RegistryError::InvalidPath {
                        path: path.to_string(),
                        reason: "static paths must not end with /",
                    });
                }
                if dynamic_paths.contains(path) || !static_paths.insert(path) {
                    return Err(RegistryError::StaticEndpoint {
                        path: path.to_string(),
                        reason: "path is already in use".to_string(),
                    });
                }
            }
        }

        Ok(Self {
            endpoints,
            statics,
            input_examples,
        })
    }

    pub fn endpoints(&self) -> &[EndpointConfig] {
        &self.endpoints
    }

    pub fn static_endpoints(&self) -> &[StaticEndpoint] {
        &self.statics
    }

    /// Build the job router. Paths are relative; the caller decides where to
    /// mount it.
    pub fn router(&self) -> Result<Router, RegistryError> {
        let mut by_path: Vec<(&str, Vec<&EndpointConfig>)> = Vec::new();
        for endpoint in &self.endpoints {
            match by_path.iter_mut().find(|(path, _)| *path == endpoint.path()) {
                Some((_, group)) => group.push(endpoint),
                None => by_path.push((endpoint.path(), vec![endpoint])),
            }
        }

        let mut router = Router::new();
        for (path, group) in by_path {
            let route = group
                .iter()
                .fold(MethodRouter::new(), |route, endpoint| route.merge(method_route(endpoint)));
            router = router.route(path, route);
            for endpoint in group {
                tracing::debug!(method = %endpoint.method(), path, "Endpoint registered");
            }
        }
        for endpoint in &self.statics {
            router = endpoint.mount(router)?;
            tracing::debug!(path = %endpoint.path(), kind = endpoint.kind(), "Static endpoint registered");
        }
        Ok(router)
    }

    /// Describe every mounted endpoint.
    pub fn catalog(&self) -> Vec<EndpointSummary> {
        let mut catalog: Vec<EndpointSummary> = self
            .endpoints
            .iter()
            .map(|endpoint| EndpointSummary {
                path: endpoint.path().to_string(),
                method: endpoint.method().to_string(),
                params: endpoint.param_specs().iter().map(summarize_param).collect(),
                options: endpoint.options().clone(),
                input_example: self.input_examples.get(endpoint.path()).cloned(),
            })
            .collect();

        catalog.extend(self.statics.iter().map(|endpoint| {
            let mut options = Map::new();
            options.insert("static".into(), Value::String(endpoint.kind().into()));
            EndpointSummary {
                path: endpoint.path().to_string(),
                method: Method::GET.to_string(),
                params: Vec::new(),
                options,
                input_example: None,
            }
        }));
        catalog
    }
}

fn validate_path(path: &str) -> Result<(), RegistryError> {
    let invalid = |reason| RegistryError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    if path.is_empty() {
        return Err(invalid("path is empty"));
    }
    if !path.starts_with('/') {
        return Err(invalid("path must start with /"));
    }
    if path.split('/').any(|segment| segment.starts_with(':') || segment.starts_with('*')) {
        return Err(invalid("use {name} for path parameters"));
    }
    if path == API_PREFIX || path.starts_with(&format!("{}/", API_PREFIX)) {
        return Err(invalid("the API prefix is added automatically"));
    }

    let trimmed = path.trim_end_matches('/');
    if RESERVED_PATHS.contains(&trimmed)
        || trimmed == PROFILER_PREFIX
        || trimmed.starts_with(&format!("{}/", PROFILER_PREFIX))
    {
        return Err(RegistryError::ReservedPath(path.to_string()));
    }
    Ok(())
}

/// `path` with every capture segment blanked, so `/items/{id}` and
/// `/items/{name}` share a shape.
fn route_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| if segment.contains('{') { "{}" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

fn summarize_param(spec: &ParamSpec) -> ParamSummary {
    ParamSummary {
        name: spec.name().to_string(),
        source: spec.source(),
        type_name: spec.schema().to_string(),
        required: spec.is_required(),
        example: spec.example_value().cloned(),
        description: spec.description_text().map(str::to_string),
    }
}

/// State captured by each route handler.
struct Route {
    path: String,
    method: Method,
    params: Vec<ParamSpec>,
    handler: Handler,
}

fn method_route(endpoint: &EndpointConfig) -> MethodRouter {
    let filter = if *endpoint.method() == Method::GET {
        MethodFilter::GET
    } else {
        MethodFilter::POST
    };
    let route = Arc::new(Route {
        path: endpoint.path().to_string(),
        method: endpoint.method().clone(),
        params: endpoint.param_specs().to_vec(),
        handler: endpoint.handler(),
    });

    if endpoint.path().contains('{') {
        on(
            filter,
            move |Path(path): Path<HashMap<String, String>>,
                  Query(query): Query<HashMap<String, String>>,
                  body: Bytes| {
                let route = Arc::clone(&route);
                async move { dispatch(route, path, query, body).await }
            },
        )
    } else {
        on(
            filter,
            move |Query(query): Query<HashMap<String, String>>, body: Bytes| {
                let route = Arc::clone(&route);
                async move { dispatch(route, HashMap::new(), query, body).await }
            },
        )
    }
}

async fn dispatch(
    route: Arc<Route>,
    path: HashMap<String, String>,
    query: HashMap<String, String>,
    body: Bytes,
) -> Response {
    let start = Instant::now();

    let response = match collect_params(&route.params, path, query, &body) {
        Err(e) => {
            tracing::debug!(path = %route.path, error = %e, "Rejected request parameters");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Ok(params) => {
            let handler = Arc::clone(&route.handler);
            match tokio::task::spawn_blocking(move || handler(&params)).await {
                Ok(Ok(value)) => Json(value).into_response(),
                Ok(Err(e)) if e.is_client_error() => {
                    tracing::debug!(path = %route.path, error = %e, "Job rejected request input");
                    error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
                }
                Ok(Err(e)) => {
                    tracing::error!(path = %route.path, error = %e, "Job handler failed");
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                }
                Err(e) => {
                    tracing::error!(path = %route.path, error = %e, "Job handler panicked");
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "job handler panicked".into())
                }
            }
        }
    };

    metrics::record_request(&route.path, route.method.as_str(), response.status().as_u16(), start);
    response
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Gather and check the declared parameters of one request.
fn collect_params(
    specs: &[ParamSpec],
    path: HashMap<String, String>,
    query: HashMap<String, String>,
    body: &[u8],
) -> Result<Params, JobError> {
    let body: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body).map_err(|e| JobError::InvalidBody(e.to_string()))?
    };

    if specs.is_empty() {
        let values = match &body {
            Value::Object(fields) => fields.clone(),
            _ => Map::new(),
        };
        return Ok(Params::with_body(values, body));
    }

    let fields = match &body {
        Value::Object(fields) => Some(fields),
        Value::Null => None,
        _ if specs.iter().any(|s| s.source() == ParamSource::Body) => {
            return Err(JobError::InvalidBody("expected a JSON object".into()));
        }
        _ => None,
    };

    let mut values = Map::new();
    for spec in specs {
        let raw = match spec.source() {
            ParamSource::Body => fields.and_then(|f| f.get(spec.name())).cloned(),
            ParamSource::BodyValue => Some(body.clone()),
            ParamSource::Query => query.get(spec.name()).cloned().map(Value::String),
            ParamSource::Path => path.get(spec.name()).cloned().map(Value::String),
        };

        match raw {
            None | Some(Value::Null) => {
                if spec.is_required() {
                    return Err(JobError::MissingParam(spec.name().to_string()));
                }
            }
            Some(raw) => {
                let value = normalize(raw, spec.schema()).map_err(|e| JobError::InvalidParam {
                    name: spec.name().to_string(),
                    reason: e.to_string(),
                })?;
                values.insert(spec.name().to_string(), value);
            }
        }
    }

    Ok(Params::with_body(values, body))
}
