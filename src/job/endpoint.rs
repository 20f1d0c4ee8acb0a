//! Endpoint declarations.
//!
//! A job describes each extra route as an `EndpointConfig`: path, method,
//! handler, the parameters the handler reads and free-form options that end
//! up in the endpoint catalog. Parameters are declared up front with
//! `ParamSpec` so incoming values can be checked and coerced before the
//! handler runs.

use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::datamodel::{to_serializable, Schema};

/// Errors produced while invoking a job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("missing parameter \"{0}\"")]
    MissingParam(String),

    #[error("invalid parameter \"{name}\": {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    Failed(String),
}

impl JobError {
    pub fn failed(message: impl Into<String>) -> Self {
        JobError::Failed(message.into())
    }

    /// Whether the error was caused by the caller's input rather than the job.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, JobError::Failed(_))
    }
}

pub type Handler = Arc<dyn Fn(&Params) -> Result<Value, JobError> + Send + Sync>;

/// Where a parameter value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
    /// A field of the JSON object body.
    Body,
    /// The whole JSON body.
    BodyValue,
    Query,
    Path,
}

/// Declaration of one handler parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    schema: Schema,
    source: ParamSource,
    required: bool,
    example: Option<Value>,
    description: Option<String>,
}

impl ParamSpec {
    fn new(name: impl Into<String>, schema: Schema, source: ParamSource) -> Self {
        Self {
            name: name.into(),
            schema,
            source,
            required: true,
            example: None,
            description: None,
        }
    }

    pub fn body(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, schema, ParamSource::Body)
    }

    pub fn body_value(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, schema, ParamSource::BodyValue)
    }

    pub fn query(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, schema, ParamSource::Query)
    }

    pub fn path(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, schema, ParamSource::Path)
    }

    /// Mark the parameter as not required.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn source(&self) -> ParamSource {
        self.source
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn example_value(&self) -> Option<&Value> {
        self.example.as_ref()
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Checked parameter values handed to a handler.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: Map<String, Value>,
    body: Value,
}

impl Params {
    pub fn new(values: Map<String, Value>) -> Self {
        Self {
            values,
            body: Value::Null,
        }
    }

    pub(crate) fn with_body(values: Map<String, Value>, body: Value) -> Self {
        Self { values, body }
    }

    /// Typed value of a required parameter.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, JobError> {
        self.get_opt(name)?
            .ok_or_else(|| JobError::MissingParam(name.to_string()))
    }

    /// Typed value of a parameter that may be absent.
    pub fn get_opt<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, JobError> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| JobError::InvalidParam {
                    name: name.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The decoded request body, `null` when there was none.
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// One route declared by a job.
#[derive(Clone)]
pub struct EndpointConfig {
    path: String,
    method: Method,
    handler: Handler,
    params: Vec<ParamSpec>,
    options: Map<String, Value>,
}

impl EndpointConfig {
    /// Declare a route. The handler result is serialized to JSON as-is.
    ///
    /// Only GET and POST are served; other methods are rejected when the
    /// registry is built.
    pub fn new<F, R>(path: impl Into<String>, method: Method, handler: F) -> Self
    where
        F: Fn(&Params) -> Result<R, JobError> + Send + Sync + 'static,
        R: Serialize,
    {
        let handler: Handler = Arc::new(move |params: &Params| {
            let result = handler(params)?;
            to_serializable(&result).map_err(|e| JobError::Failed(e.to_string()))
        });
        Self {
            path: path.into(),
            method,
            handler,
            params: Vec::new(),
            options: Map::new(),
        }
    }

    pub fn get<F, R>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Params) -> Result<R, JobError> + Send + Sync + 'static,
        R: Serialize,
    {
        Self::new(path, Method::GET, handler)
    }

    pub fn post<F, R>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Params) -> Result<R, JobError> + Send + Sync + 'static,
        R: Serialize,
    {
        Self::new(path, Method::POST, handler)
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn params(mut self, specs: impl IntoIterator<Item = ParamSpec>) -> Self {
        self.params.extend(specs);
        self
    }

    /// Append a catalog tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        let tags = self
            .options
            .entry("tags")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = tags {
            items.push(Value::String(tag.into()));
        }
        self
    }

    /// Set an arbitrary option forwarded to the catalog.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn param_specs(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub(crate) fn handler(&self) -> Handler {
        Arc::clone(&self.handler)
    }

    /// Call the handler directly, bypassing HTTP.
    pub fn call(&self, params: &Params) -> Result<Value, JobError> {
        (self.handler)(params)
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("params", &self.params)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handler_result_is_serialized() {
        let endpoint = EndpointConfig::post("/echo", |params: &Params| params.get::<f64>("x"))
            .param(ParamSpec::body("x", Schema::Float));

        let mut values = Map::new();
        values.insert("x".into(), json!(1.5));
        let result = endpoint.call(&Params::new(values)).unwrap();
        assert_eq!(result, json!(1.5));
    }

    #[test]
    fn tags_accumulate() {
        let endpoint = EndpointConfig::get("/random", |_: &Params| Ok(4))
            .tag("items")
            .tag("numbers")
            .option("summary", "Random number");

        assert_eq!(endpoint.options()["tags"], json!(["items", "numbers"]));
        assert_eq!(endpoint.options()["summary"], json!("Random number"));
    }

    #[test]
    fn missing_and_invalid_params() {
        let mut values = Map::new();
        values.insert("name".into(), json!("abc"));
        let params = Params::new(values);

        assert!(matches!(
            params.get::<String>("other"),
            Err(JobError::MissingParam(name)) if name == "other"
        ));
        assert!(matches!(
            params.get::<i64>("name"),
            Err(JobError::InvalidParam { .. })
        ));
        assert_eq!(params.get_opt::<String>("other").unwrap(), None);
    }
}
