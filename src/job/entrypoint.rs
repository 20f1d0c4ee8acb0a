//! The interface a wrapped job implements.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::job::endpoint::{EndpointConfig, JobError, ParamSpec, Params};
use crate::job::statics::StaticEndpoint;

/// A user job served over HTTP.
///
/// Only `perform` is mandatory; it is exposed as `POST /perform`. Everything
/// else has an empty default.
///
/// ```
/// use job_wrapper::datamodel::Schema;
/// use job_wrapper::job::{JobEntrypoint, JobError, ParamSpec, Params};
/// use serde_json::{json, Value};
///
/// struct Adder;
///
/// impl JobEntrypoint for Adder {
///     fn perform(&self, params: &Params) -> Result<Value, JobError> {
///         let x: f64 = params.get("x")?;
///         let y: f64 = params.get("y")?;
///         Ok(json!(x + y))
///     }
///
///     fn perform_params(&self) -> Vec<ParamSpec> {
///         vec![
///             ParamSpec::body("x", Schema::Float),
///             ParamSpec::body("y", Schema::Float),
///         ]
///     }
/// }
/// ```
pub trait JobEntrypoint: Send + Sync + 'static {
    /// Main action of the job.
    fn perform(&self, params: &Params) -> Result<Value, JobError>;

    /// Parameters read by `perform`. With none declared, the fields of the
    /// request body are handed over unchecked.
    fn perform_params(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    /// Extra routes besides `/perform`.
    fn auxiliary_endpoints(self: Arc<Self>) -> Vec<EndpointConfig> {
        Vec::new()
    }

    /// Sample inputs per endpoint path, shown in the endpoint catalog.
    fn docs_input_examples(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Files and directories served as-is.
    fn static_endpoints(&self) -> Vec<StaticEndpoint> {
        Vec::new()
    }
}
