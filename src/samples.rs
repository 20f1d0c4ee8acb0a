//! Sample jobs bundled with the binary.

use std::sync::{Arc, Mutex};

use job_wrapper::datamodel::Schema;
use job_wrapper::{EndpointConfig, JobEntrypoint, JobError, ParamSpec, Params};
use rand::Rng;
use serde_json::{json, Map, Value};

/// Adds two numbers; also multiplies and draws random numbers.
///
/// Sums are floats: `{"x": 40, "y": 2}` answers `42.0`.
pub struct AdderJob;

impl AdderJob {
    fn multiply(&self, params: &Params) -> Result<f64, JobError> {
        let body: f64 = params.get("body")?;
        let query: f64 = params.get("query")?;
        let path: f64 = params.get("path")?;
        Ok(body * query * path)
    }

    fn random(&self, params: &Params) -> Result<f64, JobError> {
        let start: f64 = params.get("start")?;
        let end: f64 = params.get("end")?;
        if start >= end {
            return Err(JobError::InvalidParam {
                name: "end".into(),
                reason: format!("must be greater than start ({})", start),
            });
        }
        Ok(rand::thread_rng().gen_range(start..end))
    }
}

impl JobEntrypoint for AdderJob {
    fn perform(&self, params: &Params) -> Result<Value, JobError> {
        let x: f64 = params.get("x")?;
        let y: f64 = params.get("y")?;
        Ok(json!(x + y))
    }

    fn perform_params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::body("x", Schema::Float)
                .example(40)
                .description("First element to add."),
            ParamSpec::body("y", Schema::Float)
                .example(2)
                .description("Second element to add."),
        ]
    }

    fn auxiliary_endpoints(self: Arc<Self>) -> Vec<EndpointConfig> {
        let multiplier = Arc::clone(&self);
        let randomizer = self;
        vec![
            EndpointConfig::post("/multiply/{path}", move |params: &Params| {
                multiplier.multiply(params)
            })
            .param(ParamSpec::body_value("body", Schema::Float).example(1.2))
            .param(ParamSpec::query("query", Schema::Float).example(2.4))
            .param(ParamSpec::path("path", Schema::Float).example(234.21))
            .tag("items"),
            EndpointConfig::get("/random", move |params: &Params| randomizer.random(params))
                .param(ParamSpec::query("start", Schema::Float).example(0))
                .param(ParamSpec::query("end", Schema::Float).example(10))
                .option("summary", "Return random number within a range")
                .tag("items"),
        ]
    }

    fn docs_input_examples(&self) -> Map<String, Value> {
        let mut examples = Map::new();
        examples.insert("/perform".into(), json!({"x": 40, "y": 2}));
        examples
    }
}

/// Grows its cache by a few megabytes on every call.
#[derive(Default)]
pub struct MemoryLeakJob {
    cache: Mutex<Vec<Vec<u64>>>,
}

impl JobEntrypoint for MemoryLeakJob {
    fn perform(&self, _params: &Params) -> Result<Value, JobError> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| JobError::failed("cache lock poisoned"))?;
        cache.push(vec![1; 1_000_000]);
        Ok(json!(cache.len()))
    }
}
