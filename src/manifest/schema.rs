//! Job manifest records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::datamodel::{DataModel, RecordSchema, Schema};
use crate::manifest::quantity::Quantity;

/// Git source of the job.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GitManifest {
    /// URL of git remote: HTTPS, SSH or directory path to a remote repository.
    pub remote: String,

    pub branch: Option<String>,

    /// Subdirectory relative to git repo root.
    #[serde(default = "default_directory")]
    pub directory: String,
}

impl GitManifest {
    pub fn new(remote: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            branch: None,
            directory: default_directory(),
        }
    }
}

impl DataModel for GitManifest {
    fn schema() -> Schema {
        RecordSchema::new("GitManifest")
            .required("remote", Schema::Str)
            .optional("branch", Schema::Str)
            .defaulted("directory", Schema::Str)
            .into()
    }
}

/// Resource demands of the job.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ResourcesManifest {
    /// Minimum memory amount in bytes, e.g. 256Mi.
    pub memory_min: Option<Quantity>,
    /// Maximum memory amount in bytes, e.g. 1Gi.
    pub memory_max: Option<Quantity>,
    /// Minimum CPU consumption in cores, e.g. 10m.
    pub cpu_min: Option<Quantity>,
    /// Maximum CPU consumption in cores, e.g. 1000m.
    pub cpu_max: Option<Quantity>,
}

impl DataModel for ResourcesManifest {
    fn schema() -> Schema {
        let quantity = || Schema::Custom("Quantity");
        RecordSchema::new("ResourcesManifest")
            .optional("memory_min", quantity())
            .optional("memory_max", quantity())
            .optional("cpu_min", quantity())
            .optional("cpu_max", quantity())
            .into()
    }
}

/// Job manifest: build recipe and runtime settings of a job.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Manifest {
    /// Name of the job.
    pub name: String,

    /// Email address of the job's owner.
    pub owner_email: String,

    pub git: GitManifest,

    #[serde(default = "default_version")]
    pub version: String,

    /// Job type wrapper used to embed the model.
    pub jobtype: Option<String>,
    /// Deprecated alias of `jobtype`.
    pub lang: Option<String>,

    /// Relative path to a base manifest extended by this one.
    pub extends: Option<String>,

    /// Type of deployed image: docker image, packer, AMI.
    #[serde(default = "default_image_type")]
    pub image_type: String,

    /// System-wide packages installed with apt.
    pub system_dependencies: Option<Vec<String>>,

    pub build_env: Option<BTreeMap<String, String>>,
    pub runtime_env: Option<BTreeMap<String, String>>,
    pub secret_build_env_file: Option<String>,
    pub secret_runtime_env_file: Option<String>,

    /// Free-form metadata for humans.
    pub labels: Option<Map<String, Value>>,

    /// Endpoints reachable without authentication.
    pub public_endpoints: Option<Vec<String>>,

    #[serde(default = "default_replicas")]
    pub replicas: i64,

    pub resources: Option<ResourcesManifest>,

    /// Extra parameters interpreted by the job type.
    pub jobtype_extra: Option<Map<String, Value>>,
    /// Deprecated, see `jobtype_extra`.
    pub golang: Option<Map<String, Value>>,
    /// Deprecated, see `jobtype_extra`.
    pub python: Option<Map<String, Value>>,
    /// Deprecated, see `jobtype_extra`.
    pub docker: Option<Map<String, Value>>,
    /// Deprecated, see `jobtype_extra`.
    pub wrapper_properties: Option<Map<String, Value>>,

    /// Back-end platform the job is deployed to.
    pub infrastructure_target: Option<String>,

    /// YAML text the manifest was parsed from. Internal, never serialized.
    #[serde(skip)]
    pub origin_yaml: Option<String>,

    /// Mapping the manifest was parsed from. Internal, never serialized.
    #[serde(skip)]
    pub origin_dict: Option<Map<String, Value>>,
}

impl Manifest {
    /// Minimal manifest with every optional field unset.
    pub fn new(name: impl Into<String>, owner_email: impl Into<String>, git: GitManifest) -> Self {
        Self {
            name: name.into(),
            owner_email: owner_email.into(),
            git,
            version: default_version(),
            jobtype: None,
            lang: None,
            extends: None,
            image_type: default_image_type(),
            system_dependencies: None,
            build_env: None,
            runtime_env: None,
            secret_build_env_file: None,
            secret_runtime_env_file: None,
            labels: None,
            public_endpoints: None,
            replicas: default_replicas(),
            resources: None,
            jobtype_extra: None,
            golang: None,
            python: None,
            docker: None,
            wrapper_properties: None,
            infrastructure_target: None,
            origin_yaml: None,
            origin_dict: None,
        }
    }

    /// Effective job type, preferring `jobtype` over the deprecated `lang`.
    pub fn get_jobtype(&self) -> Option<&str> {
        self.jobtype
            .as_deref()
            .filter(|jobtype| !jobtype.is_empty())
            .or(self.lang.as_deref())
    }

    /// Effective job type parameters: the first one set among
    /// `jobtype_extra`, `golang`, `python` and `wrapper_properties`.
    pub fn get_jobtype_extra(&self) -> Option<&Map<String, Value>> {
        [
            &self.jobtype_extra,
            &self.golang,
            &self.python,
            &self.wrapper_properties,
        ]
        .into_iter()
        .find_map(Option::as_ref)
    }
}

impl DataModel for Manifest {
    fn schema() -> Schema {
        let dict = || Schema::map(Schema::Any);
        let env = || Schema::map(Schema::Str);
        RecordSchema::new("Manifest")
            .required("name", Schema::Str)
            .required("owner_email", Schema::Str)
            .required("git", GitManifest::schema())
            .defaulted("version", Schema::Str)
            .optional("jobtype", Schema::Str)
            .optional("lang", Schema::Str)
            .optional("extends", Schema::Str)
            .defaulted("image_type", Schema::Str)
            .optional("system_dependencies", Schema::list(Schema::Str))
            .optional("build_env", env())
            .optional("runtime_env", env())
            .optional("secret_build_env_file", Schema::Str)
            .optional("secret_runtime_env_file", Schema::Str)
            .optional("labels", dict())
            .optional("public_endpoints", Schema::list(Schema::Str))
            .defaulted("replicas", Schema::Int)
            .optional("resources", ResourcesManifest::schema())
            .optional("jobtype_extra", dict())
            .optional("golang", dict())
            .optional("python", dict())
            .optional("docker", dict())
            .optional("wrapper_properties", dict())
            .optional("infrastructure_target", Schema::Str)
            .into()
    }
}

fn default_directory() -> String {
    ".".to_string()
}

fn default_version() -> String {
    "0.0.1".to_string()
}

fn default_image_type() -> String {
    "docker".to_string()
}

fn default_replicas() -> i64 {
    1
}
