//! Job manifest subsystem.
//!
//! # Data Flow
//! ```text
//! job.yaml (working directory)
//!     → loader.rs (read, tolerate absence, YAML → mapping)
//!     → datamodel::parse_object (strict keys, coercion)
//!     → Manifest (immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - A missing or empty manifest is a warning, not an error
//! - Unknown keys, missing required fields and malformed YAML are fatal
//! - Deprecated aliases are resolved through helpers, never rewritten

pub mod loader;
pub mod quantity;
pub mod schema;

pub use loader::{load_manifest, parse_manifest_yaml, read_job_manifest, ManifestError, MANIFEST_FILENAME};
pub use quantity::Quantity;
pub use schema::{GitManifest, Manifest, ResourcesManifest};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::{parse_object, remove_none, to_serializable};
    use serde_json::{json, Map};

    fn sample() -> Manifest {
        let mut git = GitManifest::new("https://github.com/example/jobs");
        git.branch = Some("master".to_string());

        let mut manifest = Manifest::new("adder", "owner@example.com", git);
        manifest.resources = Some(ResourcesManifest {
            memory_max: Some("1Gi".parse().unwrap()),
            ..Default::default()
        });
        manifest.public_endpoints = Some(vec!["/api/v1/perform".to_string()]);
        manifest
    }

    #[test]
    fn round_trip_reproduces_manifest() {
        let manifest = sample();
        let serialized = remove_none(to_serializable(&manifest).unwrap());
        assert_eq!(
            serialized,
            json!({
                "name": "adder",
                "owner_email": "owner@example.com",
                "git": {
                    "remote": "https://github.com/example/jobs",
                    "branch": "master",
                    "directory": ".",
                },
                "version": "0.0.1",
                "image_type": "docker",
                "public_endpoints": ["/api/v1/perform"],
                "replicas": 1,
                "resources": {"memory_max": "1Gi"},
            })
        );

        let reparsed: Manifest = parse_object(serialized).unwrap();
        assert_eq!(reparsed, manifest);
    }

    #[test]
    fn null_optionals_come_back_as_defaults() {
        let manifest = Manifest::new("adder", "owner@example.com", GitManifest::new("url"));
        let reparsed: Manifest =
            parse_object(remove_none(to_serializable(&manifest).unwrap())).unwrap();
        assert_eq!(reparsed, manifest);
        assert!(reparsed.resources.is_none());
    }

    #[test]
    fn jobtype_prefers_new_field() {
        let mut manifest = sample();
        assert_eq!(manifest.get_jobtype(), None);

        manifest.lang = Some("python3".to_string());
        assert_eq!(manifest.get_jobtype(), Some("python3"));

        manifest.jobtype = Some(String::new());
        assert_eq!(manifest.get_jobtype(), Some("python3"));

        manifest.jobtype = Some("python3:2.4.0".to_string());
        assert_eq!(manifest.get_jobtype(), Some("python3:2.4.0"));
    }

    #[test]
    fn jobtype_extra_takes_first_set_alias() {
        let mut manifest = sample();
        assert!(manifest.get_jobtype_extra().is_none());

        let mut python = Map::new();
        python.insert("requirements_path".into(), json!("requirements.txt"));
        manifest.python = Some(python);
        manifest.wrapper_properties = Some(Map::new());
        assert_eq!(
            manifest.get_jobtype_extra().unwrap()["requirements_path"],
            "requirements.txt"
        );

        manifest.jobtype_extra = Some(Map::new());
        assert!(manifest.get_jobtype_extra().unwrap().is_empty());
    }
}
