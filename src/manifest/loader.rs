//! Manifest loading from disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::datamodel::{parse_object, DataModelError};
use crate::manifest::schema::Manifest;

/// Default manifest location, relative to the working directory.
pub const MANIFEST_FILENAME: &str = "job.yaml";

/// Error type for manifest loading.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("manifest must be a YAML mapping, got {0}")]
    NotAMapping(&'static str),

    #[error("invalid manifest: {0}")]
    Invalid(#[from] DataModelError),
}

/// Read the raw manifest mapping.
///
/// A missing file or an empty document yields an empty mapping.
pub fn read_job_manifest(path: &Path) -> Result<Map<String, Value>, ManifestError> {
    match fs::read_to_string(path) {
        Ok(text) => parse_yaml_mapping(&text),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "manifest file not found");
            Ok(Map::new())
        }
        Err(source) => Err(ManifestError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load the manifest, or `None` when there is nothing to load.
pub fn load_manifest(path: &Path) -> Result<Option<Manifest>, ManifestError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "manifest file not found");
            return Ok(None);
        }
        Err(source) => {
            return Err(ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let dict = parse_yaml_mapping(&text)?;
    if dict.is_empty() {
        tracing::warn!(path = %path.display(), "manifest file is empty");
        return Ok(None);
    }

    let manifest = manifest_from_dict(dict, Some(text))?;
    tracing::info!(
        path = %path.display(),
        name = %manifest.name,
        version = %manifest.version,
        "Manifest loaded"
    );
    Ok(Some(manifest))
}

/// Parse manifest YAML text.
pub fn parse_manifest_yaml(text: &str) -> Result<Manifest, ManifestError> {
    let dict = parse_yaml_mapping(text)?;
    manifest_from_dict(dict, Some(text.to_string()))
}

fn manifest_from_dict(
    dict: Map<String, Value>,
    origin_yaml: Option<String>,
) -> Result<Manifest, ManifestError> {
    let mut manifest: Manifest = parse_object(Value::Object(dict.clone()))?;
    manifest.origin_yaml = origin_yaml;
    manifest.origin_dict = Some(dict);
    Ok(manifest)
}

fn parse_yaml_mapping(text: &str) -> Result<Map<String, Value>, ManifestError> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_yaml::from_str::<Value>(text)? {
        Value::Object(dict) => Ok(dict),
        Value::Null => Ok(Map::new()),
        Value::Bool(_) => Err(ManifestError::NotAMapping("bool")),
        Value::Number(_) => Err(ManifestError::NotAMapping("number")),
        Value::String(_) => Err(ManifestError::NotAMapping("string")),
        Value::Array(_) => Err(ManifestError::NotAMapping("list")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name: adder
owner_email: owner@example.com
git:
  remote: https://github.com/example/jobs
  directory: python-class
jobtype: python3:latest
resources:
  memory_max: 1Gi
  cpu_min: 10m
labels:
  team: ml
runtime_env:
  TORCH_HOME: /tmp
"#;

    #[test]
    fn parse_full_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILENAME);
        fs::write(&path, FULL).unwrap();

        let manifest = load_manifest(&path).unwrap().unwrap();
        assert_eq!(manifest.name, "adder");
        assert_eq!(manifest.git.directory, "python-class");
        assert_eq!(manifest.git.branch, None);
        assert_eq!(manifest.version, "0.0.1");
        assert_eq!(manifest.replicas, 1);
        assert_eq!(manifest.get_jobtype(), Some("python3:latest"));

        let resources = manifest.resources.as_ref().unwrap();
        assert_eq!(resources.memory_max.as_ref().unwrap().as_str(), "1Gi");
        assert_eq!(resources.cpu_min.as_ref().unwrap().value(), 0.01);
        assert_eq!(manifest.origin_yaml.as_deref(), Some(FULL));
        assert_eq!(manifest.origin_dict.as_ref().unwrap()["name"], "adder");
    }

    #[test]
    fn missing_file_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILENAME);
        assert!(read_job_manifest(&path).unwrap().is_empty());
        assert!(load_manifest(&path).unwrap().is_none());
    }

    #[test]
    fn empty_file_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILENAME);
        fs::write(&path, "# nothing yet\n").unwrap();
        assert!(read_job_manifest(&path).unwrap().is_empty());
        assert!(load_manifest(&path).unwrap().is_none());
    }

    #[test]
    fn unknown_field_is_fatal() {
        let err = parse_manifest_yaml(
            "name: adder\nowner_email: a@b.c\ngit:\n  remote: url\nreplica: 3\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Invalid(DataModelError::UnknownField { ref field, .. }) if field == "replica"
        ));
    }

    #[test]
    fn missing_required_field_is_fatal() {
        let err = parse_manifest_yaml("name: adder\ngit:\n  remote: url\n").unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Invalid(DataModelError::MissingField { field: "owner_email", .. })
        ));

        let err = parse_manifest_yaml("name: adder\nowner_email: a@b.c\ngit:\n  branch: main\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Invalid(DataModelError::MissingField { field: "remote", .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_fatal() {
        assert!(matches!(
            parse_manifest_yaml("name: [unclosed"),
            Err(ManifestError::Yaml(_))
        ));
        assert!(matches!(
            parse_manifest_yaml("- just\n- a list\n"),
            Err(ManifestError::NotAMapping("list"))
        ));
    }

    #[test]
    fn invalid_quantity_fails_construction() {
        let err = parse_manifest_yaml(
            "name: a\nowner_email: a@b.c\ngit:\n  remote: url\nresources:\n  memory_max: plenty\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Invalid(DataModelError::Construction { .. })
        ));
    }
}
