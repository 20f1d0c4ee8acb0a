//! Static file and directory endpoints.

use std::path::PathBuf;

use axum::http::{header, HeaderValue};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::job::registry::RegistryError;

/// A path served straight from the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticEndpoint {
    /// A single file. The content type is guessed from the extension unless
    /// given.
    File {
        path: String,
        file: PathBuf,
        content_type: Option<String>,
    },
    /// A directory tree, served by relative path. The bare directory path
    /// itself is not served.
    Directory { path: String, dir: PathBuf },
}

impl StaticEndpoint {
    pub fn file(path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        StaticEndpoint::File {
            path: path.into(),
            file: file.into(),
            content_type: None,
        }
    }

    pub fn file_with_type(
        path: impl Into<String>,
        file: impl Into<PathBuf>,
        content_type: impl Into<String>,
    ) -> Self {
        StaticEndpoint::File {
            path: path.into(),
            file: file.into(),
            content_type: Some(content_type.into()),
        }
    }

    pub fn directory(path: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        StaticEndpoint::Directory {
            path: path.into(),
            dir: dir.into(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            StaticEndpoint::File { path, .. } | StaticEndpoint::Directory { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StaticEndpoint::File { .. } => "file",
            StaticEndpoint::Directory { .. } => "directory",
        }
    }

    /// Check the target exists and add the endpoint to `router`.
    pub(crate) fn mount(&self, router: Router) -> Result<Router, RegistryError> {
        match self {
            StaticEndpoint::File {
                path,
                file,
                content_type,
            } => {
                if !file.is_file() {
                    return Err(self.error(format!("file {} not found", file.display())));
                }
                let serve = ServeFile::new(file);
                match content_type {
                    Some(content_type) => {
                        let value = HeaderValue::from_str(content_type).map_err(|_| {
                            self.error(format!("invalid content type \"{}\"", content_type))
                        })?;
                        let service = ServiceBuilder::new()
                            .layer(SetResponseHeaderLayer::overriding(header::CONTENT_TYPE, value))
                            .service(serve);
                        Ok(router.route_service(path, service))
                    }
                    None => Ok(router.route_service(path, serve)),
                }
            }
            StaticEndpoint::Directory { path, dir } => {
                if !dir.is_dir() {
                    return Err(self.error(format!("directory {} not found", dir.display())));
                }
                let serve = ServeDir::new(dir).append_index_html_on_directories(false);
                Ok(router.nest_service(path, serve))
            }
        }
    }

    fn error(&self, reason: String) -> RegistryError {
        RegistryError::StaticEndpoint {
            path: self.path().to_string(),
            reason,
        }
    }
}
