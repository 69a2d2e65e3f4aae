use jbtimporter_core::config::ConfigError;
use jbtimporter_core::lifecycle::{LifecycleError, TransformError};
use jbtimporter_core::manifest::ManifestError;

use crate::remote::TransportError;

/// Errors that stop a run, plus the per-issue lifecycle failures recorded in summaries.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Unable to load the export index: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Error communicating with Jira: {0}")]
    Transport(#[from] TransportError),

    #[error("File error: {0}")]
    FileLifecycle(LifecycleError),

    #[error("Style-sheet transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Unable to configure the HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl From<LifecycleError> for Error {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Transform(err) => Error::Transform(err),
            err => Error::FileLifecycle(err),
        }
    }
}
