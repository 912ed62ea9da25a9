//! Error types for the resource model.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while reading or checking a resource model.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported model file extension: {}", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Duplicate resource name: {0}")]
    DuplicateResource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
