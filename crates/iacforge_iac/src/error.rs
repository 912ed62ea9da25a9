//! Error types for IaC validation.

use thiserror::Error;

/// Result type alias for IaC operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur during IaC operations.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Tool not available: {0}")]
    ToolNotAvailable(String),

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("Formatting failed: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HCL error: {0}")]
    Hcl(#[from] hcl::Error),

    #[error("Template error: {0}")]
    Template(#[from] iacforge_templates::TemplateError),
}
