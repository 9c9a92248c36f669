use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for varsubst operations
#[derive(Error, Debug)]
pub enum TransformError {
    /// IO error when reading templates or writing output
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Template file not found error with specific path
    #[error("Template not found: {path}")]
    TemplateNotFound { path: PathBuf },

    /// Circular variable reference detected during expansion
    #[error(
        "Circular reference detected while expanding variable '{name}' (recursion limit reached)"
    )]
    CircularReference { name: String },

    /// Invalid NAME=VALUE variable definition
    #[error("Invalid variable definition (expected NAME=VALUE): {definition}")]
    InvalidVariable { definition: String },

    /// Regex compilation error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TransformError>;
