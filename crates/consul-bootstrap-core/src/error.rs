//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Fatal configuration error: {0}")]
    FatalConfig(String),

    #[error("Failed to render supervisor descriptor: {0}")]
    Render(#[from] tera::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
