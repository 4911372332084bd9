//! Metadata resolution error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Metadata request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Metadata server returned {status} for {path}")]
    Status { path: String, status: u16 },

    #[error("Metadata value for {0} is empty")]
    EmptyValue(String),

    #[error("Malformed metadata value for {path}: {value:?}")]
    Malformed { path: String, value: String },
}

pub type Result<T> = std::result::Result<T, MetadataError>;
