//! Error types for the trialkit-core crate.

use thiserror::Error;

/// Top-level error type for trialkit operations.
///
/// A missing log or hyperparameter file is not an error; loaders return
/// `Ok(None)` for that case. Everything else surfaces here.
#[derive(Debug, Error)]
pub enum TrialkitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Log encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Log decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid save-name pattern: {0}")]
    Pattern(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shape mismatch: {0}")]
    Shape(String),
}

impl TrialkitError {
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    pub fn pattern(msg: impl Into<String>) -> Self {
        Self::Pattern(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }
}

impl From<figment::Error> for TrialkitError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}
