//! Centralized error types for crowphish.

use std::path::PathBuf;

use thiserror::Error;

/// Failure kinds of a screenshot triage run.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Could not find file: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to reach the analysis service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Analysis service error (HTTP {status}): {body}")]
    Service { status: u16, body: String },

    #[error("Analysis service blocked the request: {0}")]
    Blocked(String),

    #[error("Analysis service returned no text content")]
    EmptyResponse,

    #[error("Failed to parse analysis JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for crowphish operations.
pub type TriageResult<T> = Result<T, TriageError>;

impl TriageError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error means the input image was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }
}
