//! Error types for trace evaluation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Error, Debug)]
pub enum EvalError {
    /// Failed to load a test case file
    #[error("Failed to load test case: {0}")]
    LoadError(String),

    /// The test case itself is malformed
    #[error("Invalid test case: {0}")]
    InvalidCase(String),

    /// The pipeline under test failed
    #[error("Agent error: {0}")]
    AgentError(String),

    #[error("Scoring error: {0}")]
    ScoringError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<trip_core::TripError> for EvalError {
    fn from(err: trip_core::TripError) -> Self {
        EvalError::AgentError(err.to_string())
    }
}
