//! Error types for lcoach-an

use thiserror::Error;

/// Result type for analysis operations
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// Analysis error type
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Requested resource (analysis, history, config) not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid input data or parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Rubric configuration is malformed or inconsistent
    #[error("Rubric configuration error: {0}")]
    Config(String),

    /// An extraction or analysis stage failed
    #[error("Stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// lcoach-common error
    #[error("Common error: {0}")]
    Common(#[from] lcoach_common::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnalysisError {
    /// Shorthand for a stage failure
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        AnalysisError::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
