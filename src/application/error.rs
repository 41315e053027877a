//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Why imported JSON text was rejected.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("invalid JSON format: not an object")]
    NotAnObject,

    #[error("invalid flowchart data: no categories")]
    MissingCategories,

    #[error("invalid flowchart data: missing recommendations")]
    MissingRecommendations,

    #[error("invalid flowchart data: {0}")]
    Schema(#[source] serde_json::Error),
}

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("import rejected: {0}")]
    Import(#[from] ImportError),

    #[error("storage unavailable for key '{key}'")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
