//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Lookup failures and rule violations inside the flowchart model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("category not found: {0}")]
    CategoryNotFound(String),

    #[error("question {id} not found in category {category}")]
    NodeNotFound { category: String, id: String },

    #[error("question {id} in category {category} has no branch for answer '{answer}'")]
    AnswerNotFound {
        category: String,
        id: String,
        answer: String,
    },

    #[error("question {id} in category {category} has an empty branch for answer '{answer}'")]
    EmptyBranch {
        category: String,
        id: String,
        answer: String,
    },

    #[error("recommendation not found: {0}")]
    RecommendationNotFound(String),

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}
