//! Unified error types for Mend

use thiserror::Error;

/// Unified error type for all Mend operations
#[derive(Error, Debug)]
pub enum MendError {
    // Credential / input errors (fatal to a run)
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    // Model API errors
    #[error("API error: {0}")]
    Api(String),

    #[error("API rate limit: {0}")]
    ApiLimit(String),

    // Git errors
    #[error("Git command failed: {0}")]
    Git(String),

    #[error("Branch switch failed: {0}")]
    BranchSwitch(String),

    #[error("Commit failed: {0}")]
    Commit(String),

    #[error("Push failed: {0}")]
    Push(String),

    #[error("Command timed out after {0}s")]
    Timeout(u64),

    // Parser errors
    #[error("Parse error: {0}")]
    Parse(String),

    // Path validation errors
    #[error("Path validation failed: {0}")]
    PathValidation(String),

    // Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Result type alias using MendError
pub type Result<T> = std::result::Result<T, MendError>;
