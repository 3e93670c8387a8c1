use thiserror::Error;

#[derive(Debug, Error)]
pub enum StepformError {
    #[error("invalid wizard definition: {0}")]
    InvalidDefinition(String),

    #[error("step index {index} out of range (wizard has {len} steps)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("type mismatch at '{path}': expected {expected}")]
    TypeMismatch { path: String, expected: String },

    #[error("cannot complete: {0}")]
    PrematureCompletion(String),

    #[error("wizard session already completed")]
    AlreadyCompleted,

    #[error("wizard session was cancelled")]
    SessionCancelled,

    #[error("step not found: {0}")]
    StepNotFound(String),

    #[error("wizard not found: {0}")]
    WizardNotFound(String),

    #[error("wizard '{id}' defined twice: {first} and {second}")]
    DuplicateWizard {
        id: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StepformError>;
