//! Error types for workflow operations.

use thiserror::Error;

/// Errors surfaced by workflow operations.
///
/// Every failure an operation can report falls into one of three kinds:
/// a precondition that was not met, a gateway request that failed, or an
/// operation of the same kind already being in flight.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("precondition not met: {0}")]
    Precondition(String),
    #[error("gateway request failed: {0}")]
    Gateway(String),
    #[error("{0} already in progress")]
    AlreadyInProgress(&'static str),
}

/// Convenience alias for workflow-level results.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl From<reqwest::Error> for WorkflowError {
    fn from(err: reqwest::Error) -> Self {
        WorkflowError::Gateway(err.to_string())
    }
}

impl From<url::ParseError> for WorkflowError {
    fn from(err: url::ParseError) -> Self {
        WorkflowError::Gateway(format!("invalid url: {}", err))
    }
}
