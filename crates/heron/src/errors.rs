use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while resolving a tool request. These are never fatal to the
/// conversation: they are converted into error-flagged tool responses so the
/// model can read them and react.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("No tool is registered under the name: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
