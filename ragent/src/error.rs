//! Loop-level error type for one agent turn.
//!
//! Every variant here is fatal to the current turn. Tool-level failures never reach this
//! type: the tool execution node turns them into error tool results (see [`crate::tools::ToolError`]).

use std::time::Duration;

use crate::memory::CheckpointError;
use crate::state::StateError;

/// Fatal error for one turn. Surfaced to stream consumers as a terminal `RunError` event
/// carrying [`AgentError::code`].
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The router or agent step was invoked with zero messages.
    #[error("conversation state is empty")]
    EmptyState,
    /// Run context has no bound model.
    #[error("no model bound to the run context")]
    MissingModel,
    /// The agent step ran `limit` times without reaching a terminate verdict.
    #[error("iteration limit of {limit} agent steps exceeded")]
    IterationLimitExceeded { limit: usize },
    /// Provider failure (transport, HTTP status, malformed response).
    #[error("model invocation failed: {0}")]
    ModelInvocation(String),
    /// Model call did not complete within the configured timeout.
    #[error("model invocation timed out after {0:?}")]
    ModelTimeout(Duration),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("invalid conversation state: {0}")]
    InvalidState(#[from] StateError),
    /// The caller cancelled a streamed turn.
    #[error("turn cancelled by caller")]
    Cancelled,
}

impl AgentError {
    /// Stable machine-readable code for transports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyState => "EMPTY_STATE",
            Self::MissingModel => "MISSING_MODEL",
            Self::IterationLimitExceeded { .. } => "ITERATION_LIMIT_EXCEEDED",
            Self::ModelInvocation(_) => "MODEL_INVOCATION",
            Self::ModelTimeout(_) => "MODEL_TIMEOUT",
            Self::Checkpoint(_) => "CHECKPOINT",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// True for failures a caller may retry on the same thread (the checkpoint still holds
    /// everything appended before the failure).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ModelInvocation(_) | Self::ModelTimeout(_))
    }
}
