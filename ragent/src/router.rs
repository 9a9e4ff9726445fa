//! Router: pure decision from the last message to the next stage.
//!
//! The continuation sentinel is a plain substring match on assistant text. A model that
//! quotes the sentinel in a final answer loops again; the iteration cap bounds that.

use crate::context::RunContext;
use crate::error::AgentError;
use crate::message::Message;
use crate::state::ConversationState;

/// Verdict of the router.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    ContinueReasoning,
    ExecuteTools,
    Terminate,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContinueReasoning => "continue_reasoning",
            Self::ExecuteTools => "execute_tools",
            Self::Terminate => "terminate",
        }
    }
}

/// Rules, in order:
/// 1. tool result last: continue reasoning;
/// 2. assistant with tool calls: execute tools;
/// 3. assistant whose text contains the sentinel: continue reasoning;
/// 4. any other assistant reply: terminate.
///
/// A user or system message last (fresh input) continues reasoning.
pub fn route(state: &ConversationState, ctx: &RunContext) -> Result<Route, AgentError> {
    let last = state.last().ok_or(AgentError::EmptyState)?;
    let verdict = match last {
        Message::Tool { .. } => Route::ContinueReasoning,
        Message::Assistant { tool_calls, .. } if !tool_calls.is_empty() => Route::ExecuteTools,
        Message::Assistant { content, .. } => {
            let sentinel = ctx.continuation_sentinel.as_str();
            if !sentinel.is_empty() && content.contains(sentinel) {
                Route::ContinueReasoning
            } else {
                Route::Terminate
            }
        }
        Message::User { .. } | Message::System { .. } => Route::ContinueReasoning,
    };
    Ok(verdict)
}
