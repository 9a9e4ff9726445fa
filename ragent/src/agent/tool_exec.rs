//! Tool execution node: run the pending calls of the latest assistant message, one at a time,
//! in request order, appending one tool result per call.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::TurnScope;
use crate::context::RunContext;
use crate::error::AgentError;
use crate::state::{ConversationState, ToolCall, ToolResult};
use crate::stream::RunEvent;
use crate::tools::{ToolCallContext, ToolError, ToolRegistry};

/// Content of the error tool result for `err`; the model reads it and may retry.
pub fn tool_error_content(err: &ToolError, registry: &ToolRegistry) -> String {
    match err {
        ToolError::UnknownTool(name) => format!(
            "Error: {} is not a valid tool, try one of [{}].",
            name,
            registry.names().join(", ")
        ),
        other => format!("Error: {}\n Please fix your mistakes.", other),
    }
}

/// Resolves, validates and runs one call. Never fails: every tool-level error becomes an
/// error [`ToolResult`].
pub async fn execute_tool_call(
    call: &ToolCall,
    tool_ctx: &ToolCallContext,
    registry: &ToolRegistry,
    timeout: Option<Duration>,
) -> ToolResult {
    let outcome = run_call(call, tool_ctx, registry, timeout).await;
    let (content, is_error) = match outcome {
        Ok(content) => (content, false),
        Err(e) => {
            warn!(tool = %call.name, call_id = %call.id, error = %e, "tool call failed");
            (tool_error_content(&e, registry), true)
        }
    };
    ToolResult {
        call_id: call.id.clone(),
        name: call.name.clone(),
        content,
        is_error,
    }
}

async fn run_call(
    call: &ToolCall,
    tool_ctx: &ToolCallContext,
    registry: &ToolRegistry,
    timeout: Option<Duration>,
) -> Result<String, ToolError> {
    if registry.get(&call.name).is_none() {
        return Err(ToolError::UnknownTool(call.name.clone()));
    }
    let args: Value = call
        .parsed_arguments()
        .map_err(|e| ToolError::InvalidArguments(format!("arguments are not valid JSON: {}", e)))?;
    let fut = registry.call(&call.name, args, Some(tool_ctx));
    let content = match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ToolError::Timeout(limit))??,
        None => fut.await?,
    };
    Ok(content.text)
}

/// Executes every pending call of the latest assistant message.
///
/// Each result is appended and checkpointed before the next call starts. Tools receive the
/// settled history (without the assistant message that requested them) and the bound model.
/// Only state or checkpoint failures abort; tool failures are absorbed as error results.
pub async fn execute_tools(
    state: &mut ConversationState,
    ctx: &RunContext,
    registry: &ToolRegistry,
    scope: &TurnScope,
) -> Result<usize, AgentError> {
    let pending = state.pending_tool_calls();
    for call in &pending {
        let mut tool_ctx = ToolCallContext::new(state.settled_messages().to_vec())
            .with_thread_id(scope.thread_id.clone());
        tool_ctx.model = ctx.model.clone();

        debug!(tool = %call.name, call_id = %call.id, "executing tool call");
        let result = execute_tool_call(call, &tool_ctx, registry, ctx.tool_timeout).await;
        let message = result.clone().into_message();
        let message_id = message.id().to_string();
        scope.commit(state, message).await?;
        scope
            .emit(RunEvent::ToolCallResult {
                message_id,
                call_id: result.call_id,
                content: result.content,
                is_error: result.is_error,
            })
            .await;
    }
    Ok(pending.len())
}
