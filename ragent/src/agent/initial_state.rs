//! Builds the state a turn starts from: the thread's checkpoint or a freshly seeded history,
//! plus the inbound message.

use tracing::{debug, warn};

use super::TurnScope;
use crate::context::RunContext;
use crate::error::AgentError;
use crate::message::Message;
use crate::prompts::{few_shot_messages, INTERRUPTED_TOOL_RESULT};
use crate::state::ConversationState;

/// Loads the thread's state, or seeds it on the first turn, then appends `input`.
///
/// - No checkpoint: the system prompt (when non-empty) and, with `ctx.few_shot`, the few-shot
///   transcript are appended first.
/// - Checkpoint whose last assistant message still has unanswered calls (a cancelled turn):
///   each such call gets an error result so the history stays well-formed.
///
/// Every append is checkpointed.
pub async fn prepare_turn_state(
    scope: &TurnScope,
    ctx: &RunContext,
    input: Message,
) -> Result<ConversationState, AgentError> {
    let mut state = match scope.checkpointer.get(&scope.thread_id).await? {
        Some(checkpoint) => {
            debug!(step = checkpoint.step, messages = checkpoint.state.len(), "resuming thread");
            let mut state = checkpoint.state;
            for call in state.pending_tool_calls() {
                warn!(tool = %call.name, call_id = %call.id, "closing tool call left by an interrupted turn");
                scope
                    .commit(&mut state, Message::tool(call.id, INTERRUPTED_TOOL_RESULT, true))
                    .await?;
            }
            state
        }
        None => {
            debug!("first turn: seeding thread");
            let mut state = ConversationState::new();
            if !ctx.system_prompt.is_empty() {
                scope
                    .commit(&mut state, Message::system(ctx.system_prompt.clone()))
                    .await?;
            }
            if ctx.few_shot {
                for m in few_shot_messages() {
                    scope.commit(&mut state, m).await?;
                }
            }
            state
        }
    };
    scope.commit(&mut state, input).await?;
    Ok(state)
}
