//! The agent loop: stages, the two node functions and the turn runner.

mod initial_state;
mod machine;
mod runner;
mod step;
mod tool_exec;

use std::sync::Arc;

pub use initial_state::prepare_turn_state;
pub use machine::Stage;
pub use runner::{ReactAgent, RunStream, TurnOutput};
pub use step::{agent_step, StepOutcome};
pub use tool_exec::{execute_tool_call, execute_tools, tool_error_content};

use crate::error::AgentError;
use crate::memory::Checkpointer;
use crate::message::Message;
use crate::state::ConversationState;
use crate::stream::{EventSink, RunEvent};

/// Where one turn writes: the thread's checkpoint and the event sink.
///
/// Every message a node produces goes through [`TurnScope::commit`], so the checkpoint always
/// holds the state up to the last successful append.
#[derive(Clone)]
pub struct TurnScope {
    pub thread_id: String,
    pub checkpointer: Arc<dyn Checkpointer>,
    pub sink: EventSink,
}

impl TurnScope {
    pub fn new(thread_id: impl Into<String>, checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self {
            thread_id: thread_id.into(),
            checkpointer,
            sink: EventSink::none(),
        }
    }

    pub fn with_sink(mut self, sink: EventSink) -> Self {
        self.sink = sink;
        self
    }

    /// Appends `message` and checkpoints the new state.
    pub async fn commit(
        &self,
        state: &mut ConversationState,
        message: Message,
    ) -> Result<(), AgentError> {
        state.append(message)?;
        self.checkpointer.put(&self.thread_id, state).await?;
        Ok(())
    }

    pub async fn emit(&self, event: RunEvent) {
        self.sink.emit(event).await;
    }
}
