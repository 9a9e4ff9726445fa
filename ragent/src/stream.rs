//! Run events: the closed set of variants a turn streams to its consumer.
//!
//! One turn yields `RunStarted`, then per stage `StepStarted`/`StepFinished` with the message,
//! tool-call and usage events in between, and ends with exactly one of `RunFinished` or
//! `RunError`. A stream never restarts; a new turn is a new stream.

use tokio::sync::mpsc;

use crate::agent::Stage;
use crate::llm::LlmUsage;

#[derive(Clone, Debug, PartialEq)]
pub enum RunEvent {
    RunStarted {
        thread_id: String,
        run_id: String,
    },
    StepStarted {
        stage: Stage,
    },
    StepFinished {
        stage: Stage,
    },
    /// First content delta of an assistant message. `message_id` is the id the message is
    /// appended under.
    TextMessageStart {
        message_id: String,
    },
    TextMessageContent {
        message_id: String,
        delta: String,
    },
    TextMessageEnd {
        message_id: String,
    },
    ToolCallStart {
        call_id: String,
        name: String,
        parent_message_id: String,
    },
    ToolCallArgs {
        call_id: String,
        delta: String,
    },
    ToolCallEnd {
        call_id: String,
    },
    /// A tool result was appended; `message_id` is the tool message id.
    ToolCallResult {
        message_id: String,
        call_id: String,
        content: String,
        is_error: bool,
    },
    Usage(LlmUsage),
    RunFinished {
        thread_id: String,
        run_id: String,
    },
    RunError {
        code: String,
        message: String,
    },
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RunFinished { .. } | Self::RunError { .. })
    }
}

/// Producer side of the event channel. A sink without a channel drops every event, which is
/// how the non-streaming entry point runs the same nodes.
#[derive(Clone, Debug, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<RunEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<RunEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Sends one event. A closed channel is ignored; cancellation is signalled separately.
    pub async fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event).await;
        }
    }
}
