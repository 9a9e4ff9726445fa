//! Bridge from [`RunEvent`] to the `stream-event` wire format.

use serde_json::json;
use stream_event::ProtocolEvent;

use crate::stream::RunEvent;

impl From<&RunEvent> for ProtocolEvent {
    fn from(event: &RunEvent) -> Self {
        match event {
            RunEvent::RunStarted { thread_id, run_id } => ProtocolEvent::RunStarted {
                thread_id: thread_id.clone(),
                run_id: run_id.clone(),
            },
            RunEvent::StepStarted { stage } => ProtocolEvent::StepStarted {
                step_name: stage.as_str().to_string(),
            },
            RunEvent::StepFinished { stage } => ProtocolEvent::StepFinished {
                step_name: stage.as_str().to_string(),
            },
            RunEvent::TextMessageStart { message_id } => ProtocolEvent::TextMessageStart {
                message_id: message_id.clone(),
                role: "assistant".to_string(),
            },
            RunEvent::TextMessageContent { message_id, delta } => {
                ProtocolEvent::TextMessageContent {
                    message_id: message_id.clone(),
                    delta: delta.clone(),
                }
            }
            RunEvent::TextMessageEnd { message_id } => ProtocolEvent::TextMessageEnd {
                message_id: message_id.clone(),
            },
            RunEvent::ToolCallStart {
                call_id,
                name,
                parent_message_id,
            } => ProtocolEvent::ToolCallStart {
                tool_call_id: call_id.clone(),
                tool_call_name: name.clone(),
                parent_message_id: Some(parent_message_id.clone()),
            },
            RunEvent::ToolCallArgs { call_id, delta } => ProtocolEvent::ToolCallArgs {
                tool_call_id: call_id.clone(),
                delta: delta.clone(),
            },
            RunEvent::ToolCallEnd { call_id } => ProtocolEvent::ToolCallEnd {
                tool_call_id: call_id.clone(),
            },
            RunEvent::ToolCallResult {
                message_id,
                call_id,
                content,
                is_error,
            } => ProtocolEvent::ToolCallResult {
                message_id: message_id.clone(),
                tool_call_id: call_id.clone(),
                content: content.clone(),
                is_error: *is_error,
            },
            RunEvent::Usage(u) => ProtocolEvent::Custom {
                name: "usage".to_string(),
                value: json!({
                    "promptTokens": u.prompt_tokens,
                    "completionTokens": u.completion_tokens,
                    "totalTokens": u.total_tokens,
                }),
            },
            RunEvent::RunFinished { thread_id, run_id } => ProtocolEvent::RunFinished {
                thread_id: thread_id.clone(),
                run_id: run_id.clone(),
            },
            RunEvent::RunError { code, message } => ProtocolEvent::RunError {
                message: message.clone(),
                code: Some(code.clone()),
            },
        }
    }
}

impl From<RunEvent> for ProtocolEvent {
    fn from(event: RunEvent) -> Self {
        ProtocolEvent::from(&event)
    }
}
