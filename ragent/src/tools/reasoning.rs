//! Reasoning tool: `reason` re-enters the bound model on the settled history, without tools,
//! and returns its analysis as the tool result.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Tool, ToolCallContent, ToolCallContext, ToolError, ToolSpec};
use crate::message::Message;

/// Tool name for explicit reasoning.
pub const TOOL_REASON: &str = "reason";

const REASONING_INSTRUCTION: &str = "Reflect on the conversation so far. Summarize what is \
known, what is still missing, and which step should come next. Do not call tools.";

#[derive(Default)]
pub struct ReasonTool;

impl ReasonTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for ReasonTool {
    fn name(&self) -> &str {
        TOOL_REASON
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_REASON.to_string(),
            description: Some(
                "Think step by step about the conversation so far before acting. \
                 Returns an analysis of what is known and what to do next."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "focus": {
                        "type": "string",
                        "description": "Optional question or aspect to reason about."
                    }
                }
            }),
        }
    }

    async fn call(
        &self,
        args: Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolError> {
        let ctx = ctx.ok_or_else(|| ToolError::MissingContext("conversation history".into()))?;
        let model = ctx
            .model
            .as_ref()
            .ok_or_else(|| ToolError::MissingContext("bound model".into()))?;

        let instruction = match args.get("focus").and_then(Value::as_str) {
            Some(focus) if !focus.trim().is_empty() => {
                format!("{}\nFocus: {}", REASONING_INSTRUCTION, focus.trim())
            }
            _ => REASONING_INSTRUCTION.to_string(),
        };
        let mut messages = ctx.messages.clone();
        messages.push(Message::user(instruction));

        let response = model
            .invoke(&messages, &[], false)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        let text = response.content.trim();
        if text.is_empty() {
            return Ok(ToolCallContent::text("No further reasoning produced."));
        }
        Ok(ToolCallContent::text(text))
    }
}
