//! Conversation messages: a sum type over the four roles.
//!
//! Every message carries a stable `id` (uuid v4 by default) so streaming deltas and tool
//! results can be correlated by transports.

use serde::{Deserialize, Serialize};

use crate::state::ToolCall;

/// Role of a message, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// One entry of the conversation log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        id: String,
        content: String,
    },
    User {
        id: String,
        content: String,
    },
    /// Model output; `tool_calls` is empty for a plain answer.
    Assistant {
        id: String,
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Result of exactly one tool call.
    Tool {
        id: String,
        call_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

/// Fresh message id.
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            id: new_message_id(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            id: new_message_id(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::assistant_with_tool_calls(content, Vec::new())
    }

    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            id: new_message_id(),
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool(call_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        Self::Tool {
            id: new_message_id(),
            call_id: call_id.into(),
            content: content.into(),
            is_error,
        }
    }

    /// Replaces the generated id, e.g. to reuse the id announced by streaming events.
    pub fn with_id(mut self, new_id: impl Into<String>) -> Self {
        let new_id = new_id.into();
        match &mut self {
            Self::System { id, .. }
            | Self::User { id, .. }
            | Self::Assistant { id, .. }
            | Self::Tool { id, .. } => *id = new_id,
        }
        self
    }

    pub fn id(&self) -> &str {
        match self {
            Self::System { id, .. }
            | Self::User { id, .. }
            | Self::Assistant { id, .. }
            | Self::Tool { id, .. } => id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::Tool { .. } => Role::Tool,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::System { content, .. }
            | Self::User { content, .. }
            | Self::Assistant { content, .. }
            | Self::Tool { content, .. } => content,
        }
    }

    /// Tool calls requested by an assistant message; empty for every other role.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_assign_distinct_ids() {
        let a = Message::user("hi");
        let b = Message::user("hi");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.role(), Role::User);
    }

    #[test]
    fn with_id_overrides_generated_id() {
        let m = Message::assistant("ok").with_id("msg-1");
        assert_eq!(m.id(), "msg-1");
        assert_eq!(m.content(), "ok");
    }

    #[test]
    fn serializes_with_role_tag_and_skips_empty_tool_calls() {
        let m = Message::assistant("done").with_id("m1");
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["role"], "assistant");
        assert_eq!(v["id"], "m1");
        assert!(v.get("tool_calls").is_none());

        let back: Message = serde_json::from_value(v).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn tool_calls_only_on_assistant() {
        let call = ToolCall::new("c1", "get_name_of_user", "{}");
        let a = Message::assistant_with_tool_calls("", vec![call]);
        assert_eq!(a.tool_calls().len(), 1);
        assert!(Message::tool("c1", "x", false).tool_calls().is_empty());
    }
}
