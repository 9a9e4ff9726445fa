//! Conversation state: the append-only message log of one thread, plus the tool call and
//! tool result types exchanged between the agent step and the tool execution node.
//!
//! # Append rule
//!
//! [`ConversationState::append`] is the only mutation. It enforces:
//!
//! - message ids are unique; re-appending an identical message is a no-op, a different
//!   message under an existing id is rejected;
//! - call ids within one assistant message are unique;
//! - a tool message answers a call of the most recent assistant message, at most once.
//!
//! # Example
//!
//! ```rust
//! use ragent::{ConversationState, Message, ToolCall};
//!
//! let mut state = ConversationState::new();
//! state.append(Message::system("You are helpful.")).unwrap();
//! state.append(Message::user("Who am I?")).unwrap();
//! state
//!     .append(Message::assistant_with_tool_calls(
//!         "",
//!         vec![ToolCall::new("call_1", "get_name_of_user", "{}")],
//!     ))
//!     .unwrap();
//! assert_eq!(state.pending_tool_calls().len(), 1);
//! state.append(Message::tool("call_1", "Name: Ada", false)).unwrap();
//! assert!(state.pending_tool_calls().is_empty());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{Message, Role};

/// One tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id, unique within its assistant message.
    pub id: String,
    pub name: String,
    /// Raw JSON argument text as produced by the model.
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parses `arguments`; blank text is treated as an empty object.
    pub fn parsed_arguments(&self) -> Result<Value, serde_json::Error> {
        if self.arguments.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&self.arguments)
    }
}

/// Outcome of one tool call, produced by the tool execution node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn into_message(self) -> Message {
        Message::tool(self.call_id, self.content, self.is_error)
    }
}

/// Violation of the append rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("message id {0} already present with different content")]
    ConflictingMessage(String),
    #[error("duplicate tool call id {0} in one assistant message")]
    DuplicateCallId(String),
    #[error("tool result for call {0} does not match the latest assistant message")]
    OrphanToolResult(String),
    #[error("tool call {0} already has a result")]
    DuplicateToolResult(String),
}

/// Ordered message log for one thread.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state by appending `messages` in order.
    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Result<Self, StateError> {
        let mut state = Self::new();
        for m in messages {
            state.append(m)?;
        }
        Ok(state)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends one message, enforcing the module-level append rule.
    pub fn append(&mut self, message: Message) -> Result<(), StateError> {
        if let Some(existing) = self.messages.iter().find(|m| m.id() == message.id()) {
            if *existing == message {
                return Ok(());
            }
            return Err(StateError::ConflictingMessage(message.id().to_string()));
        }
        match &message {
            Message::Assistant { tool_calls, .. } => {
                let mut seen = std::collections::HashSet::new();
                for tc in tool_calls {
                    if !seen.insert(tc.id.as_str()) {
                        return Err(StateError::DuplicateCallId(tc.id.clone()));
                    }
                }
            }
            Message::Tool { call_id, .. } => {
                let idx = self
                    .last_assistant_index()
                    .ok_or_else(|| StateError::OrphanToolResult(call_id.clone()))?;
                if !self.messages[idx].tool_calls().iter().any(|tc| &tc.id == call_id) {
                    return Err(StateError::OrphanToolResult(call_id.clone()));
                }
                let answered = self.messages[idx + 1..].iter().any(
                    |m| matches!(m, Message::Tool { call_id: c, .. } if c == call_id),
                );
                if answered {
                    return Err(StateError::DuplicateToolResult(call_id.clone()));
                }
            }
            Message::System { .. } | Message::User { .. } => {}
        }
        self.messages.push(message);
        Ok(())
    }

    fn last_assistant_index(&self) -> Option<usize> {
        self.messages.iter().rposition(|m| m.role() == Role::Assistant)
    }

    /// Calls of the latest assistant message that have no tool result yet, in request order.
    pub fn pending_tool_calls(&self) -> Vec<ToolCall> {
        let Some(idx) = self.last_assistant_index() else {
            return Vec::new();
        };
        let answered: Vec<&str> = self.messages[idx + 1..]
            .iter()
            .filter_map(|m| match m {
                Message::Tool { call_id, .. } => Some(call_id.as_str()),
                _ => None,
            })
            .collect();
        self.messages[idx]
            .tool_calls()
            .iter()
            .filter(|tc| !answered.contains(&tc.id.as_str()))
            .cloned()
            .collect()
    }

    /// History without a trailing assistant message whose tool calls are still unanswered.
    /// Providers reject such a history, so tools that re-enter the model read this prefix.
    pub fn settled_messages(&self) -> &[Message] {
        if self.pending_tool_calls().is_empty() {
            return &self.messages;
        }
        match self.last_assistant_index() {
            Some(idx) => &self.messages[..idx],
            None => &self.messages,
        }
    }

    /// Content of the latest assistant message without tool calls.
    pub fn last_assistant_reply(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant {
                content,
                tool_calls,
                ..
            } if tool_calls.is_empty() => Some(content.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_call(ids: &[&str]) -> ConversationState {
        let calls = ids
            .iter()
            .map(|id| ToolCall::new(*id, "get_weather_update", "{}"))
            .collect();
        ConversationState::from_messages([
            Message::user("weather?"),
            Message::assistant_with_tool_calls("", calls),
        ])
        .unwrap()
    }

    #[test]
    fn identical_reappend_is_noop() {
        let mut state = ConversationState::new();
        let m = Message::user("hi");
        state.append(m.clone()).unwrap();
        state.append(m).unwrap();
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn conflicting_id_is_rejected() {
        let mut state = ConversationState::new();
        state.append(Message::user("hi").with_id("x")).unwrap();
        let err = state.append(Message::user("bye").with_id("x")).unwrap_err();
        assert_eq!(err, StateError::ConflictingMessage("x".into()));
    }

    #[test]
    fn duplicate_call_ids_rejected() {
        let mut state = ConversationState::new();
        let err = state
            .append(Message::assistant_with_tool_calls(
                "",
                vec![ToolCall::new("a", "t", "{}"), ToolCall::new("a", "t", "{}")],
            ))
            .unwrap_err();
        assert_eq!(err, StateError::DuplicateCallId("a".into()));
    }

    #[test]
    fn tool_result_must_match_latest_assistant() {
        let mut state = with_call(&["c1"]);
        let err = state.append(Message::tool("zzz", "x", false)).unwrap_err();
        assert_eq!(err, StateError::OrphanToolResult("zzz".into()));

        state.append(Message::tool("c1", "ok", false)).unwrap();
        let err = state.append(Message::tool("c1", "again", false)).unwrap_err();
        assert_eq!(err, StateError::DuplicateToolResult("c1".into()));
    }

    #[test]
    fn tool_result_without_assistant_is_orphan() {
        let mut state = ConversationState::new();
        state.append(Message::user("hi")).unwrap();
        assert!(matches!(
            state.append(Message::tool("c1", "x", false)),
            Err(StateError::OrphanToolResult(_))
        ));
    }

    #[test]
    fn pending_calls_shrink_in_order() {
        let mut state = with_call(&["c1", "c2"]);
        let ids: Vec<_> = state.pending_tool_calls().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        state.append(Message::tool("c1", "ok", false)).unwrap();
        let ids: Vec<_> = state.pending_tool_calls().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c2"]);
    }

    #[test]
    fn settled_messages_drop_unanswered_assistant() {
        let mut state = with_call(&["c1"]);
        assert_eq!(state.settled_messages().len(), 1);
        state.append(Message::tool("c1", "ok", false)).unwrap();
        assert_eq!(state.settled_messages().len(), 3);
    }

    #[test]
    fn blank_arguments_parse_as_empty_object() {
        let tc = ToolCall::new("c", "get_name_of_user", "  ");
        assert_eq!(tc.parsed_arguments().unwrap(), serde_json::json!({}));
    }

    #[test]
    fn last_assistant_reply_skips_tool_call_messages() {
        let mut state = with_call(&["c1"]);
        assert_eq!(state.last_assistant_reply(), None);
        state.append(Message::tool("c1", "ok", false)).unwrap();
        state.append(Message::assistant("Sunny.")).unwrap();
        assert_eq!(state.last_assistant_reply(), Some("Sunny."));
    }
}
