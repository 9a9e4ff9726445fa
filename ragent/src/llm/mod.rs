//! Model binding: the seam between the agent step and a chat-completion provider.
//!
//! The agent step calls [`LlmClient::invoke_stream`] with the full history, the tool schemas
//! and `parallel_tool_calls = false`. Deltas arrive on one channel ([`LlmDelta`]) so content
//! and tool-call fragments keep the order the provider produced them in. The returned
//! [`LlmResponse`] is authoritative; deltas only drive streaming events.

mod mock;
pub(crate) mod openai;

pub use mock::{MockLlm, RecordedCall};
pub use openai::ChatOpenAI;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::AgentError;
use crate::message::Message;
use crate::state::ToolCall;
use crate::tools::ToolSpec;

/// Fragment of one tool call from a streaming provider.
///
/// `index` identifies the call within the response; `call_id` and `name` usually arrive on the
/// first fragment only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCallDelta {
    pub index: usize,
    pub call_id: Option<String>,
    pub name: Option<String>,
    pub arguments_delta: String,
}

/// One streaming increment from the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LlmDelta {
    Content(String),
    ToolCall(ToolCallDelta),
}

/// Token usage for one model call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn add(&mut self, other: &LlmUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Complete model output for one call: assistant text and requested tool calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    /// Empty means a plain answer.
    pub tool_calls: Vec<ToolCall>,
    /// Token usage, when the provider reports it.
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: LlmUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Chat model client.
///
/// Implementations: [`ChatOpenAI`] (OpenAI-compatible HTTP API) and [`MockLlm`] (scripted,
/// for tests and offline runs).
///
/// **Interaction**: called by the agent step with tools attached and by the `reason` tool
/// without tools.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single call: history in, complete assistant output back.
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        parallel_tool_calls: bool,
    ) -> Result<LlmResponse, AgentError>;

    /// Streaming variant. When `delta_tx` is `Some`, implementations send deltas as they
    /// arrive and still return the complete response at the end.
    ///
    /// Default implementation calls [`invoke`](Self::invoke), then sends the whole content as
    /// one delta followed by one delta per tool call.
    async fn invoke_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        parallel_tool_calls: bool,
        delta_tx: Option<mpsc::Sender<LlmDelta>>,
    ) -> Result<LlmResponse, AgentError> {
        let response = self.invoke(messages, tools, parallel_tool_calls).await?;
        if let Some(tx) = delta_tx {
            if !response.content.is_empty() {
                let _ = tx.send(LlmDelta::Content(response.content.clone())).await;
            }
            for (index, tc) in response.tool_calls.iter().enumerate() {
                let _ = tx
                    .send(LlmDelta::ToolCall(ToolCallDelta {
                        index,
                        call_id: Some(tc.id.clone()),
                        name: Some(tc.name.clone()),
                        arguments_delta: tc.arguments.clone(),
                    }))
                    .await;
            }
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubLlm;

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn invoke(
            &self,
            _messages: &[Message],
            _tools: &[ToolSpec],
            _parallel_tool_calls: bool,
        ) -> Result<LlmResponse, AgentError> {
            Ok(LlmResponse::with_tool_calls(
                "checking",
                vec![ToolCall::new("c1", "get_name_of_user", "{}")],
            ))
        }
    }

    #[tokio::test]
    async fn default_stream_sends_content_then_tool_calls() {
        let (tx, mut rx) = mpsc::channel(8);
        let resp = StubLlm
            .invoke_stream(&[Message::user("hi")], &[], false, Some(tx))
            .await
            .unwrap();
        assert_eq!(resp.tool_calls.len(), 1);

        assert_eq!(rx.recv().await, Some(LlmDelta::Content("checking".into())));
        match rx.recv().await {
            Some(LlmDelta::ToolCall(d)) => {
                assert_eq!(d.index, 0);
                assert_eq!(d.call_id.as_deref(), Some("c1"));
                assert_eq!(d.name.as_deref(), Some("get_name_of_user"));
            }
            other => panic!("unexpected delta: {:?}", other),
        }
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn usage_accumulates() {
        let mut total = LlmUsage::default();
        let u = LlmUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        };
        total.add(&u);
        total.add(&u);
        assert_eq!(total.total_tokens, 30);
    }
}
