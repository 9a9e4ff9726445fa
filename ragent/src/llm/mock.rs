//! Scripted model for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{LlmClient, LlmDelta, LlmResponse, ToolCallDelta};
use crate::error::AgentError;
use crate::message::Message;
use crate::tools::ToolSpec;

/// Inputs of one recorded call.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub parallel_tool_calls: bool,
}

enum Scripted {
    Respond(LlmResponse),
    Fail(String),
}

/// Returns scripted responses in order and records every call.
///
/// Streaming splits content at word boundaries and sends each tool call as a header delta
/// (id and name) followed by its arguments. When the script runs out the call fails, unless
/// the mock was built with [`MockLlm::repeating`].
pub struct MockLlm {
    script: Mutex<VecDeque<Scripted>>,
    repeat: Option<LlmResponse>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlm {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Scripted::Respond).collect()),
            repeat: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers every call with `response`.
    pub fn repeating(response: LlmResponse) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.repeat = Some(response);
        mock
    }

    /// Appends a provider failure to the script.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.lock_script().push_back(Scripted::Fail(message.into()));
        self
    }

    /// Sleeps before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn next_response(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        parallel_tool_calls: bool,
    ) -> Result<LlmResponse, AgentError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                messages: messages.to_vec(),
                tools: tools.to_vec(),
                parallel_tool_calls,
            });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.lock_script().pop_front();
        match next {
            Some(Scripted::Respond(r)) => Ok(r),
            Some(Scripted::Fail(m)) => Err(AgentError::ModelInvocation(m)),
            None => self
                .repeat
                .clone()
                .ok_or_else(|| AgentError::ModelInvocation("mock script exhausted".to_string())),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        parallel_tool_calls: bool,
    ) -> Result<LlmResponse, AgentError> {
        self.next_response(messages, tools, parallel_tool_calls).await
    }

    async fn invoke_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        parallel_tool_calls: bool,
        delta_tx: Option<mpsc::Sender<LlmDelta>>,
    ) -> Result<LlmResponse, AgentError> {
        let response = self.next_response(messages, tools, parallel_tool_calls).await?;
        let Some(tx) = delta_tx else {
            return Ok(response);
        };
        for word in response.content.split_inclusive(' ') {
            let _ = tx.send(LlmDelta::Content(word.to_string())).await;
        }
        for (index, tc) in response.tool_calls.iter().enumerate() {
            let _ = tx
                .send(LlmDelta::ToolCall(ToolCallDelta {
                    index,
                    call_id: Some(tc.id.clone()),
                    name: Some(tc.name.clone()),
                    arguments_delta: String::new(),
                }))
                .await;
            if !tc.arguments.is_empty() {
                let _ = tx
                    .send(LlmDelta::ToolCall(ToolCallDelta {
                        index,
                        call_id: None,
                        name: None,
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
    use crate::state::ToolCall;

    #[tokio::test]
    async fn script_then_exhausted() {
        let mock = MockLlm::new(vec![LlmResponse::text("a"), LlmResponse::text("b")]);
        let msgs = [Message::user("x")];
        assert_eq!(mock.invoke(&msgs, &[], false).await.unwrap().content, "a");
        assert_eq!(mock.invoke(&msgs, &[], false).await.unwrap().content, "b");
        assert!(matches!(
            mock.invoke(&msgs, &[], false).await,
            Err(AgentError::ModelInvocation(_))
        ));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn scripted_failure() {
        let mock = MockLlm::new(vec![]).then_fail("503 from provider");
        let err = mock.invoke(&[Message::user("x")], &[], false).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn stream_splits_words_and_tool_calls() {
        let mock = MockLlm::new(vec![LlmResponse::with_tool_calls(
            "Let me check.",
            vec![ToolCall::new("c1", "get_weather_update", r#"{"city":"Paris"}"#)],
        )]);
        let (tx, mut rx) = mpsc::channel(16);
        mock.invoke_stream(&[Message::user("x")], &[], false, Some(tx))
            .await
            .unwrap();
        let mut deltas = Vec::new();
        while let Some(d) = rx.recv().await {
            deltas.push(d);
        }
        assert_eq!(deltas[0], LlmDelta::Content("Let ".into()));
        assert_eq!(deltas[1], LlmDelta::Content("me ".into()));
        assert_eq!(deltas[2], LlmDelta::Content("check.".into()));
        assert_eq!(deltas.len(), 5);
    }
}
