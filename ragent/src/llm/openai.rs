//! OpenAI Chat Completions client implementing [`LlmClient`] (`ChatOpenAI`).
//!
//! Built on `async_openai`. Any endpoint exposing the same API works through
//! [`ChatOpenAI::with_base_url`].
//!
//! # Streaming
//!
//! `invoke_stream` uses `create_stream`: each chunk's `choices[].delta.content` is forwarded as
//! [`LlmDelta::Content`] and `choices[].delta.tool_calls` fragments as [`LlmDelta::ToolCall`],
//! accumulated by the provider's `index`. Event framing and UTF-8 decoding across network
//! reads are handled by the client library.
//!
//! Request timeouts are left to the caller; the agent step wraps every call in its own model
//! timeout.

use std::collections::BTreeMap;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessage, ChatCompletionTool, ChatCompletionTools,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionStreamResponse, FunctionCall, FunctionObject,
    },
    Client,
};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, trace};

use super::{LlmClient, LlmDelta, LlmResponse, LlmUsage, ToolCallDelta};
use crate::error::AgentError;
use crate::message::Message;
use crate::state::ToolCall;
use crate::tools::ToolSpec;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat model behind `POST {base_url}/chat/completions`.
pub struct ChatOpenAI {
    config: OpenAIConfig,
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl ChatOpenAI {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.into())
            .with_api_base(DEFAULT_BASE_URL);
        Self::with_config(config, model)
    }

    /// Client with a custom `async_openai` config (key, base URL, organization).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config.clone()),
            config,
            model: model.into(),
            temperature: None,
        }
    }

    /// Base URL including the version segment, e.g. `http://localhost:8000/v1`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        self.config = self.config.with_api_base(base);
        self.client = Client::with_config(self.config.clone());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        parallel_tool_calls: bool,
        stream: bool,
    ) -> Result<CreateChatCompletionRequest, AgentError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(messages_to_request(messages)?);
        if stream {
            args.stream(true);
        }
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        if !tools.is_empty() {
            let chat_tools: Vec<ChatCompletionTools> = tools
                .iter()
                .map(|t| {
                    ChatCompletionTools::Function(ChatCompletionTool {
                        function: FunctionObject {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: Some(t.input_schema.clone()),
                            ..Default::default()
                        },
                    })
                })
                .collect();
            args.tools(chat_tools);
            args.parallel_tool_calls(parallel_tool_calls);
        }
        args.build()
            .map_err(|e| AgentError::ModelInvocation(format!("request build failed: {}", e)))
    }
}

fn messages_to_request(
    messages: &[Message],
) -> Result<Vec<ChatCompletionRequestMessage>, AgentError> {
    let build_err = |e: async_openai::error::OpenAIError| {
        AgentError::ModelInvocation(format!("request build failed: {}", e))
    };
    messages
        .iter()
        .map(|m| {
            Ok(match m {
                Message::System { content, .. } => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(content.as_str()),
                ),
                Message::User { content, .. } => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(content.as_str()),
                ),
                Message::Assistant {
                    content,
                    tool_calls,
                    ..
                } if tool_calls.is_empty() => {
                    ChatCompletionRequestMessage::Assistant(content.as_str().into())
                }
                Message::Assistant {
                    content,
                    tool_calls,
                    ..
                } => {
                    let calls: Vec<ChatCompletionMessageToolCalls> = tool_calls
                        .iter()
                        .map(|tc| {
                            ChatCompletionMessageToolCalls::Function(
                                ChatCompletionMessageToolCall {
                                    id: tc.id.clone(),
                                    function: FunctionCall {
                                        name: tc.name.clone(),
                                        arguments: tc.arguments.clone(),
                                    },
                                },
                            )
                        })
                        .collect();
                    let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                    if !content.is_empty() {
                        args.content(content.as_str());
                    }
                    args.tool_calls(calls).build().map_err(build_err)?.into()
                }
                Message::Tool {
                    call_id, content, ..
                } => ChatCompletionRequestToolMessageArgs::default()
                    .content(content.as_str())
                    .tool_call_id(call_id.as_str())
                    .build()
                    .map_err(build_err)?
                    .into(),
            })
        })
        .collect()
}

/// Folds stream chunks into deltas and the final response.
#[derive(Default)]
struct StreamAccumulator {
    content: String,
    /// index -> (id, name, arguments)
    tool_calls: BTreeMap<u32, (String, String, String)>,
    usage: Option<LlmUsage>,
}

impl StreamAccumulator {
    fn push(&mut self, chunk: CreateChatCompletionStreamResponse) -> Vec<LlmDelta> {
        if let Some(u) = &chunk.usage {
            self.usage = Some(LlmUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            });
        }
        let mut deltas = Vec::new();
        for choice in chunk.choices {
            let delta = choice.delta;
            if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
                self.content.push_str(&text);
                deltas.push(LlmDelta::Content(text));
            }
            for tc in delta.tool_calls.unwrap_or_default() {
                let entry = self.tool_calls.entry(tc.index).or_default();
                let id = tc.id.filter(|id| !id.is_empty());
                if let Some(id) = &id {
                    entry.0 = id.clone();
                }
                let (name, arguments) = match tc.function {
                    Some(f) => (f.name, f.arguments.unwrap_or_default()),
                    None => (None, String::new()),
                };
                if let Some(n) = &name {
                    entry.1.push_str(n);
                }
                entry.2.push_str(&arguments);
                deltas.push(LlmDelta::ToolCall(ToolCallDelta {
                    index: tc.index as usize,
                    call_id: id,
                    name,
                    arguments_delta: arguments,
                }));
            }
        }
        deltas
    }

    /// Tool calls come out in provider-index order.
    fn finish(self) -> LlmResponse {
        LlmResponse {
            content: self.content,
            tool_calls: self
                .tool_calls
                .into_values()
                .map(|(id, name, arguments)| ToolCall::new(id, name, arguments))
                .collect(),
            usage: self.usage,
        }
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        parallel_tool_calls: bool,
    ) -> Result<LlmResponse, AgentError> {
        let request = self.build_request(messages, tools, parallel_tool_calls, false)?;
        debug!(
            model = %self.model,
            message_count = messages.len(),
            tools_count = tools.len(),
            "OpenAI chat create"
        );
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::ModelInvocation(format!("OpenAI API error: {}", e)))?;

        let usage = response.usage.as_ref().map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::ModelInvocation("OpenAI returned no choices".to_string()))?;
        let msg = choice.message;
        let tool_calls = msg
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tc| match tc {
                ChatCompletionMessageToolCalls::Function(f) => Some(ToolCall::new(
                    f.id,
                    f.function.name,
                    f.function.arguments,
                )),
                _ => None,
            })
            .collect();
        Ok(LlmResponse {
            content: msg.content.unwrap_or_default(),
            tool_calls,
            usage,
        })
    }

    async fn invoke_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        parallel_tool_calls: bool,
        delta_tx: Option<mpsc::Sender<LlmDelta>>,
    ) -> Result<LlmResponse, AgentError> {
        let Some(delta_tx) = delta_tx else {
            return self.invoke(messages, tools, parallel_tool_calls).await;
        };
        let request = self.build_request(messages, tools, parallel_tool_calls, true)?;
        debug!(
            model = %self.model,
            message_count = messages.len(),
            tools_count = tools.len(),
            stream = true,
            "OpenAI chat create_stream"
        );
        let mut stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| AgentError::ModelInvocation(format!("OpenAI stream error: {}", e)))?;

        let mut acc = StreamAccumulator::default();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| AgentError::ModelInvocation(format!("OpenAI stream error: {}", e)))?;
            for delta in acc.push(chunk) {
                // Receiver gone means the turn was cancelled; keep draining for the result.
                let _ = delta_tx.send(delta).await;
            }
        }
        let response = acc.finish();
        trace!(
            content = %response.content,
            tool_calls = response.tool_calls.len(),
            usage = ?response.usage,
            "OpenAI stream response"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn chunk(delta: serde_json::Value) -> CreateChatCompletionStreamResponse {
        serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 0,
            "model": "gpt-4o-mini",
            "choices": [{ "index": 0, "delta": delta, "finish_reason": null }]
        }))
        .unwrap()
    }

    #[test]
    fn request_forwards_tools_and_parallel_flag() {
        let llm = ChatOpenAI::new("k", "gpt-4o-mini").with_temperature(0.3);
        let tools = vec![ToolSpec {
            name: "get_name_of_user".into(),
            description: None,
            input_schema: json!({"type": "object", "properties": {}}),
        }];
        let req = llm
            .build_request(&[Message::user("hi")], &tools, false, true)
            .unwrap();
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["parallel_tool_calls"], false);
        assert_eq!(body["tools"][0]["function"]["name"], "get_name_of_user");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "user");

        let req = llm
            .build_request(&[Message::user("hi")], &[], false, false)
            .unwrap();
        let body = serde_json::to_value(&req).unwrap();
        assert!(body.get("parallel_tool_calls").is_none());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn assistant_calls_and_tool_results_map_to_api_shape() {
        let messages = [
            Message::assistant_with_tool_calls(
                "",
                vec![ToolCall::new("c1", "get_weather_update", r#"{"city":"Oslo"}"#)],
            ),
            Message::tool("c1", "It is snowing: -3 degrees celsius in Oslo", false),
        ];
        let body = serde_json::to_value(messages_to_request(&messages).unwrap()).unwrap();
        assert_eq!(body[0]["role"], "assistant");
        assert_eq!(body[0]["tool_calls"][0]["id"], "c1");
        assert_eq!(body[0]["tool_calls"][0]["function"]["name"], "get_weather_update");
        assert_eq!(body[1]["role"], "tool");
        assert_eq!(body[1]["tool_call_id"], "c1");
    }

    #[test]
    fn stream_chunks_accumulate_content_and_tool_calls_by_index() {
        let mut acc = StreamAccumulator::default();
        let mut deltas = Vec::new();
        deltas.extend(acc.push(chunk(json!({"content": "15"}))));
        deltas.extend(acc.push(chunk(json!({"content": "°C"}))));
        deltas.extend(acc.push(chunk(json!({"tool_calls": [
            {"index": 4, "id": "c9", "type": "function",
             "function": {"name": "get_weather_update", "arguments": ""}}
        ]}))));
        deltas.extend(acc.push(chunk(json!({"tool_calls": [
            {"index": 4, "function": {"arguments": "{\"city\":\"Paris\"}"}}
        ]}))));
        assert_eq!(deltas.len(), 4);
        assert_eq!(
            deltas[3],
            LlmDelta::ToolCall(ToolCallDelta {
                index: 4,
                call_id: None,
                name: None,
                arguments_delta: r#"{"city":"Paris"}"#.into(),
            })
        );
        let resp = acc.finish();
        assert_eq!(resp.content, "15°C");
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].id, "c9");
        assert_eq!(resp.tool_calls[0].arguments, r#"{"city":"Paris"}"#);
    }

    #[tokio::test]
    async fn invoke_with_unreachable_base_returns_error() {
        let llm = ChatOpenAI::new("test-key", "gpt-4o-mini").with_base_url("http://127.0.0.1:1/v1");
        let err = llm
            .invoke(&[Message::user("Hello")], &[], false)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
