use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::LlmClient;
use crate::message::Message;

/// Tool definition shown to the model: name, description and JSON schema of the arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Text returned by a tool. Structured results are serialized to JSON text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCallContent {
    pub text: String,
}

impl ToolCallContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn json(value: &Value) -> Self {
        Self {
            text: value.to_string(),
        }
    }
}

/// Recoverable tool failure. The tool execution node turns every variant into an error
/// tool result that is fed back to the model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("tool execution failed: {0}")]
    ExecutionFailed(String),
    #[error("tool timed out after {0:?}")]
    Timeout(Duration),
    #[error("tool requires call context: {0}")]
    MissingContext(String),
}

/// Per-call context handed to tools by the tool execution node.
///
/// `messages` is the settled history: everything before the assistant message whose calls
/// are being executed. `model` is the run's bound model, used by tools that re-enter it.
#[derive(Clone, Default)]
pub struct ToolCallContext {
    pub messages: Vec<Message>,
    pub model: Option<Arc<dyn LlmClient>>,
    pub thread_id: Option<String>,
}

impl ToolCallContext {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            model: None,
            thread_id: None,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn LlmClient>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

impl fmt::Debug for ToolCallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCallContext")
            .field("messages", &self.messages.len())
            .field("model", &self.model.as_ref().map(|_| "<model>"))
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

/// A single tool the model can call.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use ragent::tools::{Tool, ToolCallContent, ToolCallContext, ToolError, ToolSpec};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Tool for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn spec(&self) -> ToolSpec {
///         ToolSpec {
///             name: "echo".to_string(),
///             description: Some("Echo the text back".to_string()),
///             input_schema: serde_json::json!({
///                 "type": "object",
///                 "properties": { "text": { "type": "string" } },
///                 "required": ["text"]
///             }),
///         }
///     }
///
///     async fn call(
///         &self,
///         args: Value,
///         _ctx: Option<&ToolCallContext>,
///     ) -> Result<ToolCallContent, ToolError> {
///         Ok(ToolCallContent::text(args["text"].as_str().unwrap_or_default()))
///     }
/// }
/// ```
///
/// # Interaction
///
/// - **ToolRegistry**: stores tools by name, validates arguments against `spec().input_schema`
///   before `call`.
/// - **ToolExecNode**: builds the [`ToolCallContext`] and applies the tool timeout.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name; the model refers to the tool by it.
    fn name(&self) -> &str;

    fn spec(&self) -> ToolSpec;

    /// Runs the tool. `args` has already been validated and coerced against the schema.
    async fn call(
        &self,
        args: Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolError>;
}
