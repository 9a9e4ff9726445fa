//! Run context: per-invocation configuration handed by reference to every node of one turn.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::llm::LlmClient;
use crate::prompts::{CONTINUATION_SENTINEL, DEFAULT_SYSTEM_PROMPT};
use crate::settings::AgentSettings;

pub const DEFAULT_MAX_ITERATIONS: usize = 20;
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for one external call. Built fresh per call, never persisted.
///
/// `model` is optional so a misconfigured run fails with `MissingModel` before any iteration
/// instead of at construction.
#[derive(Clone)]
pub struct RunContext {
    pub model: Option<Arc<dyn LlmClient>>,
    /// Seeded as the first message of a thread's first turn.
    pub system_prompt: String,
    /// Maximum number of agent steps per call.
    pub max_iterations: usize,
    /// `None` disables the timeout.
    pub model_timeout: Option<Duration>,
    /// `None` disables the timeout.
    pub tool_timeout: Option<Duration>,
    /// Substring of an assistant reply that routes back to the agent step.
    pub continuation_sentinel: String,
    /// Seed the built-in few-shot transcript after the system prompt on the first turn.
    pub few_shot: bool,
}

impl RunContext {
    pub fn new(model: Arc<dyn LlmClient>) -> Self {
        Self {
            model: Some(model),
            ..Self::default()
        }
    }

    /// Context from settings; `model` stays unset when `None` is given.
    pub fn from_settings(settings: &AgentSettings, model: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            model,
            system_prompt: settings.system_prompt.clone(),
            max_iterations: settings.max_iterations,
            model_timeout: settings.model_timeout,
            tool_timeout: settings.tool_timeout,
            continuation_sentinel: CONTINUATION_SENTINEL.to_string(),
            few_shot: settings.few_shot,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn LlmClient>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_model_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Text that, found anywhere in a tool-free assistant reply, sends the loop back to the
    /// model. Case-sensitive substring match, so a reply quoting it also loops; empty disables.
    pub fn with_continuation_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.continuation_sentinel = sentinel.into();
        self
    }

    pub fn with_few_shot(mut self, enabled: bool) -> Self {
        self.few_shot = enabled;
        self
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            model: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            model_timeout: Some(DEFAULT_MODEL_TIMEOUT),
            tool_timeout: Some(DEFAULT_TOOL_TIMEOUT),
            continuation_sentinel: CONTINUATION_SENTINEL.to_string(),
            few_shot: false,
        }
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("model", &self.model.as_ref().map(|_| "<model>"))
            .field("max_iterations", &self.max_iterations)
            .field("model_timeout", &self.model_timeout)
            .field("tool_timeout", &self.tool_timeout)
            .field("continuation_sentinel", &self.continuation_sentinel)
            .field("few_shot", &self.few_shot)
            .finish()
    }
}
