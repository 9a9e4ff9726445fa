//! Turn orchestration for the CLI: builds the agent from settings and renders one turn's
//! events while it runs.

mod display;
mod mock;

use std::io::Write;
use std::sync::Arc;

use futures::StreamExt;
use tracing::debug;

use ragent::{
    default_registry, AgentError, AgentSettings, LlmClient, LlmUsage, MemorySaver, ReactAgent,
    RunContext, RunEvent, SettingsError, ToolSpec,
};

pub use display::{truncate_display, EventRenderer, OutputMode};
pub use mock::mock_model;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{0}")]
    Settings(#[from] SettingsError),
    #[error("no model configured: set OPENAI_API_KEY or pass --mock")]
    NoModel,
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("turn failed [{code}]: {message}")]
    Turn { code: String, message: String },
    #[error("turn ended without a terminal event")]
    Incomplete,
    #[error("output: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-invocation options.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub thread_id: String,
    pub mock: bool,
    pub output: OutputMode,
    /// Overrides `RAGENT_MAX_ITERATIONS`.
    pub max_iterations: Option<usize>,
    /// Truncation for tool arguments and results on stderr. 0 disables.
    pub display_max_len: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            thread_id: format!("thread-{}", uuid::Uuid::new_v4()),
            mock: false,
            output: OutputMode::Text,
            max_iterations: None,
            display_max_len: 200,
        }
    }
}

/// What one rendered turn produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnReport {
    pub reply: String,
    pub tool_calls: usize,
    pub usage: LlmUsage,
}

/// Agent plus settings, shared by all turns of one CLI process.
pub struct Session {
    agent: ReactAgent,
    settings: AgentSettings,
    model: Option<Arc<dyn LlmClient>>,
}

impl Session {
    /// Builds the agent with the default tools. Without `mock`, a model binding is created
    /// when an API key is configured; its absence surfaces on the first turn.
    pub fn new(settings: AgentSettings, mock: bool) -> Self {
        let agent = ReactAgent::new(
            default_registry(&settings.user_profile, None),
            Arc::new(MemorySaver::new()),
        );
        let model: Option<Arc<dyn LlmClient>> = if mock {
            None
        } else {
            settings
                .chat_model()
                .map(|m| Arc::new(m) as Arc<dyn LlmClient>)
        };
        Self {
            agent,
            settings,
            model,
        }
    }

    pub fn agent(&self) -> &ReactAgent {
        &self.agent
    }

    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.agent.registry().specs()
    }

    fn context_for(&self, message: &str, opts: &RunOptions) -> Result<RunContext, RunError> {
        let model = if opts.mock {
            Arc::new(mock_model(message)) as Arc<dyn LlmClient>
        } else {
            self.model.clone().ok_or(RunError::NoModel)?
        };
        let mut ctx = RunContext::from_settings(&self.settings, Some(model));
        if let Some(max) = opts.max_iterations {
            ctx = ctx.with_max_iterations(max);
        }
        Ok(ctx)
    }

    /// Runs one turn, writing rendered events to `out` (stdout) and `diag` (stderr).
    pub async fn run_turn(
        &self,
        message: &str,
        opts: &RunOptions,
        out: &mut dyn Write,
        diag: &mut dyn Write,
    ) -> Result<TurnReport, RunError> {
        let ctx = self.context_for(message, opts)?;
        let mut stream = self.agent.stream(opts.thread_id.clone(), message, ctx);
        debug!(thread_id = stream.thread_id(), run_id = stream.run_id(), "turn started");
        let mut renderer = EventRenderer::new(
            opts.output.clone(),
            stream.thread_id(),
            stream.run_id(),
            opts.display_max_len,
        );

        let mut report = TurnReport::default();
        let mut terminal = None;
        while let Some(event) = stream.next().await {
            renderer.render(&event, out, diag)?;
            match &event {
                RunEvent::ToolCallEnd { .. } => report.tool_calls += 1,
                RunEvent::Usage(u) => report.usage.add(u),
                RunEvent::TextMessageContent { delta, .. } => report.reply.push_str(delta),
                RunEvent::TextMessageStart { .. } => report.reply.clear(),
                _ => {}
            }
            if event.is_terminal() {
                terminal = Some(event);
            }
        }
        out.flush()?;

        match terminal {
            Some(RunEvent::RunFinished { .. }) => Ok(report),
            Some(RunEvent::RunError { code, message }) => Err(RunError::Turn { code, message }),
            _ => Err(RunError::Incomplete),
        }
    }
}
