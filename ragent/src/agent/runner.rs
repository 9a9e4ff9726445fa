//! ReactAgent: drives one turn through the stage machine, blocking or as an event stream.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, info_span, warn, Instrument};

use super::{agent_step, execute_tools, prepare_turn_state, Stage, TurnScope};
use crate::context::RunContext;
use crate::error::AgentError;
use crate::llm::LlmUsage;
use crate::memory::Checkpointer;
use crate::message::Message;
use crate::router::route;
use crate::state::ConversationState;
use crate::stream::{EventSink, RunEvent};
use crate::tools::ToolRegistry;

const EVENT_BUFFER: usize = 128;

/// Result of a completed turn.
#[derive(Clone, Debug)]
pub struct TurnOutput {
    pub thread_id: String,
    pub run_id: String,
    /// Full thread state after the turn (also the latest checkpoint).
    pub state: ConversationState,
    /// Text of the final assistant message.
    pub reply: String,
    /// Agent steps taken in this turn.
    pub iterations: usize,
    /// Token usage summed over the turn's model calls.
    pub usage: LlmUsage,
}

/// ReAct agent over a fixed tool registry and a checkpoint store.
///
/// Cheap to clone; clones share the registry and the store. At most one turn per thread id
/// may be active at a time; distinct threads run independently.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use ragent::{default_registry, MemorySaver, MockLlm, LlmResponse, ReactAgent, RunContext};
///
/// # async fn demo() -> Result<(), ragent::AgentError> {
/// let agent = ReactAgent::new(default_registry("Name: Ada", None), Arc::new(MemorySaver::new()));
/// let model = Arc::new(MockLlm::new(vec![LlmResponse::text("Hello!")]));
/// let out = agent.invoke("T1", "hi", &RunContext::new(model)).await?;
/// assert_eq!(out.reply, "Hello!");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ReactAgent {
    registry: Arc<ToolRegistry>,
    checkpointer: Arc<dyn Checkpointer>,
}

impl ReactAgent {
    pub fn new(registry: ToolRegistry, checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self {
            registry: Arc::new(registry),
            checkpointer,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn checkpointer(&self) -> &Arc<dyn Checkpointer> {
        &self.checkpointer
    }

    /// Latest checkpointed state of a thread.
    pub async fn state(&self, thread_id: &str) -> Result<Option<ConversationState>, AgentError> {
        Ok(self.checkpointer.get_state(thread_id).await?)
    }

    /// Runs one turn to completion without streaming.
    pub async fn invoke(
        &self,
        thread_id: &str,
        input: impl Into<String>,
        ctx: &RunContext,
    ) -> Result<TurnOutput, AgentError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let scope = TurnScope::new(thread_id, Arc::clone(&self.checkpointer));
        let span = info_span!("turn", thread_id = %thread_id, run_id = %run_id);
        self.run_turn(&scope, &run_id, Message::user(input), ctx)
            .instrument(span)
            .await
    }

    /// Runs one turn on a background task and returns its events.
    ///
    /// Dropping the returned stream (or calling [`RunStream::cancel`]) stops the turn at its
    /// next suspension point. Messages appended before that stay checkpointed; a partially
    /// generated assistant message is discarded. After `cancel` the stream closes with a
    /// `RunError` carrying code `CANCELLED`.
    pub fn stream(
        &self,
        thread_id: impl Into<String>,
        input: impl Into<String>,
        ctx: RunContext,
    ) -> RunStream {
        let thread_id = thread_id.into();
        let input = Message::user(input);
        let run_id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let token = CancellationToken::new();
        let scope = TurnScope::new(thread_id.clone(), Arc::clone(&self.checkpointer))
            .with_sink(EventSink::new(tx));
        let agent = self.clone();
        let task_token = token.clone();
        let task_run_id = run_id.clone();
        let span = info_span!("turn", thread_id = %thread_id, run_id = %run_id);

        tokio::spawn(
            async move {
                let cancelled = tokio::select! {
                    _ = task_token.cancelled() => true,
                    _ = agent.run_turn(&scope, &task_run_id, input, &ctx) => false,
                };
                if cancelled {
                    // Reaches a consumer that called `cancel`; a dropped stream ignores it.
                    let err = AgentError::Cancelled;
                    warn!(code = err.code(), "turn cancelled by caller");
                    scope
                        .emit(RunEvent::RunError {
                            code: err.code().to_string(),
                            message: err.to_string(),
                        })
                        .await;
                }
            }
            .instrument(span),
        );

        RunStream {
            run_id,
            thread_id,
            inner: ReceiverStream::new(rx),
            token: token.clone(),
            _guard: token.drop_guard(),
        }
    }

    /// Emits the lifecycle events around [`drive`](Self::drive).
    async fn run_turn(
        &self,
        scope: &TurnScope,
        run_id: &str,
        input: Message,
        ctx: &RunContext,
    ) -> Result<TurnOutput, AgentError> {
        scope
            .emit(RunEvent::RunStarted {
                thread_id: scope.thread_id.clone(),
                run_id: run_id.to_string(),
            })
            .await;
        let result = self.drive(scope, run_id, input, ctx).await;
        match &result {
            Ok(out) => {
                info!(iterations = out.iterations, "turn finished");
                scope
                    .emit(RunEvent::RunFinished {
                        thread_id: scope.thread_id.clone(),
                        run_id: run_id.to_string(),
                    })
                    .await;
            }
            Err(e) => {
                warn!(code = e.code(), error = %e, "turn aborted");
                scope
                    .emit(RunEvent::RunError {
                        code: e.code().to_string(),
                        message: e.to_string(),
                    })
                    .await;
            }
        }
        result
    }

    async fn drive(
        &self,
        scope: &TurnScope,
        run_id: &str,
        input: Message,
        ctx: &RunContext,
    ) -> Result<TurnOutput, AgentError> {
        if ctx.model.is_none() {
            return Err(AgentError::MissingModel);
        }
        let mut state = prepare_turn_state(scope, ctx, input).await?;
        let mut stage = Stage::START;
        let mut iterations = 0usize;
        let mut usage = LlmUsage::default();

        while stage != Stage::End {
            match stage {
                Stage::AgentStep => {
                    if iterations >= ctx.max_iterations {
                        return Err(AgentError::IterationLimitExceeded {
                            limit: ctx.max_iterations,
                        });
                    }
                    iterations += 1;
                    scope.emit(RunEvent::StepStarted { stage }).await;
                    let outcome = agent_step(&mut state, ctx, &self.registry, scope).await?;
                    if let Some(u) = &outcome.usage {
                        usage.add(u);
                    }
                    scope.emit(RunEvent::StepFinished { stage }).await;
                }
                Stage::ToolExec => {
                    scope.emit(RunEvent::StepStarted { stage }).await;
                    execute_tools(&mut state, ctx, &self.registry, scope).await?;
                    scope.emit(RunEvent::StepFinished { stage }).await;
                }
                Stage::End => break,
            }
            let verdict = route(&state, ctx)?;
            let next = stage.next(verdict);
            debug!(
                from = stage.as_str(),
                route = verdict.as_str(),
                to = next.as_str(),
                iteration = iterations,
                "transition"
            );
            stage = next;
        }

        let reply = state.last().map(|m| m.content().to_string()).unwrap_or_default();
        Ok(TurnOutput {
            thread_id: scope.thread_id.clone(),
            run_id: run_id.to_string(),
            state,
            reply,
            iterations,
            usage,
        })
    }
}

/// Event stream of one turn. Finite and not restartable; ends after `RunFinished` or
/// `RunError`, or early when the turn is cancelled.
pub struct RunStream {
    run_id: String,
    thread_id: String,
    inner: ReceiverStream<RunEvent>,
    token: CancellationToken,
    _guard: DropGuard,
}

impl RunStream {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Stops the turn. The stream then yields `RunError { code: "CANCELLED" }` and ends.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Stream for RunStream {
    type Item = RunEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
