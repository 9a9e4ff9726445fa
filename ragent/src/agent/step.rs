//! Agent step: invoke the model on the full history and append one assistant message.

use std::collections::{BTreeMap, HashSet};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::TurnScope;
use crate::context::RunContext;
use crate::error::AgentError;
use crate::llm::{LlmDelta, LlmUsage, ToolCallDelta};
use crate::message::{new_message_id, Message};
use crate::prompts::EMPTY_REPLY_FALLBACK;
use crate::state::{ConversationState, ToolCall};
use crate::stream::RunEvent;
use crate::tools::ToolRegistry;

/// What one agent step appended.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    /// Id of the appended assistant message.
    pub message_id: String,
    pub tool_calls: usize,
    pub usage: Option<LlmUsage>,
    /// The model returned neither text nor tool calls.
    pub used_fallback: bool,
}

/// Runs one agent step.
///
/// The model sees every message in order, the registry's tool schemas, and
/// `parallel_tool_calls = false`. Content and tool-call deltas are streamed while the model
/// generates; the assistant message is appended (and checkpointed) only once generation
/// completes, so a cancelled or failed call leaves the state untouched.
///
/// Errors: [`AgentError::EmptyState`], [`AgentError::MissingModel`],
/// [`AgentError::ModelTimeout`] and whatever the model binding returns.
pub async fn agent_step(
    state: &mut ConversationState,
    ctx: &RunContext,
    tools: &ToolRegistry,
    scope: &TurnScope,
) -> Result<StepOutcome, AgentError> {
    if state.is_empty() {
        return Err(AgentError::EmptyState);
    }
    let model = ctx.model.clone().ok_or(AgentError::MissingModel)?;
    let message_id = new_message_id();
    let specs = tools.specs();
    let (delta_tx, delta_rx) = mpsc::channel::<LlmDelta>(64);

    let call = async {
        let fut = model.invoke_stream(state.messages(), &specs, false, Some(delta_tx));
        match ctx.model_timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(AgentError::ModelTimeout(limit)),
            },
            None => fut.await,
        }
    };
    let mut forwarder = DeltaForwarder::new(&message_id, scope);
    let (result, ()) = tokio::join!(call, forwarder.run(delta_rx));
    let response = result?;

    // Started streamed calls in provider-index order; indices need not be contiguous.
    let mut streamed: Vec<StreamedCall> = std::mem::take(&mut forwarder.calls)
        .into_values()
        .filter(|c| c.call_id.is_some())
        .collect();
    let response_ids: HashSet<&str> = response
        .tool_calls
        .iter()
        .map(|tc| tc.id.as_str())
        .filter(|id| !id.is_empty())
        .collect();
    let mut paired = Vec::with_capacity(response.tool_calls.len());
    for tc in &response.tool_calls {
        let by_id = streamed
            .iter()
            .position(|c| !tc.id.is_empty() && c.provider_id.as_deref() == Some(tc.id.as_str()));
        let slot = by_id.or_else(|| {
            streamed.iter().position(|c| match c.provider_id.as_deref() {
                Some(pid) => !response_ids.contains(pid),
                None => true,
            })
        });
        paired.push(slot.map(|i| streamed.remove(i)).and_then(|c| c.call_id));
    }
    for orphan in streamed {
        if let Some(call_id) = orphan.call_id {
            warn!(call_id = %call_id, name = %orphan.name, "streamed tool call missing from response");
            scope.emit(RunEvent::ToolCallEnd { call_id }).await;
        }
    }

    let mut calls = Vec::with_capacity(response.tool_calls.len());
    for (tc, streamed_id) in response.tool_calls.into_iter().zip(paired) {
        let id = match streamed_id {
            Some(id) => id,
            None => {
                let id = unique_call_id(Some(&tc.id), &mut forwarder.used_ids);
                scope
                    .emit(RunEvent::ToolCallStart {
                        call_id: id.clone(),
                        name: tc.name.clone(),
                        parent_message_id: message_id.clone(),
                    })
                    .await;
                if !tc.arguments.is_empty() {
                    scope
                        .emit(RunEvent::ToolCallArgs {
                            call_id: id.clone(),
                            delta: tc.arguments.clone(),
                        })
                        .await;
                }
                id
            }
        };
        calls.push(ToolCall::new(id, tc.name, tc.arguments));
    }

    let used_fallback = response.content.is_empty() && calls.is_empty();
    let content = if used_fallback {
        EMPTY_REPLY_FALLBACK.to_string()
    } else {
        response.content
    };
    if !forwarder.text_started && !content.is_empty() {
        scope
            .emit(RunEvent::TextMessageStart {
                message_id: message_id.clone(),
            })
            .await;
        scope
            .emit(RunEvent::TextMessageContent {
                message_id: message_id.clone(),
                delta: content.clone(),
            })
            .await;
        forwarder.text_started = true;
    }
    if forwarder.text_started {
        scope
            .emit(RunEvent::TextMessageEnd {
                message_id: message_id.clone(),
            })
            .await;
    }
    for tc in &calls {
        scope
            .emit(RunEvent::ToolCallEnd {
                call_id: tc.id.clone(),
            })
            .await;
    }

    let tool_call_count = calls.len();
    let message = Message::assistant_with_tool_calls(content, calls).with_id(message_id.clone());
    scope.commit(state, message).await?;
    debug!(
        message_id = %message_id,
        tool_calls = tool_call_count,
        used_fallback,
        "assistant message appended"
    );

    if let Some(usage) = response.usage {
        scope.emit(RunEvent::Usage(usage)).await;
    }
    Ok(StepOutcome {
        message_id,
        tool_calls: tool_call_count,
        usage: response.usage,
        used_fallback,
    })
}

/// Provider id when usable, else `call_<uuid>`; suffixed until unique within the message.
fn unique_call_id(preferred: Option<&str>, used: &mut HashSet<String>) -> String {
    let base = preferred
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
    let mut id = base.clone();
    let mut n = 1;
    while !used.insert(id.clone()) {
        id = format!("{}_{}", base, n);
        n += 1;
    }
    id
}

#[derive(Default)]
struct StreamedCall {
    provider_id: Option<String>,
    name: String,
    /// Assigned once the name is known and `ToolCallStart` went out.
    call_id: Option<String>,
    pending_args: String,
}

/// Turns model deltas into text and tool-call events for one assistant message.
struct DeltaForwarder<'a> {
    message_id: &'a str,
    scope: &'a TurnScope,
    text_started: bool,
    calls: BTreeMap<usize, StreamedCall>,
    used_ids: HashSet<String>,
}

impl<'a> DeltaForwarder<'a> {
    fn new(message_id: &'a str, scope: &'a TurnScope) -> Self {
        Self {
            message_id,
            scope,
            text_started: false,
            calls: BTreeMap::new(),
            used_ids: HashSet::new(),
        }
    }

    async fn run(&mut self, mut rx: mpsc::Receiver<LlmDelta>) {
        while let Some(delta) = rx.recv().await {
            match delta {
                LlmDelta::Content(text) => self.on_content(text).await,
                LlmDelta::ToolCall(d) => self.on_tool_call(d).await,
            }
        }
    }

    async fn on_content(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        if !self.text_started {
            self.text_started = true;
            self.scope
                .emit(RunEvent::TextMessageStart {
                    message_id: self.message_id.to_string(),
                })
                .await;
        }
        self.scope
            .emit(RunEvent::TextMessageContent {
                message_id: self.message_id.to_string(),
                delta: text,
            })
            .await;
    }

    async fn on_tool_call(&mut self, d: ToolCallDelta) {
        let entry = self.calls.entry(d.index).or_default();
        if entry.provider_id.is_none() {
            entry.provider_id = d.call_id;
        }
        if let Some(name) = d.name {
            entry.name.push_str(&name);
        }

        if let Some(id) = &entry.call_id {
            if !d.arguments_delta.is_empty() {
                self.scope
                    .emit(RunEvent::ToolCallArgs {
                        call_id: id.clone(),
                        delta: d.arguments_delta,
                    })
                    .await;
            }
            return;
        }
        entry.pending_args.push_str(&d.arguments_delta);
        if entry.name.is_empty() {
            return;
        }

        let id = unique_call_id(entry.provider_id.as_deref(), &mut self.used_ids);
        entry.call_id = Some(id.clone());
        let args = std::mem::take(&mut entry.pending_args);
        self.scope
            .emit(RunEvent::ToolCallStart {
                call_id: id.clone(),
                name: entry.name.clone(),
                parent_message_id: self.message_id.to_string(),
            })
            .await;
        if !args.is_empty() {
            self.scope
                .emit(RunEvent::ToolCallArgs {
                    call_id: id,
                    delta: args,
                })
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_ids_are_generated_and_deduplicated() {
        let mut used = HashSet::new();
        assert_eq!(unique_call_id(Some("c1"), &mut used), "c1");
        assert_eq!(unique_call_id(Some("c1"), &mut used), "c1_1");
        assert_eq!(unique_call_id(Some("c1"), &mut used), "c1_2");
        let generated = unique_call_id(Some("  "), &mut used);
        assert!(generated.starts_with("call_"));
        assert!(unique_call_id(None, &mut used).starts_with("call_"));
    }
}
