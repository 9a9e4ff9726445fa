//! # ragent
//!
//! A streaming ReAct agent backend. A user message enters a per-thread conversation, the
//! agent alternates between calling the model and executing the tools it requests, and every
//! step streams events to the caller while the thread's state is checkpointed after each
//! appended message.
//!
//! ## Design principles
//!
//! - **Explicit state machine**: [`Stage`] plus a transition table driven by the [`route`]
//!   verdict; no graph runtime.
//! - **Append-only state**: [`ConversationState::append`] is the only mutation and enforces
//!   the tool-call linkage rules.
//! - **Run context by reference**: [`RunContext`] carries the model, prompt and limits into
//!   every node of one turn.
//! - **Closed event set**: [`RunEvent`] over a bounded channel; dropping the [`RunStream`]
//!   cancels the turn.
//!
//! ## Main modules
//!
//! - [`agent`]: [`ReactAgent`], [`agent_step`], [`execute_tools`], [`Stage`].
//! - [`router`]: [`route`], [`Route`].
//! - [`state`] / [`message`]: [`ConversationState`], [`Message`], [`ToolCall`], [`ToolResult`].
//! - [`llm`]: [`LlmClient`], [`ChatOpenAI`], [`MockLlm`].
//! - [`tools`]: [`Tool`], [`ToolRegistry`], built-in weather, identity, reasoning and document
//!   search tools.
//! - [`retrieval`]: [`Embedder`], [`Retriever`], [`InMemoryRetriever`].
//! - [`memory`]: [`Checkpointer`], [`MemorySaver`].
//! - [`stream`] / [`protocol`]: run events and their wire mapping to `stream-event`.
//! - [`settings`]: [`AgentSettings`] from configuration keys.

pub mod agent;
pub mod context;
pub mod error;
pub mod llm;
pub mod memory;
pub mod message;
pub mod prompts;
pub mod protocol;
pub mod retrieval;
pub mod router;
pub mod settings;
pub mod state;
pub mod stream;
pub mod tools;

pub use agent::{
    agent_step, execute_tool_call, execute_tools, prepare_turn_state, ReactAgent, RunStream,
    Stage, StepOutcome, TurnOutput, TurnScope,
};
pub use context::RunContext;
pub use error::AgentError;
pub use llm::{ChatOpenAI, LlmClient, LlmDelta, LlmResponse, LlmUsage, MockLlm, ToolCallDelta};
pub use memory::{Checkpoint, CheckpointError, Checkpointer, MemorySaver};
pub use message::{Message, Role};
pub use prompts::{CONTINUATION_SENTINEL, DEFAULT_SYSTEM_PROMPT};
pub use retrieval::{
    DocumentChunk, Embedder, HashingEmbedder, InMemoryRetriever, RetrievalError, Retriever,
    SearchHit,
};
pub use router::{route, Route};
pub use settings::{AgentSettings, SettingsError};
pub use state::{ConversationState, StateError, ToolCall, ToolResult};
pub use stream::{EventSink, RunEvent};
pub use tools::{
    default_registry, Tool, ToolCallContent, ToolCallContext, ToolError, ToolRegistry, ToolSpec,
};
