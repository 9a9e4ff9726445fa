//! Tools the model can call, the registry that resolves them, and argument validation.

mod reasoning;
mod registry;
mod retrieval;
pub mod schema;
mod r#trait;
mod user_identity;
mod weather;

use std::sync::Arc;

pub use r#trait::{Tool, ToolCallContent, ToolCallContext, ToolError, ToolSpec};
pub use reasoning::{ReasonTool, TOOL_REASON};
pub use registry::ToolRegistry;
pub use retrieval::{SearchDocumentsTool, TOOL_SEARCH_DOCUMENTS};
pub use user_identity::{GetNameOfUserTool, DEFAULT_USER_PROFILE, TOOL_GET_NAME_OF_USER};
pub use weather::{condition_for, GetWeatherUpdateTool, TOOL_GET_WEATHER_UPDATE};

use crate::retrieval::Retriever;

/// Registry with the built-in tools: weather, identity and reasoning, plus
/// `search_documents` when a retriever is given.
pub fn default_registry(user_profile: &str, retriever: Option<Arc<dyn Retriever>>) -> ToolRegistry {
    let mut registry = ToolRegistry::new()
        .with_tool(Arc::new(GetWeatherUpdateTool::new()))
        .with_tool(Arc::new(GetNameOfUserTool::new(user_profile)))
        .with_tool(Arc::new(ReasonTool::new()));
    if let Some(retriever) = retriever {
        registry.register(Arc::new(SearchDocumentsTool::new(retriever)));
    }
    registry
}
