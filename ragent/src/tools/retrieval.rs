//! Document search tool: `search_documents(query, limit?)` over a [`Retriever`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Tool, ToolCallContent, ToolCallContext, ToolError, ToolSpec};
use crate::retrieval::{Retriever, DEFAULT_TOP_K};

/// Tool name for document retrieval.
pub const TOOL_SEARCH_DOCUMENTS: &str = "search_documents";

const MAX_LIMIT: usize = 20;

pub struct SearchDocumentsTool {
    retriever: Arc<dyn Retriever>,
}

impl SearchDocumentsTool {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for SearchDocumentsTool {
    fn name(&self) -> &str {
        TOOL_SEARCH_DOCUMENTS
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_SEARCH_DOCUMENTS.to_string(),
            description: Some(
                "Search the indexed documents for passages relevant to a query. \
                 Returns the best matching chunks with their relevance score."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "What to look for." },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of chunks (default 5, at most 20)."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(
        &self,
        args: Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolError> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("query must not be empty".to_string()))?;
        let limit = match args.get("limit").and_then(Value::as_i64) {
            None => DEFAULT_TOP_K,
            Some(n) if n < 1 => {
                return Err(ToolError::InvalidArguments(format!(
                    "limit must be at least 1, got {}",
                    n
                )))
            }
            Some(n) => (n as usize).min(MAX_LIMIT),
        };

        let hits = self
            .retriever
            .search(query, limit)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        tracing::debug!(query, limit, hits = hits.len(), "search_documents");
        if hits.is_empty() {
            return Ok(ToolCallContent::text("No relevant documents found."));
        }
        let results: Vec<Value> = hits
            .into_iter()
            .map(|h| json!({ "content": h.content, "metadata": h.metadata, "score": h.score }))
            .collect();
        Ok(ToolCallContent::json(&Value::Array(results)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::{DocumentChunk, HashingEmbedder, InMemoryRetriever};

    async fn tool() -> SearchDocumentsTool {
        let retriever = InMemoryRetriever::new(Arc::new(HashingEmbedder::default()));
        let chunks = (0..8)
            .map(|i| DocumentChunk::new(format!("d{}", i), format!("report number {} on rainfall", i)))
            .collect();
        retriever.add(chunks).await.unwrap();
        SearchDocumentsTool::new(Arc::new(retriever))
    }

    #[tokio::test]
    async fn defaults_to_top_five() {
        let out = tool().await.call(json!({"query": "rainfall"}), None).await.unwrap();
        let hits: Vec<Value> = serde_json::from_str(&out.text).unwrap();
        assert_eq!(hits.len(), DEFAULT_TOP_K);
    }

    #[tokio::test]
    async fn explicit_limit_and_validation() {
        let t = tool().await;
        let out = t.call(json!({"query": "rainfall", "limit": 2}), None).await.unwrap();
        let hits: Vec<Value> = serde_json::from_str(&out.text).unwrap();
        assert_eq!(hits.len(), 2);

        assert!(matches!(
            t.call(json!({"query": "  "}), None).await,
            Err(ToolError::InvalidArguments(_))
        ));
        assert!(matches!(
            t.call(json!({"query": "x", "limit": 0}), None).await,
            Err(ToolError::InvalidArguments(_))
        ));
    }
}
