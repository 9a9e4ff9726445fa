//! Retrieval interfaces behind the `search_documents` tool.
//!
//! The embedding model and the vector database are external collaborators; this module only
//! defines their seams ([`Embedder`], [`Retriever`]) plus an in-memory retriever for tests and
//! small corpora.

mod embedder;
mod in_memory;

pub use embedder::{Embedder, HashingEmbedder};
pub use in_memory::InMemoryRetriever;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of chunks returned when the caller does not ask for a limit.
pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetrievalError {
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("retrieval backend error: {0}")]
    Backend(String),
}

/// A chunk of a source document, as indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Value,
}

impl DocumentChunk {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One search result; higher `score` is more relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub content: String,
    pub metadata: Value,
    pub score: f32,
}

/// Top-k semantic search over indexed chunks.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns at most `limit` hits, best first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, RetrievalError>;
}
