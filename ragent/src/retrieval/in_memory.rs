//! In-memory retriever: cosine similarity over embedded chunks. Not persistent.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{DocumentChunk, Embedder, RetrievalError, Retriever, SearchHit};

struct IndexedChunk {
    chunk: DocumentChunk,
    vector: Vec<f32>,
}

pub struct InMemoryRetriever {
    chunks: DashMap<String, IndexedChunk>,
    embedder: Arc<dyn Embedder>,
}

impl InMemoryRetriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            chunks: DashMap::new(),
            embedder,
        }
    }

    /// Embeds and indexes `chunks`; an existing id is overwritten.
    pub async fn add(&self, chunks: Vec<DocumentChunk>) -> Result<(), RetrievalError> {
        if chunks.is_empty() {
            return Ok(());
        }
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(RetrievalError::Embedding(format!(
                "expected {} vectors, got {}",
                chunks.len(),
                vectors.len()
            )));
        }
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            self.check_dimension(&vector)?;
            self.chunks
                .insert(chunk.id.clone(), IndexedChunk { chunk, vector });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), RetrievalError> {
        let expected = self.embedder.dimension();
        if vector.len() != expected {
            return Err(RetrievalError::DimensionMismatch {
                expected,
                got: vector.len(),
            });
        }
        Ok(())
    }

    /// Returns 0.0 if either vector has zero magnitude.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            dot / (norm_a * norm_b)
        }
    }
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, RetrievalError> {
        if limit == 0 || self.chunks.is_empty() {
            return Ok(Vec::new());
        }
        let query_vector = self
            .embedder
            .embed(&[query])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Embedding("no vector returned".into()))?;
        self.check_dimension(&query_vector)?;

        let mut hits: Vec<SearchHit> = self
            .chunks
            .iter()
            .map(|entry| SearchHit {
                id: entry.chunk.id.clone(),
                content: entry.chunk.text.clone(),
                metadata: entry.chunk.metadata.clone(),
                score: Self::cosine_similarity(&query_vector, &entry.vector),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::HashingEmbedder;

    async fn corpus() -> InMemoryRetriever {
        let r = InMemoryRetriever::new(Arc::new(HashingEmbedder::default()));
        r.add(vec![
            DocumentChunk::new("a", "Paris is the capital of France"),
            DocumentChunk::new("b", "Seoul is the capital of South Korea"),
            DocumentChunk::new("c", "Bananas are rich in potassium"),
        ])
        .await
        .unwrap();
        r
    }

    #[tokio::test]
    async fn best_match_first_and_limit_applied() {
        let r = corpus().await;
        let hits = r.search("capital of France", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn zero_limit_or_empty_index_returns_nothing() {
        let r = corpus().await;
        assert!(r.search("France", 0).await.unwrap().is_empty());
        let empty = InMemoryRetriever::new(Arc::new(HashingEmbedder::default()));
        assert!(empty.search("France", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn re_adding_an_id_overwrites() {
        let r = corpus().await;
        r.add(vec![DocumentChunk::new("c", "Vienna is the capital of Austria")])
            .await
            .unwrap();
        assert_eq!(r.len(), 3);
        let hits = r.search("Austria", 1).await.unwrap();
        assert_eq!(hits[0].content, "Vienna is the capital of Austria");
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(InMemoryRetriever::cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        let s = InMemoryRetriever::cosine_similarity(&[1.0, 1.0], &[1.0, 1.0]);
        assert!((s - 1.0).abs() < 1e-6);
    }
}
