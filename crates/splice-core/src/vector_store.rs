//! Vector store trait

use async_trait::async_trait;

use crate::types::{Chunk, RetrievedChunk};
use crate::Result;

/// Trait for vector stores
///
/// This trait defines the interface for chunk storage and similarity
/// search. Stored chunks keep their embeddings so that retrieval can hand
/// them to downstream clustering.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Initialize the vector store connection
    async fn connect(&mut self) -> Result<()>;

    /// Insert or update chunks with their embedding vectors.
    ///
    /// Returns the number of chunks upserted. A chunk/embedding count
    /// mismatch is a contract violation and returns an error.
    async fn upsert_chunks(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize>;

    /// Search for the `top_k` most similar chunks, sorted by descending
    /// cosine similarity
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>>;

    /// Total number of chunks in the store
    async fn count(&self) -> Result<usize>;

    /// Sorted list of unique source file names in the store
    async fn files(&self) -> Result<Vec<String>>;

    /// Delete all chunks, returning how many were removed
    async fn clear(&self) -> Result<usize>;

    /// Check if the store is connected
    fn is_connected(&self) -> bool;
}
