//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Trait for text embedding providers
///
/// Implementations turn chunk texts and queries into fixed-length vectors.
/// Empty or whitespace-only inputs are filtered out by the implementation,
/// so the returned list may be shorter than the input; callers reconcile
/// counts at the storage boundary.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, preserving the order of non-empty inputs
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>>;
}
