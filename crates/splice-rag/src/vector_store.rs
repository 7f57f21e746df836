//! In-memory vector store implementation

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{info, warn};

use splice_core::{Chunk, Error, Result, RetrievedChunk, VectorStore};

#[derive(Debug, Clone)]
struct StoredChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Local in-memory vector store with brute-force cosine search.
///
/// Suitable for corpora in the tens of thousands of chunks; larger corpora
/// belong in a dedicated vector database behind the same trait.
pub struct LocalVectorStore {
    chunks: Arc<RwLock<HashMap<String, StoredChunk>>>,
    connected: bool,
}

impl LocalVectorStore {
    pub fn new() -> Self {
        Self {
            chunks: Arc::new(RwLock::new(HashMap::new())),
            connected: false,
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

impl Default for LocalVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(Error::InvalidInput(format!(
                "chunks ({}) and embeddings ({}) count mismatch",
                chunks.len(),
                embeddings.len()
            )));
        }

        if chunks.is_empty() {
            warn!("no chunks to upsert");
            return Ok(0);
        }

        let mut store = self
            .chunks
            .write()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;

        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            store.insert(
                chunk.chunk_id(),
                StoredChunk {
                    chunk: chunk.clone(),
                    embedding: embedding.clone(),
                },
            );
        }

        info!(count = chunks.len(), "upserted chunks to vector store");
        Ok(chunks.len())
    }

    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let store = self
            .chunks
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;

        if store.is_empty() {
            warn!("vector store is empty, no results to return");
            return Ok(Vec::new());
        }

        let mut results: Vec<RetrievedChunk> = store
            .iter()
            .map(|(chunk_id, stored)| {
                let similarity = Self::cosine_similarity(query_embedding, &stored.embedding);
                RetrievedChunk {
                    chunk_id: chunk_id.clone(),
                    text: stored.chunk.text.clone(),
                    file: stored.chunk.file.clone(),
                    page: stored.chunk.page,
                    chunk_index: stored.chunk.chunk_index,
                    similarity,
                    distance: 1.0 - similarity,
                    embedding: Some(stored.embedding.clone()),
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);

        info!(results = results.len(), "vector search complete");
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let store = self
            .chunks
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;
        Ok(store.len())
    }

    async fn files(&self) -> Result<Vec<String>> {
        let store = self
            .chunks
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;

        let mut files: Vec<String> = store.values().map(|s| s.chunk.file.clone()).collect();
        files.sort();
        files.dedup();
        Ok(files)
    }

    async fn clear(&self) -> Result<usize> {
        let mut store = self
            .chunks
            .write()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;
        let deleted = store.len();
        store.clear();
        warn!(deleted, "vector store cleared");
        Ok(deleted)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_core::ChunkMetadata;

    fn chunk(file: &str, page: u32, index: usize, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            chunk_index: index,
            file: file.to_string(),
            page,
            metadata: ChunkMetadata {
                token_estimate: 1,
                char_count: text.len(),
                split_type: None,
            },
        }
    }

    #[tokio::test]
    async fn upsert_and_count() {
        let mut store = LocalVectorStore::new();
        store.connect().await.unwrap();
        assert!(store.is_connected());

        let chunks = vec![
            chunk("a.txt", 1, 0, "alpha"),
            chunk("a.txt", 1, 1, "beta"),
        ];
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0]];

        let added = store.upsert_chunks(&chunks, &embeddings).await.unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn length_mismatch_is_rejected() {
        let store = LocalVectorStore::new();
        let chunks = vec![chunk("a.txt", 1, 0, "alpha")];
        let err = store.upsert_chunks(&chunks, &[]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn search_orders_by_similarity_and_keeps_embeddings() {
        let store = LocalVectorStore::new();
        let chunks = vec![
            chunk("a.txt", 1, 0, "about cats"),
            chunk("a.txt", 1, 1, "about dogs"),
            chunk("b.txt", 1, 0, "about fish"),
        ];
        let embeddings = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.7, 0.7, 0.0],
        ];
        store.upsert_chunks(&chunks, &embeddings).await.unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk_id, "a_p1_c0");
        assert!(results[0].similarity >= results[1].similarity);
        assert!(results[0].embedding.is_some());
        assert!((results[0].distance - (1.0 - results[0].similarity)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn empty_store_returns_no_results() {
        let store = LocalVectorStore::new();
        let results = store.search(&[1.0, 0.0], 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn files_are_sorted_and_unique() {
        let store = LocalVectorStore::new();
        let chunks = vec![
            chunk("b.txt", 1, 0, "one"),
            chunk("a.txt", 1, 0, "two"),
            chunk("a.txt", 2, 0, "three"),
        ];
        let embeddings = vec![vec![1.0], vec![0.5], vec![0.2]];
        store.upsert_chunks(&chunks, &embeddings).await.unwrap();

        assert_eq!(
            store.files().await.unwrap(),
            vec!["a.txt".to_string(), "b.txt".to_string()]
        );
    }

    #[tokio::test]
    async fn clear_reports_deleted_count() {
        let store = LocalVectorStore::new();
        let chunks = vec![chunk("a.txt", 1, 0, "alpha")];
        store.upsert_chunks(&chunks, &[vec![1.0]]).await.unwrap();
        assert_eq!(store.clear().await.unwrap(), 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
