//! Pipeline engine wiring ingestion and query flows

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use splice_core::{
    CorpusStats, DocumentPage, Embedder, Error, IngestReport, QueryResponse, Result, Settings,
    Synthesizer, VectorStore,
};

use crate::chunker::chunk_pages;
use crate::citations::flatten_citations;
use crate::confidence::{calculate_confidence, confidence_label};
use crate::extract::extract_text;
use crate::fusion::fuse_retrieved_chunks;

/// The DataSplice pipeline engine.
///
/// Generic over its embedding, storage, and synthesis collaborators, which
/// are constructed by the caller and injected via `Arc`. There are no
/// process-wide singletons, so tests can swap in doubles and queries run
/// without shared mutable state.
pub struct SpliceEngine<E: Embedder, V: VectorStore, S: Synthesizer> {
    embedder: Arc<E>,
    vector_store: Arc<V>,
    synthesizer: Arc<S>,
    settings: Settings,
}

impl<E: Embedder, V: VectorStore, S: Synthesizer> SpliceEngine<E, V, S> {
    pub fn new(
        embedder: Arc<E>,
        vector_store: Arc<V>,
        synthesizer: Arc<S>,
        settings: Settings,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            synthesizer,
            settings,
        }
    }

    /// Ingest one document's extracted pages: chunk, embed, store.
    pub async fn ingest_pages(
        &self,
        file_name: &str,
        pages: &[DocumentPage],
    ) -> Result<IngestReport> {
        info!(file = file_name, pages = pages.len(), "ingesting document");

        let chunks = chunk_pages(
            pages,
            file_name,
            self.settings.chunk_size,
            self.settings.chunk_overlap,
        );

        if chunks.is_empty() {
            return Ok(IngestReport {
                ok: false,
                added_chunks: 0,
                errors: vec![format!("{}: no chunks created", file_name)],
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_texts(&texts).await?;

        // Chunk texts are guaranteed non-empty, so the embedding layer must
        // return one vector per chunk; anything else is a contract violation
        if embeddings.len() != chunks.len() {
            return Err(Error::InvalidInput(format!(
                "{}: embedding count mismatch (chunks: {}, embeddings: {})",
                file_name,
                chunks.len(),
                embeddings.len()
            )));
        }

        let added = self.vector_store.upsert_chunks(&chunks, &embeddings).await?;
        info!(file = file_name, added, "document ingested");

        Ok(IngestReport {
            ok: added > 0,
            added_chunks: added,
            errors: Vec::new(),
        })
    }

    /// Extract a file from disk and ingest it
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidInput(format!("invalid path: {}", path.display())))?
            .to_string();

        let pages = extract_text(path)?;
        self.ingest_pages(&file_name, &pages).await
    }

    /// Answer a query against the corpus: retrieve, fuse, synthesize, score.
    pub async fn query(&self, query: &str, top_k: Option<usize>) -> Result<QueryResponse> {
        let top_k = top_k.unwrap_or(self.settings.top_k);
        info!(query, top_k, "processing query");

        let query_embedding = self.embedder.embed_query(query).await?;
        let retrieved = self.vector_store.search(&query_embedding, top_k).await?;

        if retrieved.is_empty() {
            return Ok(QueryResponse {
                query: query.to_string(),
                summary: "No relevant information found in the corpus for this query."
                    .to_string(),
                confidence: 0.0,
                confidence_label: confidence_label(0.0).to_string(),
                subtopics: Vec::new(),
                citations_flat: Vec::new(),
            });
        }

        let fused = fuse_retrieved_chunks(
            retrieved,
            self.settings.clusters,
            self.settings.max_per_cluster,
        );
        if let Some(fallback) = fused.fallback {
            info!(?fallback, "fusion degraded to single cluster");
        }

        let synthesis = self.synthesizer.synthesize(query, &fused.clusters).await?;
        let citations_flat = flatten_citations(&synthesis);
        let confidence = calculate_confidence(&synthesis, &citations_flat);

        Ok(QueryResponse {
            query: query.to_string(),
            summary: synthesis.summary.clone(),
            confidence,
            confidence_label: confidence_label(confidence).to_string(),
            subtopics: synthesis.subtopics,
            citations_flat,
        })
    }

    /// Corpus statistics
    pub async fn stats(&self) -> Result<CorpusStats> {
        let chunk_count = self.vector_store.count().await?;
        let files = self.vector_store.files().await?;

        Ok(CorpusStats {
            chunk_count,
            file_count: files.len(),
            files,
        })
    }

    /// Delete all stored chunks, returning how many were removed
    pub async fn clear(&self) -> Result<usize> {
        self.vector_store.clear().await
    }
}
