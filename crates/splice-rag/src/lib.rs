//! Evidence-shaping pipeline for DataSplice
//!
//! Chunking, retrieval fusion (cluster / deduplicate / cap), confidence
//! scoring, and the engine that wires them to pluggable embedding, storage,
//! and synthesis collaborators.

pub mod chunker;
pub mod citations;
pub mod confidence;
pub mod engine;
pub mod extract;
pub mod fusion;
pub mod vector_store;


pub use chunker::{chunk_pages, chunk_text, estimate_tokens};
pub use citations::flatten_citations;
pub use confidence::{calculate_confidence, confidence_label};
pub use engine::SpliceEngine;
pub use extract::extract_text;
pub use fusion::{fuse_retrieved_chunks, FusionFallback, FusionResult, DEDUP_THRESHOLD};
pub use vector_store::LocalVectorStore;

// Re-export core types for convenience
pub use splice_core::{
    Chunk, ChunkMetadata, Citation, ClusterMap, CorpusStats, DocumentPage, Embedder, Error,
    IngestReport, QueryResponse, Result, RetrievedChunk, Settings, SplitType, Subtopic,
    SynthesisResponse, Synthesizer, VectorStore,
};
