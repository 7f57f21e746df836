//! Data model for chunks, retrieved evidence, and synthesis output

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A page or section of extracted document text (1-based page numbering)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPage {
    pub page_num: u32,
    pub text: String,
}

impl DocumentPage {
    pub fn new(page_num: u32, text: impl Into<String>) -> Self {
        Self {
            page_num,
            text: text.into(),
        }
    }
}

/// Marker for chunks produced by forced long-sentence splitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    WordBoundary,
}

/// Sizing metadata recorded when a chunk is flushed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub token_estimate: usize,
    pub char_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_type: Option<SplitType>,
}

/// A contiguous span of text extracted from one page of one source file.
///
/// Created once per chunking pass and immutable thereafter. The derived
/// [`chunk_id`](Chunk::chunk_id) is unique across the corpus as long as
/// `(file, page, chunk_index)` triples are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub chunk_index: usize,
    pub file: String,
    pub page: u32,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Deterministic identifier in the form `{file_base}_p{page}_c{index}`.
    ///
    /// The file extension is stripped and spaces / path separators are
    /// replaced so the id is safe to use as a storage key.
    /// Example: `"annual report.pdf"` page 1 chunk 0 -> `annual_report_p1_c0`.
    pub fn chunk_id(&self) -> String {
        let file_base = match self.file.rsplit_once('.') {
            Some((base, _)) => base,
            None => self.file.as_str(),
        };
        let file_base = file_base.replace(' ', "_").replace('/', "_");
        format!("{}_p{}_c{}", file_base, self.page, self.chunk_index)
    }
}

/// A stored chunk returned by retrieval, carrying its similarity score and
/// embedding vector. Retrieval returns these in descending-relevance order;
/// downstream fusion relies on that ordering but does not enforce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub text: String,
    pub file: String,
    pub page: u32,
    pub chunk_index: usize,
    pub similarity: f32,
    pub distance: f32,
    pub embedding: Option<Vec<f32>>,
}

/// Cluster mapping produced by evidence fusion, keyed by cluster id.
/// Within a cluster, list order matches the relative relevance order of the
/// retrieval input.
pub type ClusterMap = BTreeMap<usize, Vec<RetrievedChunk>>;

/// Reference to a specific chunk in the corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub chunk_id: String,
    pub file: String,
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

/// A thematic cluster of findings with supporting citations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtopic {
    pub title: String,
    pub bullets: Vec<String>,
    pub citations: Vec<Citation>,
}

/// Structured synthesis output: summary, subtopics, optional limitations note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisResponse {
    pub summary: String,
    #[serde(default)]
    pub subtopics: Vec<Subtopic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limitations: Option<String>,
}

/// Final structured answer to a query with citations and confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub summary: String,
    pub confidence: f64,
    pub confidence_label: String,
    pub subtopics: Vec<Subtopic>,
    pub citations_flat: Vec<Citation>,
}

/// Outcome of ingesting one or more documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub ok: bool,
    pub added_chunks: usize,
    pub errors: Vec<String>,
}

/// Corpus-level statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    pub chunk_count: usize,
    pub file_count: usize,
    pub files: Vec<String>,
}
