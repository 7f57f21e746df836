//! Answer synthesis trait

use async_trait::async_trait;

use crate::types::{ClusterMap, SynthesisResponse};
use crate::Result;

/// Trait for answer synthesizers
///
/// Implementations take the fused evidence clusters for a query and produce
/// a structured, citation-backed summary.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Generate a structured summary from clustered evidence
    async fn synthesize(&self, query: &str, clusters: &ClusterMap) -> Result<SynthesisResponse>;
}
