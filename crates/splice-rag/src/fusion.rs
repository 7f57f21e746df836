//! Evidence fusion: cluster retrieved chunks into subtopics, deduplicate
//! near-identical content, and cap cluster sizes
//!
//! Fusion never fails the query. Every degraded path collapses to a single
//! cluster holding all chunks, and the outcome records which fallback was
//! taken so callers can distinguish a normal partition from a degraded one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use splice_core::{ClusterMap, RetrievedChunk};

/// Default cosine similarity above which two chunks are near-duplicates
pub const DEDUP_THRESHOLD: f32 = 0.95;

const KMEANS_MAX_ITERATIONS: usize = 300;

/// Why fusion fell back to a single cluster instead of partitioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FusionFallback {
    /// One cluster was requested or only one chunk was present
    SingleClusterRequested,
    /// At least one chunk carried no embedding vector
    MissingEmbedding,
    /// The clustering pass itself failed (e.g. inconsistent dimensions)
    ClusteringFailed,
}

/// Outcome of the fusion pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionResult {
    pub clusters: ClusterMap,
    /// `None` when chunks were partitioned normally
    pub fallback: Option<FusionFallback>,
}

impl FusionResult {
    fn single_cluster(chunks: Vec<RetrievedChunk>, fallback: FusionFallback) -> Self {
        let mut clusters = BTreeMap::new();
        clusters.insert(0, chunks);
        Self {
            clusters,
            fallback: Some(fallback),
        }
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

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Deterministic k-means over embedding vectors.
///
/// Centroids are seeded from evenly-spaced input points instead of random
/// draws, so identical input always yields the identical partition. Returns
/// one label per input point, or `None` when the vectors are unusable
/// (empty or dimension-mismatched).
fn k_means(embeddings: &[&[f32]], k: usize) -> Option<Vec<usize>> {
    if embeddings.is_empty() || k == 0 {
        return None;
    }

    let dim = embeddings[0].len();
    if dim == 0 || embeddings.iter().any(|e| e.len() != dim) {
        return None;
    }

    let k = k.min(embeddings.len());

    // Evenly-spaced seeding keeps the run fully deterministic
    let step = embeddings.len() / k;
    let mut centroids: Vec<Vec<f32>> = (0..k)
        .map(|i| embeddings[(i * step).min(embeddings.len() - 1)].to_vec())
        .collect();

    let mut assignments: Vec<usize> = vec![0; embeddings.len()];

    for _ in 0..KMEANS_MAX_ITERATIONS {
        let mut changed = false;
        for (i, embedding) in embeddings.iter().enumerate() {
            let best = centroids
                .iter()
                .enumerate()
                .map(|(ci, c)| (ci, squared_distance(embedding, c)))
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(ci, _)| ci)
                .unwrap_or(0);

            if assignments[i] != best {
                assignments[i] = best;
                changed = true;
            }
        }

        if !changed {
            break;
        }

        let mut sums: Vec<Vec<f32>> = vec![vec![0.0; dim]; k];
        let mut counts: Vec<usize> = vec![0; k];

        for (i, embedding) in embeddings.iter().enumerate() {
            let c = assignments[i];
            counts[c] += 1;
            for (j, val) in embedding.iter().enumerate() {
                sums[c][j] += val;
            }
        }

        for c in 0..k {
            if counts[c] > 0 {
                for j in 0..dim {
                    centroids[c][j] = sums[c][j] / counts[c] as f32;
                }
            }
        }
    }

    Some(assignments)
}

/// Cluster chunks into thematic groups over their embeddings.
///
/// Degrades to a single cluster when clustering is impossible or fails;
/// never propagates an error to the caller.
pub fn cluster_chunks(chunks: Vec<RetrievedChunk>, n_clusters: usize) -> FusionResult {
    if chunks.is_empty() {
        return FusionResult {
            clusters: BTreeMap::new(),
            fallback: None,
        };
    }

    let n_clusters = n_clusters.min(chunks.len());
    info!(chunks = chunks.len(), n_clusters, "clustering retrieved chunks");

    if n_clusters <= 1 || chunks.len() == 1 {
        return FusionResult::single_cluster(chunks, FusionFallback::SingleClusterRequested);
    }

    for chunk in &chunks {
        if chunk.embedding.as_ref().map_or(true, |e| e.is_empty()) {
            warn!(chunk_id = %chunk.chunk_id, "chunk missing embedding, using single cluster");
            return FusionResult::single_cluster(chunks, FusionFallback::MissingEmbedding);
        }
    }

    let embeddings: Vec<&[f32]> = chunks
        .iter()
        .filter_map(|c| c.embedding.as_deref())
        .collect();

    let labels = match k_means(&embeddings, n_clusters) {
        Some(labels) => labels,
        None => {
            warn!("clustering failed, returning all chunks in single cluster");
            return FusionResult::single_cluster(chunks, FusionFallback::ClusteringFailed);
        }
    };

    // Group by label, preserving each chunk's relative relevance order
    let mut clusters: ClusterMap = BTreeMap::new();
    for (chunk, label) in chunks.into_iter().zip(labels) {
        clusters.entry(label).or_default().push(chunk);
    }

    let sizes: Vec<usize> = clusters.values().map(Vec::len).collect();
    info!(?sizes, "clustering complete");

    FusionResult {
        clusters,
        fallback: None,
    }
}

/// Remove near-duplicate chunks within a cluster.
///
/// Greedy and order-sensitive: chunks are visited in relevance-descending
/// order and compared against already-kept members only, so ties always
/// favor the higher-relevance chunk and the first member is never removed.
/// Missing embeddings leave the cluster unchanged.
pub fn deduplicate_chunks(chunks: Vec<RetrievedChunk>, threshold: f32) -> Vec<RetrievedChunk> {
    if chunks.len() <= 1 {
        return chunks;
    }

    if chunks
        .iter()
        .any(|c| c.embedding.as_ref().map_or(true, |e| e.is_empty()))
    {
        warn!("missing embeddings for deduplication, keeping cluster unchanged");
        return chunks;
    }

    let before = chunks.len();
    let mut kept: Vec<RetrievedChunk> = Vec::with_capacity(chunks.len());

    for candidate in chunks {
        let candidate_embedding = candidate
            .embedding
            .as_deref()
            .unwrap_or(&[]);
        let is_duplicate = kept.iter().any(|k| {
            let similarity =
                cosine_similarity(candidate_embedding, k.embedding.as_deref().unwrap_or(&[]));
            if similarity > threshold {
                debug!(
                    duplicate = %candidate.chunk_id,
                    kept = %k.chunk_id,
                    similarity,
                    "dropping near-duplicate chunk"
                );
                true
            } else {
                false
            }
        });

        if !is_duplicate {
            kept.push(candidate);
        }
    }

    info!(before, after = kept.len(), "deduplication complete");
    kept
}

/// Truncate each cluster to its `max_per_cluster` most relevant chunks
pub fn cap_chunks_per_cluster(clusters: ClusterMap, max_per_cluster: usize) -> ClusterMap {
    clusters
        .into_iter()
        .map(|(id, mut chunks)| {
            chunks.truncate(max_per_cluster);
            (id, chunks)
        })
        .collect()
}

/// Full fusion pipeline: cluster, deduplicate within each cluster, cap
/// cluster sizes. Empty input yields an empty cluster map.
pub fn fuse_retrieved_chunks(
    chunks: Vec<RetrievedChunk>,
    n_clusters: usize,
    max_per_cluster: usize,
) -> FusionResult {
    if chunks.is_empty() {
        return FusionResult {
            clusters: BTreeMap::new(),
            fallback: None,
        };
    }

    let FusionResult { clusters, fallback } = cluster_chunks(chunks, n_clusters);

    let deduplicated: ClusterMap = clusters
        .into_iter()
        .map(|(id, cluster)| (id, deduplicate_chunks(cluster, DEDUP_THRESHOLD)))
        .collect();

    let capped = cap_chunks_per_cluster(deduplicated, max_per_cluster);

    info!(clusters = capped.len(), "fusion complete");
    FusionResult {
        clusters: capped,
        fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Option<Vec<f32>>) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: id.to_string(),
            text: format!("text for {}", id),
            file: "doc.txt".to_string(),
            page: 1,
            chunk_index: 0,
            similarity: 0.9,
            distance: 0.1,
            embedding,
        }
    }

    /// Three well-separated pairs along the coordinate axes
    fn six_chunks() -> Vec<RetrievedChunk> {
        vec![
            chunk("a1", Some(vec![1.0, 0.0, 0.0])),
            chunk("a2", Some(vec![0.9, 0.1, 0.0])),
            chunk("b1", Some(vec![0.0, 1.0, 0.0])),
            chunk("b2", Some(vec![0.1, 0.9, 0.0])),
            chunk("c1", Some(vec![0.0, 0.0, 1.0])),
            chunk("c2", Some(vec![0.0, 0.1, 0.9])),
        ]
    }

    #[test]
    fn empty_input_yields_empty_map() {
        let result = fuse_retrieved_chunks(Vec::new(), 3, 3);
        assert!(result.clusters.is_empty());
        assert!(result.fallback.is_none());
    }

    #[test]
    fn single_chunk_goes_to_single_cluster() {
        let result = cluster_chunks(vec![chunk("only", Some(vec![1.0, 0.0]))], 3);
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[&0].len(), 1);
        assert_eq!(result.fallback, Some(FusionFallback::SingleClusterRequested));
    }

    #[test]
    fn missing_embedding_falls_back_to_single_cluster() {
        let chunks = vec![
            chunk("a", Some(vec![1.0, 0.0])),
            chunk("b", None),
            chunk("c", Some(vec![0.0, 1.0])),
        ];
        let result = cluster_chunks(chunks, 2);
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[&0].len(), 3);
        assert_eq!(result.fallback, Some(FusionFallback::MissingEmbedding));
    }

    #[test]
    fn dimension_mismatch_degrades_instead_of_failing() {
        let chunks = vec![
            chunk("a", Some(vec![1.0, 0.0])),
            chunk("b", Some(vec![0.0, 1.0, 0.5])),
        ];
        let result = cluster_chunks(chunks, 2);
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.fallback, Some(FusionFallback::ClusteringFailed));
    }

    #[test]
    fn cluster_union_preserves_every_chunk_once() {
        let result = cluster_chunks(six_chunks(), 3);
        assert!(result.fallback.is_none());

        let mut ids: Vec<String> = result
            .clusters
            .values()
            .flatten()
            .map(|c| c.chunk_id.clone())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a1", "a2", "b1", "b2", "c1", "c2"]);
    }

    #[test]
    fn clustering_is_deterministic() {
        let a = cluster_chunks(six_chunks(), 3);
        let b = cluster_chunks(six_chunks(), 3);
        let ids = |r: &FusionResult| -> Vec<(usize, Vec<String>)> {
            r.clusters
                .iter()
                .map(|(id, cs)| (*id, cs.iter().map(|c| c.chunk_id.clone()).collect()))
                .collect()
        };
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn fusion_scenario_three_clusters_capped_at_two() {
        let result = fuse_retrieved_chunks(six_chunks(), 3, 2);
        assert!(result.fallback.is_none());
        assert_eq!(result.clusters.len(), 3);

        let total: usize = result.clusters.values().map(Vec::len).sum();
        assert!(total <= 6);
        for cluster in result.clusters.values() {
            assert!(!cluster.is_empty());
            assert!(cluster.len() <= 2);
        }
    }

    #[test]
    fn dedup_removes_near_duplicates_first_wins() {
        let chunks = vec![
            chunk("first", Some(vec![1.0, 0.0])),
            chunk("copy", Some(vec![0.999, 0.001])),
            chunk("other", Some(vec![0.0, 1.0])),
        ];
        let kept = deduplicate_chunks(chunks, DEDUP_THRESHOLD);
        let ids: Vec<&str> = kept.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "other"]);
    }

    #[test]
    fn dedup_never_removes_first_member_and_never_grows() {
        let chunks = vec![
            chunk("first", Some(vec![0.5, 0.5])),
            chunk("same1", Some(vec![0.5, 0.5])),
            chunk("same2", Some(vec![0.5001, 0.4999])),
        ];
        let kept = deduplicate_chunks(chunks.clone(), DEDUP_THRESHOLD);
        assert!(kept.len() <= chunks.len());
        assert_eq!(kept[0].chunk_id, "first");
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn dedup_with_missing_embedding_keeps_cluster_unchanged() {
        let chunks = vec![
            chunk("a", Some(vec![1.0, 0.0])),
            chunk("b", None),
        ];
        let kept = deduplicate_chunks(chunks, DEDUP_THRESHOLD);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn cap_bounds_every_cluster() {
        let mut clusters: ClusterMap = BTreeMap::new();
        clusters.insert(0, six_chunks());
        clusters.insert(1, six_chunks()[..2].to_vec());
        let capped = cap_chunks_per_cluster(clusters, 3);
        for cluster in capped.values() {
            assert!(cluster.len() <= 3);
        }
        assert_eq!(capped[&0].len(), 3);
        assert_eq!(capped[&1].len(), 2);
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
