//! Pipeline configuration

use std::env;

use serde::{Deserialize, Serialize};

/// Pipeline settings loaded from environment variables.
///
/// Chunk sizes are expressed in estimated tokens (4 characters ~ 1 token).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Retrieval depth per query
    pub top_k: usize,
    /// Number of thematic clusters for evidence fusion
    pub clusters: usize,
    /// Target tokens per chunk
    pub chunk_size: usize,
    /// Overlap tokens between consecutive chunks
    pub chunk_overlap: usize,
    /// Maximum chunks kept per cluster after deduplication
    pub max_per_cluster: usize,
}

impl Settings {
    /// Load settings from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            top_k: env_usize("TOP_K", 12),
            clusters: env_usize("CLUSTERS", 3),
            chunk_size: env_usize("CHUNK_SIZE", 600),
            chunk_overlap: env_usize("CHUNK_OVERLAP", 90),
            max_per_cluster: env_usize("MAX_PER_CLUSTER", 3),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            top_k: 12,
            clusters: 3,
            chunk_size: 600,
            chunk_overlap: 90,
            max_per_cluster: 3,
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
