//! Core traits and types for DataSplice
//!
//! This crate defines the fundamental traits and types used across the
//! DataSplice pipeline. It provides capability-facing interfaces for text
//! embedding, vector storage, and answer synthesis, making the pipeline
//! test-friendly and extensible.

pub mod config;
pub mod embedder;
pub mod error;
pub mod synthesizer;
pub mod types;
pub mod vector_store;

pub use config::Settings;
pub use embedder::Embedder;
pub use error::{Error, Result};
pub use synthesizer::Synthesizer;
pub use types::*;
pub use vector_store::VectorStore;
