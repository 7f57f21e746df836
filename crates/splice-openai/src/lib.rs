//! OpenAI client for DataSplice
//!
//! Implements the pipeline's [`Embedder`](splice_core::Embedder) and
//! [`Synthesizer`](splice_core::Synthesizer) traits against the OpenAI
//! embeddings and chat-completions APIs.

pub mod client;
pub mod config;
pub mod prompts;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;
