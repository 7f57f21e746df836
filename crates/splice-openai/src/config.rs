//! OpenAI client configuration

use std::env;

use serde::{Deserialize, Serialize};
use splice_core::{Error, Result};

/// Configuration for the OpenAI client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub embed_model: String,
    pub llm_model: String,
    pub api_url: String,
}

impl OpenAiConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            Error::Configuration("OPENAI_API_KEY environment variable not found".to_string())
        })?;

        let embed_model =
            env::var("EMBED_MODEL").unwrap_or_else(|_| "text-embedding-3-large".to_string());
        let llm_model = env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let api_url =
            env::var("OPENAI_API_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        Ok(Self {
            api_key,
            embed_model,
            llm_model,
            api_url,
        })
    }

    /// Create configuration with an explicit key and default models
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            embed_model: "text-embedding-3-large".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            api_url: "https://api.openai.com/v1".to_string(),
        }
    }
}
