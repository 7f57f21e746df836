//! OpenAI API client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use splice_core::{ClusterMap, Embedder, Error, Result, SynthesisResponse, Synthesizer};

use crate::config::OpenAiConfig;
use crate::prompts::{build_user_prompt, SYSTEM_PROMPT};

/// Texts per embeddings API call
const EMBED_BATCH_SIZE: usize = 100;
const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// OpenAI API client providing embeddings and JSON-mode chat synthesis
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl OpenAiClient {
    /// Create a new client from configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = OpenAiConfig::from_env()?;
        Self::new(config)
    }

    async fn post_json(&self, endpoint: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let url = format!("{}/{}", self.config.api_url, endpoint);

        let mut delay = INITIAL_RETRY_DELAY;
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            let result = self
                .client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(body)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json()
                        .await
                        .map_err(|e| Error::Serialization(e.to_string()));
                }
                Ok(response) => {
                    let status = response.status();
                    let text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    // Client errors other than rate limiting will not
                    // succeed on retry
                    if status.is_client_error() && status.as_u16() != 429 {
                        return Err(Error::Network(format!(
                            "OpenAI API request failed with status {}: {}",
                            status, text
                        )));
                    }
                    last_error = Some(Error::Network(format!(
                        "OpenAI API request failed with status {}: {}",
                        status, text
                    )));
                }
                Err(e) => {
                    last_error = Some(Error::Network(e.to_string()));
                }
            }

            if attempt < MAX_RETRIES {
                warn!(attempt, delay_secs = delay.as_secs(), "API request failed, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Network("request failed".to_string())))
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingsRequest {
            model: &self.config.embed_model,
            input: batch,
            encoding_format: "float",
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let response = self.post_json("embeddings", &body).await?;
        let parsed: EmbeddingsResponse = serde_json::from_value(response)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        if parsed.data.len() != batch.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                parsed.data.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // The embedding layer filters empty inputs; callers reconcile
        // counts at the storage boundary
        let valid_texts: Vec<String> = texts
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| t.trim().to_string())
            .collect();

        if valid_texts.is_empty() {
            warn!("all texts are empty, returning empty list");
            return Ok(Vec::new());
        }

        info!(
            texts = valid_texts.len(),
            model = %self.config.embed_model,
            "generating embeddings"
        );

        let mut all_embeddings = Vec::with_capacity(valid_texts.len());
        for batch in valid_texts.chunks(EMBED_BATCH_SIZE) {
            let batch_embeddings = self.embed_batch(batch).await?;
            all_embeddings.extend(batch_embeddings);
        }

        info!(embeddings = all_embeddings.len(), "embedding generation complete");
        Ok(all_embeddings)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_texts(&[query.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("empty query cannot be embedded".to_string()))
    }
}

#[async_trait]
impl Synthesizer for OpenAiClient {
    async fn synthesize(&self, query: &str, clusters: &ClusterMap) -> Result<SynthesisResponse> {
        if clusters.is_empty() {
            warn!("no clusters provided for synthesis");
            return Ok(SynthesisResponse {
                summary: "No relevant information found in the corpus.".to_string(),
                subtopics: Vec::new(),
                limitations: Some("No evidence available to answer this query.".to_string()),
            });
        }

        let user_prompt = build_user_prompt(query, clusters);
        info!(
            model = %self.config.llm_model,
            prompt_chars = user_prompt.len(),
            "synthesizing response"
        );

        let body = json!({
            "model": self.config.llm_model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt },
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.3,
            "max_tokens": 2000,
        });

        let response = self.post_json("chat/completions", &body).await?;
        let parsed: ChatResponse = serde_json::from_value(response)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Synthesis("empty completion response".to_string()))?;

        parse_synthesis_json(&content)
    }
}

/// Parse the model's JSON output, defaulting missing top-level fields the
/// way a lenient consumer must
fn parse_synthesis_json(content: &str) -> Result<SynthesisResponse> {
    let mut value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| Error::Synthesis(format!("invalid JSON from LLM: {}", e)))?;

    let object = value
        .as_object_mut()
        .ok_or_else(|| Error::Synthesis("LLM response is not a JSON object".to_string()))?;

    if !object.contains_key("summary") {
        warn!("LLM response missing 'summary' field");
        object.insert("summary".to_string(), json!("Unable to generate summary."));
    }
    if !object.contains_key("subtopics") {
        warn!("LLM response missing 'subtopics' field");
        object.insert("subtopics".to_string(), json!([]));
    }

    serde_json::from_value(value).map_err(|e| Error::Synthesis(format!("malformed synthesis response: {}", e)))
}
