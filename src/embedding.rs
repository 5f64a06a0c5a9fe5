//! OpenAI embeddings API client.
//!
//! Sends chunk texts to `POST {base_url}/embeddings` in configurable batches
//! and returns one vector per input, in input order.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry with quadratic backoff
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//!
//! Error messages carry a truncated response body; the API key never
//! appears in them.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;

/// Client for the embeddings API.
///
/// Construction fails when `OPENAI_API_KEY` is absent from the environment,
/// before any document work happens. A missing key is never retried.
pub struct EmbeddingClient {
    http: reqwest::Client,
    api_key: String,
    config: EmbeddingConfig,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => bail!("OPENAI_API_KEY environment variable not set (required to embed)"),
        };
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key,
            config: config.clone(),
        })
    }

    /// Embed `texts`, returning one vector per input in input order.
    ///
    /// Inputs are sent in batches of `embedding.batch_size`, issued one
    /// after another. A batch that exhausts its retries fails the call.
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        Ok(vectors)
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
        let body = EmbeddingRequest {
            model: &self.config.model,
            input: batch,
            dimensions: Some(self.config.dims),
        };

        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(retry_backoff(self.config.backoff_base_ms, attempt)).await;
            }

            let resp = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let parsed: EmbeddingResponse = response
                            .json()
                            .await
                            .context("Invalid embeddings API response")?;
                        return collect_vectors(parsed, batch.len());
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Embeddings API error {}: {}",
                            status,
                            truncate_body(&body_text)
                        ));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    bail!(
                        "Embeddings API error {}: {}",
                        status,
                        truncate_body(&body_text)
                    );
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Embedding failed after retries")))
    }
}

/// Quadratic backoff: `base_ms * attempt^2`.
pub fn retry_backoff(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms * u64::from(attempt) * u64::from(attempt))
}

/// Restore input order and check the count; the API does not guarantee
/// response order.
fn collect_vectors(parsed: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut data = parsed.data;
    if data.len() != expected {
        bail!(
            "Embeddings API returned {} vectors for {} inputs",
            data.len(),
            expected
        );
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

/// Keep error bodies short enough for a terminal line.
pub(crate) fn truncate_body(body: &str) -> &str {
    const MAX_CHARS: usize = 300;
    match body.char_indices().nth(MAX_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
