//! Qdrant REST client.
//!
//! Talks to the collections and points endpoints directly over HTTP. Points
//! carry named vectors: the items collection stores payload-only points
//! behind a one-dimensional placeholder vector, while the chunks collection
//! stores real embeddings under cosine distance. Transient failures follow
//! the same retry policy as the embeddings client. The optional
//! `QDRANT_API_KEY` is sent as an `api-key` header and never logged.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::config::QdrantConfig;
use crate::embedding::{retry_backoff, truncate_body};

/// Name of the placeholder vector on item points.
pub const ITEMS_VECTOR_NAME: &str = "dummy";
/// Dimension of the placeholder vector.
pub const ITEMS_VECTOR_DIM: usize = 1;
/// Name of the embedding vector on chunk points.
pub const CHUNKS_VECTOR_NAME: &str = "embedding";

/// One point ready for upsert.
#[derive(Debug, Clone, Serialize)]
pub struct Point {
    pub id: Uuid,
    pub vector: serde_json::Value,
    pub payload: serde_json::Value,
}

impl Point {
    /// Payload-only point for the items collection.
    pub fn item(id: Uuid, payload: serde_json::Value) -> Self {
        Self {
            id,
            vector: json!({ ITEMS_VECTOR_NAME: [0.0] }),
            payload,
        }
    }

    /// Embedded point for the chunks collection.
    pub fn chunk(id: Uuid, embedding: &[f32], payload: serde_json::Value) -> Self {
        Self {
            id,
            vector: json!({ CHUNKS_VECTOR_NAME: embedding }),
            payload,
        }
    }
}

/// Creation schema for a collection with one named cosine vector.
fn collection_schema(vector_name: &str, size: usize) -> serde_json::Value {
    json!({
        "vectors": {
            vector_name: { "size": size, "distance": "Cosine" }
        }
    })
}

pub struct QdrantClient {
    http: reqwest::Client,
    config: QdrantConfig,
    api_key: Option<String>,
}

impl QdrantClient {
    pub fn new(config: &QdrantConfig) -> Result<Self> {
        let api_key = std::env::var("QDRANT_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
            api_key,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.url.trim_end_matches('/'), path);
        let mut req = self.http.request(method, url);
        if let Some(key) = &self.api_key {
            req = req.header("api-key", key);
        }
        req
    }

    /// Create `name` with a single named vector when it does not exist yet.
    pub async fn ensure_collection(&self, name: &str, vector_name: &str, size: usize) -> Result<()> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/collections/{}", name))
            .send()
            .await
            .with_context(|| format!("Failed to reach Qdrant at {}", self.config.url))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        if status != reqwest::StatusCode::NOT_FOUND {
            let body_text = resp.text().await.unwrap_or_default();
            bail!(
                "Qdrant error {} checking collection '{}': {}",
                status,
                name,
                truncate_body(&body_text)
            );
        }

        self.send_with_retry(
            reqwest::Method::PUT,
            &format!("/collections/{}", name),
            &collection_schema(vector_name, size),
        )
        .await
        .with_context(|| format!("Failed to create collection '{}'", name))
    }

    /// Upsert points in batches, waiting for each batch to be applied
    /// before sending the next. Returns the number of points written.
    pub async fn upsert_points(&self, collection: &str, points: &[Point]) -> Result<usize> {
        let path = format!("/collections/{}/points?wait=true", collection);
        let mut written = 0usize;
        for batch in points.chunks(self.config.batch_size) {
            let body = json!({ "points": batch });
            self.send_with_retry(reqwest::Method::PUT, &path, &body)
                .await
                .with_context(|| format!("Failed to upsert into collection '{}'", collection))?;
            written += batch.len();
        }
        Ok(written)
    }

    async fn send_with_retry(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<()> {
        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(retry_backoff(self.config.backoff_base_ms, attempt)).await;
            }

            let resp = self.request(method.clone(), path).json(body).send().await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(());
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Qdrant error {}: {}",
                            status,
                            truncate_body(&body_text)
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Qdrant error {}: {}", status, truncate_body(&body_text));
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Qdrant request failed after retries")))
    }
}
