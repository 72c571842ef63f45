//! HTTP embedding service adapter.
//!
//! Speaks the common JSON contract: POST `{endpoint}/embeddings` with
//! `{"model": ..., "input": [...]}`, response `{"data": [{"embedding":
//! [...]}, ...]}` in input order. Timeouts, throttling, and server errors
//! are reported as transient so the `Embedder` wrapper can retry once.

use async_trait::async_trait;
use ragdb_core::config::EmbeddingConfig;
use ragdb_core::traits::EmbeddingService;
use ragdb_core::{Error, Result};
use serde::{Deserialize, Serialize};

pub struct HttpEmbeddingService {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dim: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl HttpEmbeddingService {
    pub fn new(config: &EmbeddingConfig, dim: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dim,
        }
    }

    fn service_error(message: impl ToString, transient: bool) -> Error {
        Error::EmbeddingService {
            message: message.to_string(),
            transient,
        }
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbeddingService {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.endpoint);
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::service_error(e, true))?;

        let status = response.status();
        if !status.is_success() {
            let transient = status.is_server_error()
                || status == reqwest::StatusCode::TOO_MANY_REQUESTS
                || status == reqwest::StatusCode::REQUEST_TIMEOUT;
            let detail = response.text().await.unwrap_or_default();
            return Err(Self::service_error(
                format!("{} from {}: {}", status, url, detail),
                transient,
            ));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Self::service_error(format!("bad response body: {e}"), false))?;

        Ok(parsed.data.into_iter().map(|row| row.embedding).collect())
    }
}
