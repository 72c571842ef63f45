//! Embedding adapter: batching, timeouts, bounded retry, and vector
//! normalization around an injectable `EmbeddingService`.

pub mod fake;
pub mod http;

pub use fake::FakeEmbedding;
pub use http::HttpEmbeddingService;

use ragdb_core::config::EmbeddingConfig;
use ragdb_core::traits::EmbeddingService;
use ragdb_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Backoff before the single retry of a transient service failure.
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Batches requests to the underlying service, applies a per-call timeout,
/// retries a transient failure once with backoff, and verifies that the
/// service honored its contract (one vector per input, fixed dimension).
pub struct Embedder {
    service: Arc<dyn EmbeddingService>,
    max_batch: usize,
    timeout: Duration,
}

impl Embedder {
    pub fn new(service: Arc<dyn EmbeddingService>, max_batch: usize, timeout: Duration) -> Self {
        Self {
            service,
            max_batch: max_batch.max(1),
            timeout,
        }
    }

    pub fn from_config(config: &EmbeddingConfig, service: Arc<dyn EmbeddingService>) -> Self {
        Self::new(
            service,
            config.max_batch,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn dim(&self) -> usize {
        self.service.dim()
    }

    /// Embed a batch of texts; the output always has exactly one vector per
    /// input, in input order, or the call fails as a whole.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.max_batch) {
            let vectors = self.call_with_retry(batch).await?;
            if vectors.len() != batch.len() {
                return Err(Error::EmbeddingService {
                    message: format!(
                        "service returned {} vectors for {} inputs",
                        vectors.len(),
                        batch.len()
                    ),
                    transient: false,
                });
            }
            for v in &vectors {
                if v.len() != self.dim() {
                    return Err(Error::DimensionMismatch {
                        expected: self.dim(),
                        actual: v.len(),
                    });
                }
            }
            out.extend(vectors);
        }
        Ok(out)
    }

    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        Ok(vectors.remove(0))
    }

    async fn call_with_retry(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        match self.call_once(batch).await {
            Err(err) if err.is_transient() => {
                warn!(error = %err, "transient embedding failure, retrying once");
                tokio::time::sleep(RETRY_BACKOFF).await;
                self.call_once(batch).await
            }
            other => other,
        }
    }

    async fn call_once(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        match tokio::time::timeout(self.timeout, self.service.embed(batch)).await {
            Ok(result) => result,
            Err(_) => Err(Error::EmbeddingService {
                message: format!("embedding call timed out after {:?}", self.timeout),
                transient: true,
            }),
        }
    }
}

/// L2-normalize in place. A zero vector is left untouched aside from the
/// epsilon guard, matching the fake embedder's behavior.
pub fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
    for x in v.iter_mut() {
        *x /= norm;
    }
}

/// Owned variant of [`normalize`].
pub fn normalized(mut v: Vec<f32>) -> Vec<f32> {
    normalize(&mut v);
    v
}

/// Service factory honoring the `APP_USE_FAKE_EMBEDDINGS` escape hatch so
/// indexing and tests can run without a live model endpoint.
pub fn default_embedding_service(
    config: &EmbeddingConfig,
    dim: usize,
) -> Arc<dyn EmbeddingService> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        warn!("APP_USE_FAKE_EMBEDDINGS set, using deterministic fake embeddings");
        return Arc::new(FakeEmbedding::new(dim));
    }
    Arc::new(HttpEmbeddingService::new(config, dim))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_embeddings_are_deterministic_and_normalized() {
        let fake = FakeEmbedding::new(64);
        let texts = vec!["Transformers use self-attention.".to_string()];
        let a = fake.embed(&texts).await.unwrap();
        let b = fake.embed(&texts).await.unwrap();
        assert_eq!(a, b);
        let norm: f32 = a[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[test]
    fn normalize_guards_zero_vectors() {
        let mut v = vec![0.0f32; 8];
        normalize(&mut v);
        assert!(v.iter().all(|x| x.abs() < 1e-3));
    }
}
