//! Capability traits for the external model services. Both are injectable
//! so the pipeline runs against deterministic fakes in tests.

use crate::Result;
use async_trait::async_trait;

/// Batch text embedding backed by an external model or service.
///
/// Implementations must be deterministic for identical input text (rebuild
/// idempotence depends on it) and must return exactly one vector per input,
/// in input order, each of `dim()` length.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embedding dimensionality. Fixed per deployment.
    fn dim(&self) -> usize;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Grounded summarization backed by an external generative service.
///
/// `context` is `None` when retrieval produced nothing; the implementation
/// must then state that no grounding context was found rather than invent
/// one. Treated as a pure function by the orchestrator; retries, if any,
/// live inside the implementation.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, query: &str, context: Option<&str>) -> Result<String>;
}
