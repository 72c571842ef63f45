use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Per-file extraction failure. Recovered by the loader: the file is
    /// skipped and the failure aggregated into the ingest report.
    #[error("Failed to ingest {path}: {reason}")]
    Ingestion { path: String, reason: String },

    /// Failure from the external embedding service. `transient` marks
    /// timeouts and throttling/server errors eligible for one retry.
    #[error("Embedding service error: {message}")]
    EmbeddingService { message: String, transient: bool },

    /// Fatal configuration-level mismatch between a vector and the store.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Persisted artifacts disagree structurally; the load is aborted and
    /// the caller must rebuild.
    #[error("Corrupt store: {0}")]
    CorruptStore(String),

    /// Empty or whitespace-only query, rejected before any external call.
    #[error("Query text is empty")]
    InvalidQuery,

    #[error("Summarization service error: {0}")]
    Summarization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::EmbeddingService { transient: true, .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
