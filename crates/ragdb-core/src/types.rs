//! Domain types used by the ingestion, embedding, and vector engines.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

pub type Meta = HashMap<String, String>;

/// Source formats the loader knows how to extract, dispatched by file
/// extension. Anything else maps to `Unsupported` and is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    Pdf,
    PlainText,
    Csv,
    Docx,
    Unsupported,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("txt" | "text" | "md" | "markdown" | "log") => Self::PlainText,
            Some("csv") => Self::Csv,
            Some("docx") => Self::Docx,
            _ => Self::Unsupported,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PlainText => "text",
            Self::Csv => "csv",
            Self::Docx => "docx",
            Self::Unsupported => "unsupported",
        }
    }
}

/// A normalized text record produced from exactly one input file.
///
/// `id` is a blake3 hash over the source path and extracted content, so
/// re-ingesting an unchanged file yields the same identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub source_path: String,
    pub kind: SourceFormat,
    pub text: String,
    pub metadata: Meta,
}

impl Document {
    pub fn new(source_path: String, kind: SourceFormat, text: String, metadata: Meta) -> Self {
        let id = content_id(&source_path, &text);
        Self {
            id,
            source_path,
            kind,
            text,
            metadata,
        }
    }
}

/// Stable content identity for a document: blake3 over path + content.
pub fn content_id(source_path: &str, text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(source_path.as_bytes());
    hasher.update(&[0]);
    hasher.update(text.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Chunk identity: `(document_id, sequence_index)`. Stable across rebuilds
/// for unchanged chunking parameters. `Ord` so score ties in search results
/// break deterministically by ascending identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkId {
    pub document_id: String,
    pub sequence_index: usize,
}

impl ChunkId {
    pub fn new(document_id: impl Into<String>, sequence_index: usize) -> Self {
        Self {
            document_id: document_id.into(),
            sequence_index,
        }
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.document_id, self.sequence_index)
    }
}

/// A bounded contiguous span of one document's text, the unit of embedding
/// and retrieval. `char_span` holds character offsets into the parent
/// document; start offsets are strictly increasing across a document's
/// chunk sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub char_span: (usize, usize),
}

/// A chunk's embedding plus enough metadata to reconstruct its source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub chunk_id: ChunkId,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: Meta,
}

/// One retrieval hit: a stored record paired with its similarity score.
/// Higher is always better, for either metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub chunk_id: ChunkId,
    pub score: f32,
    pub text: String,
    pub metadata: Meta,
}

/// Similarity metric used by the vector store. Cosine scores are dot
/// products over L2-normalized vectors; L2 scores are negated distances so
/// that higher is better under both metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    L2,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::L2 => write!(f, "l2"),
        }
    }
}
