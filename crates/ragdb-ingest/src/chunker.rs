//! Sliding-window chunker.
//!
//! Windows are measured in characters and aligned to `char` boundaries, so
//! multibyte text never splits mid-scalar. Identical input and parameters
//! always produce an identical chunk sequence; rebuild idempotence depends
//! on this.

use ragdb_core::config::ChunkingConfig;
use ragdb_core::types::{Chunk, ChunkId, Document};
use ragdb_core::{Error, Result};

pub struct Chunker {
    max_chars: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.max_chars == 0 {
            return Err(Error::InvalidConfig("max_chars must be >= 1".into()));
        }
        if config.overlap >= config.max_chars {
            return Err(Error::InvalidConfig(format!(
                "overlap ({}) must be < max_chars ({})",
                config.overlap, config.max_chars
            )));
        }
        Ok(Self {
            max_chars: config.max_chars,
            overlap: config.overlap,
        })
    }

    /// Chunk a batch of documents in order.
    pub fn chunk(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut all = Vec::new();
        for doc in documents {
            all.extend(self.chunk_document(doc));
        }
        all
    }

    /// Chunk one document. A document with no non-whitespace content yields
    /// zero chunks; whitespace-only windows inside a document are dropped.
    /// Sequence indices are 0-based and monotonic over the kept chunks, and
    /// span start offsets are strictly increasing.
    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = document.text.chars().collect();
        let stride = self.max_chars - self.overlap;
        let mut chunks = Vec::new();
        let mut sequence_index = 0usize;
        let mut start = 0usize;

        while start < chars.len() {
            let end = (start + self.max_chars).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            if !window.trim().is_empty() {
                chunks.push(Chunk {
                    id: ChunkId::new(document.id.clone(), sequence_index),
                    text: window,
                    char_span: (start, end),
                });
                sequence_index += 1;
            }
            if end == chars.len() {
                break;
            }
            start += stride;
        }

        chunks
    }
}
