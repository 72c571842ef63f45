//! Deterministic embedding double for tests and offline runs.

use async_trait::async_trait;
use ragdb_core::traits::EmbeddingService;
use ragdb_core::Result;

use crate::normalize;

/// Hashed bag-of-words embeddings: each whitespace token bumps one
/// hash-selected component, and the vector is L2-normalized. Identical text
/// always embeds to the identical vector, and overlapping vocabulary yields
/// positive cosine similarity, which is all retrieval tests need.
pub struct FakeEmbedding {
    dim: usize,
}

impl FakeEmbedding {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;

        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        normalize(&mut v);
        v
    }
}

#[async_trait]
impl EmbeddingService for FakeEmbedding {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
