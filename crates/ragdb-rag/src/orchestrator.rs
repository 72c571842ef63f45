//! Search-then-summarize orchestration.
//!
//! One query runs through `EmbedQuery -> Retrieve -> AssembleContext ->
//! Summarize -> Done`; a failure at any stage aborts that query only. The
//! whole path is read-only, so an abandoned query has nothing to roll back.

use ragdb_core::config::QueryConfig;
use ragdb_core::traits::Summarizer;
use ragdb_core::types::ScoredRecord;
use ragdb_core::{Error, Result};
use ragdb_vector::VectorStore;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    EmbedQuery,
    Retrieve,
    AssembleContext,
    Summarize,
    Done,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EmbedQuery => "embed_query",
            Self::Retrieve => "retrieve",
            Self::AssembleContext => "assemble_context",
            Self::Summarize => "summarize",
            Self::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Final answer plus the retrieval evidence it was grounded on.
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub summary: String,
    pub hits: Vec<ScoredRecord>,
    pub context_chars: usize,
    pub no_context: bool,
}

pub struct RagSearch {
    store: Arc<VectorStore>,
    summarizer: Arc<dyn Summarizer>,
    defaults: QueryConfig,
}

impl RagSearch {
    pub fn new(
        store: Arc<VectorStore>,
        summarizer: Arc<dyn Summarizer>,
        defaults: QueryConfig,
    ) -> Self {
        Self {
            store,
            summarizer,
            defaults,
        }
    }

    /// Answer `query` from the store's contents. `top_k` falls back to the
    /// configured default. Zero retrieval hits are not an error: the
    /// summarizer is told that no grounding context was found.
    pub async fn search_and_summarize(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<RagAnswer> {
        // Rejected before any external call.
        if query.trim().is_empty() {
            return Err(Error::InvalidQuery);
        }
        let top_k = top_k.unwrap_or(self.defaults.top_k);
        if top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be >= 1".into()));
        }

        let mut stage = QueryStage::EmbedQuery;
        debug!(%stage, "query accepted");
        let query_vec = self
            .store
            .embedder()
            .embed_one(query)
            .await
            .map_err(|e| fail(stage, e))?;

        stage = QueryStage::Retrieve;
        let hits = self
            .store
            .search_vector(&query_vec, top_k)
            .map_err(|e| fail(stage, e))?;
        debug!(%stage, hits = hits.len());

        stage = QueryStage::AssembleContext;
        let (context, context_chars) =
            assemble_context(&hits, self.defaults.max_context_chars);

        stage = QueryStage::Summarize;
        let no_context = context.is_none();
        let summary = self
            .summarizer
            .summarize(query, context.as_deref())
            .await
            .map_err(|e| fail(stage, e))?;

        stage = QueryStage::Done;
        debug!(%stage, context_chars, no_context);
        Ok(RagAnswer {
            summary,
            hits,
            context_chars,
            no_context,
        })
    }
}

fn fail(stage: QueryStage, err: Error) -> Error {
    warn!(%stage, error = %err, "query failed");
    err
}

/// Concatenate hit texts in descending-score order under a character
/// budget. The first hit that does not fit ends assembly, so the dropped
/// chunks are always the lowest-scoring suffix and no chunk is ever
/// truncated mid-text. Returns `None` when nothing fits or there were no
/// hits.
pub fn assemble_context(hits: &[ScoredRecord], max_chars: usize) -> (Option<String>, usize) {
    let mut context = String::new();
    let mut used = 0usize;

    for hit in hits {
        let chunk_chars = hit.text.chars().count();
        let extra = if context.is_empty() {
            chunk_chars
        } else {
            chunk_chars + 2
        };
        if used + extra > max_chars {
            break;
        }
        if !context.is_empty() {
            context.push_str("\n\n");
        }
        context.push_str(&hit.text);
        used += extra;
    }

    if context.is_empty() {
        (None, 0)
    } else {
        (Some(context), used)
    }
}
