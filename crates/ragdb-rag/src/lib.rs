//! Retrieval-augmented search and summarization over a vector store.

pub mod orchestrator;
pub mod summarizer;

pub use orchestrator::{assemble_context, QueryStage, RagAnswer, RagSearch};
pub use summarizer::{default_summarizer, HttpSummarizer, TemplateSummarizer};
