//! Document loading and chunking.
//!
//! `loader` walks a directory tree and turns supported files into normalized
//! `Document` records, recovering per-file failures into an `IngestReport`.
//! `chunker` slides a deterministic overlapping window over each document.

pub mod chunker;
mod extract;
pub mod loader;

pub use chunker::Chunker;
pub use loader::{DocumentLoader, IngestFailure, IngestReport, LoadOutcome};
