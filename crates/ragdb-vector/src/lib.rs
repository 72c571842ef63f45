//! Durable similarity index over chunk embeddings: flat exact k-NN with
//! generation-based persistence and an atomic active-snapshot swap.

pub mod index;
pub mod persist;
pub mod store;

pub use index::{Index, UpsertOutcome};
pub use store::{BuildReport, StoreStatus, VectorStore};
