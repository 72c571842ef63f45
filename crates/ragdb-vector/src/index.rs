//! In-memory flat index: exact k-nearest-neighbor search by linear scan
//! over the record set, with upsert keyed on chunk identity.

use ragdb_core::types::{ChunkId, Metric, ScoredRecord, VectorRecord};
use ragdb_core::{Error, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Appended,
    Replaced,
}

/// An ordered collection of vector records plus a chunk-identity position
/// map. Owns its records exclusively; every record keeps its source text.
#[derive(Debug, Clone)]
pub struct Index {
    dim: usize,
    metric: Metric,
    records: Vec<VectorRecord>,
    positions: HashMap<ChunkId, usize>,
}

impl Index {
    pub fn new(dim: usize, metric: Metric) -> Self {
        Self {
            dim,
            metric,
            records: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Rebuild an index from an ordered record list, validating structural
    /// integrity. Used by the persistence layer.
    pub(crate) fn from_parts(
        dim: usize,
        metric: Metric,
        records: Vec<VectorRecord>,
    ) -> Result<Self> {
        let mut positions = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            if record.embedding.len() != dim {
                return Err(Error::CorruptStore(format!(
                    "record {} has dimension {}, index expects {}",
                    record.chunk_id,
                    record.embedding.len(),
                    dim
                )));
            }
            if positions.insert(record.chunk_id.clone(), pos).is_some() {
                return Err(Error::CorruptStore(format!(
                    "duplicate chunk identity {}",
                    record.chunk_id
                )));
            }
        }
        Ok(Self {
            dim,
            metric,
            records,
            positions,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[VectorRecord] {
        &self.records
    }

    /// Insert or replace by chunk identity. Replacement keeps the record's
    /// position, so repeated builds over an unchanged corpus leave the
    /// index bit-identical.
    pub fn upsert(&mut self, record: VectorRecord) -> Result<UpsertOutcome> {
        if record.embedding.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: record.embedding.len(),
            });
        }
        match self.positions.get(&record.chunk_id) {
            Some(&pos) => {
                self.records[pos] = record;
                Ok(UpsertOutcome::Replaced)
            }
            None => {
                self.positions.insert(record.chunk_id.clone(), self.records.len());
                self.records.push(record);
                Ok(UpsertOutcome::Appended)
            }
        }
    }

    /// Exact top-k search. Results are ordered by descending score; ties
    /// break by ascending chunk identity so results are deterministic. An
    /// empty index returns an empty vec; a query of the wrong dimension is
    /// a fatal configuration error.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        if top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be >= 1".into()));
        }
        if self.records.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut scored: Vec<ScoredRecord> = self
            .records
            .iter()
            .map(|record| ScoredRecord {
                chunk_id: record.chunk_id.clone(),
                score: score(self.metric, query, &record.embedding),
                text: record.text.clone(),
                metadata: record.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

/// Similarity score under `metric`; higher is always better.
pub fn score(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        Metric::Cosine => cosine(a, b),
        Metric::L2 => -l2_distance(a, b),
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (na * nb).max(1e-12)
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdb_core::types::Meta;

    fn record(doc: &str, seq: usize, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord {
            chunk_id: ChunkId::new(doc, seq),
            embedding,
            text: format!("{doc}:{seq}"),
            metadata: Meta::new(),
        }
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut index = Index::new(2, Metric::Cosine);
        assert_eq!(
            index.upsert(record("a", 0, vec![1.0, 0.0])).unwrap(),
            UpsertOutcome::Appended
        );
        assert_eq!(
            index.upsert(record("b", 0, vec![0.0, 1.0])).unwrap(),
            UpsertOutcome::Appended
        );
        assert_eq!(
            index.upsert(record("a", 0, vec![0.5, 0.5])).unwrap(),
            UpsertOutcome::Replaced
        );
        assert_eq!(index.len(), 2);
        assert_eq!(index.records()[0].embedding, vec![0.5, 0.5]);
    }

    #[test]
    fn dimension_mismatch_on_insert_is_fatal() {
        let mut index = Index::new(2, Metric::Cosine);
        let err = index.upsert(record("a", 0, vec![1.0, 0.0, 0.0])).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch { expected: 2, actual: 3 }
        ));
    }

    #[test]
    fn search_orders_by_descending_score() {
        let mut index = Index::new(2, Metric::Cosine);
        index.upsert(record("a", 0, vec![1.0, 0.0])).unwrap();
        index.upsert(record("b", 0, vec![0.0, 1.0])).unwrap();
        index.upsert(record("c", 0, vec![0.7, 0.7])).unwrap();

        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].chunk_id, ChunkId::new("a", 0));
        assert!(hits[0].score >= hits[1].score);
        assert!(hits[1].score >= hits[2].score);
    }

    #[test]
    fn ties_break_by_ascending_chunk_identity() {
        let mut index = Index::new(2, Metric::Cosine);
        // Identical vectors, so identical scores.
        index.upsert(record("b", 1, vec![1.0, 0.0])).unwrap();
        index.upsert(record("a", 7, vec![1.0, 0.0])).unwrap();
        index.upsert(record("a", 2, vec![1.0, 0.0])).unwrap();

        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.chunk_id.clone()).collect();
        assert_eq!(
            ids,
            vec![ChunkId::new("a", 2), ChunkId::new("a", 7), ChunkId::new("b", 1)]
        );
    }

    #[test]
    fn fewer_records_than_top_k_returns_all() {
        let mut index = Index::new(2, Metric::Cosine);
        index.upsert(record("a", 0, vec![1.0, 0.0])).unwrap();
        let hits = index.search(&[1.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn empty_index_returns_empty_not_error() {
        let index = Index::new(2, Metric::Cosine);
        assert!(index.search(&[1.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn query_dimension_mismatch_fails_fast() {
        let mut index = Index::new(2, Metric::Cosine);
        index.upsert(record("a", 0, vec![1.0, 0.0])).unwrap();
        let err = index.search(&[1.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn l2_metric_prefers_nearest() {
        let mut index = Index::new(1, Metric::L2);
        index.upsert(record("near", 0, vec![1.0])).unwrap();
        index.upsert(record("far", 0, vec![5.0])).unwrap();

        let hits = index.search(&[1.2], 2).unwrap();
        assert_eq!(hits[0].chunk_id, ChunkId::new("near", 0));
        assert!(hits[0].score > hits[1].score);
    }
}
