use std::fs;
use std::sync::Arc;

use ragdb_core::config::RagdbConfig;
use ragdb_core::types::{Document, Meta, Metric, SourceFormat};
use ragdb_core::Error;
use ragdb_embed::FakeEmbedding;
use ragdb_vector::VectorStore;
use tempfile::TempDir;

const DIM: usize = 32;

fn config(root: &TempDir, metric: Metric) -> RagdbConfig {
    let mut cfg = RagdbConfig::default();
    cfg.store.root = root.path().join("store").display().to_string();
    cfg.store.dim = DIM;
    cfg.store.metric = metric;
    cfg.chunking.max_chars = 40;
    cfg.chunking.overlap = 0;
    cfg
}

fn store(root: &TempDir, metric: Metric) -> VectorStore {
    VectorStore::new(&config(root, metric), Arc::new(FakeEmbedding::new(DIM))).expect("store")
}

fn doc(path: &str, text: &str) -> Document {
    Document::new(path.to_string(), SourceFormat::PlainText, text.to_string(), Meta::new())
}

fn corpus() -> Vec<Document> {
    vec![
        doc("data/attention.txt", "Transformers use self-attention."),
        doc("data/cnn.txt", "Convolutional networks use learned filters."),
        doc("data/rnn.txt", "Recurrent networks process sequences step by step."),
    ]
}

#[tokio::test]
async fn build_twice_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, Metric::Cosine);
    let docs = corpus();

    let first = store.build_from_documents(&docs).await.expect("first build");
    store.persist().await.expect("persist");
    let snapshot_a = store.snapshot();

    let second = store.build_from_documents(&docs).await.expect("second build");
    store.persist().await.expect("persist again");
    let snapshot_b = store.snapshot();

    assert_eq!(first.appended, first.chunks);
    assert_eq!(second.replaced, second.chunks);
    assert_eq!(second.appended, 0);
    assert_eq!(snapshot_a.len(), snapshot_b.len());
    for (a, b) in snapshot_a.records().iter().zip(snapshot_b.records()) {
        assert_eq!(a.chunk_id, b.chunk_id);
        assert_eq!(a.embedding, b.embedding);
        assert_eq!(a.text, b.text);
    }
}

#[tokio::test]
async fn query_returns_descending_scores() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, Metric::Cosine);
    store.build_from_documents(&corpus()).await.expect("build");
    store.persist().await.expect("persist");

    let hits = store.query("networks and sequences", 3).await.expect("query");
    assert_eq!(hits.len(), 3);
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn top_k_larger_than_store_returns_all() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, Metric::Cosine);
    store
        .build_from_documents(&[doc("only.txt", "A single tiny document.")])
        .await
        .expect("build");
    store.persist().await.expect("persist");

    let hits = store.query("tiny", 10).await.expect("query");
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn empty_store_queries_return_no_hits() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, Metric::Cosine);
    let hits = store.query("anything", 5).await.expect("query");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn persist_then_load_round_trips_query_results() {
    let tmp = TempDir::new().unwrap();
    let cfg = config(&tmp, Metric::Cosine);
    let docs = corpus();

    let writer = VectorStore::new(&cfg, Arc::new(FakeEmbedding::new(DIM))).unwrap();
    writer.build_from_documents(&docs).await.expect("build");
    writer.persist().await.expect("persist");
    let before = writer.query("self-attention", 3).await.expect("query");

    let reader = VectorStore::new(&cfg, Arc::new(FakeEmbedding::new(DIM))).unwrap();
    reader.load().await.expect("load");
    let after = reader.query("self-attention", 3).await.expect("query");

    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.chunk_id, b.chunk_id);
        assert!((a.score - b.score).abs() < 1e-6);
        assert_eq!(a.text, b.text);
    }
}

#[tokio::test]
async fn load_without_persisted_generation_is_empty_not_error() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, Metric::Cosine);
    store.load().await.expect("load");
    assert!(store.query("anything", 3).await.expect("query").is_empty());
}

#[tokio::test]
async fn cardinality_mismatch_is_corrupt_store() {
    let tmp = TempDir::new().unwrap();
    let cfg = config(&tmp, Metric::Cosine);

    let writer = VectorStore::new(&cfg, Arc::new(FakeEmbedding::new(DIM))).unwrap();
    writer.build_from_documents(&corpus()).await.expect("build");
    writer.persist().await.expect("persist");

    // Drop a row from the metadata table so the artifacts disagree.
    let store_root = tmp.path().join("store");
    let gen_dir = fs::read_dir(&store_root)
        .unwrap()
        .filter_map(|e| e.ok())
        .find(|e| e.file_name().to_string_lossy().starts_with("gen-"))
        .expect("generation dir")
        .path();
    let records_path = gen_dir.join("records.json");
    let mut rows: serde_json::Value =
        serde_json::from_slice(&fs::read(&records_path).unwrap()).unwrap();
    rows.as_array_mut().unwrap().pop();
    fs::write(&records_path, serde_json::to_vec(&rows).unwrap()).unwrap();

    let reader = VectorStore::new(&cfg, Arc::new(FakeEmbedding::new(DIM))).unwrap();
    let err = reader.load().await.unwrap_err();
    assert!(matches!(err, Error::CorruptStore(_)));
}

#[tokio::test]
async fn readers_keep_their_snapshot_across_a_rebuild() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, Metric::Cosine);
    store
        .build_from_documents(&[doc("a.txt", "First generation content.")])
        .await
        .expect("build");
    store.persist().await.expect("persist");

    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 1);

    store
        .build_from_documents(&[doc("b.txt", "Second generation content.")])
        .await
        .expect("rebuild");
    store.persist().await.expect("persist again");

    // The old snapshot is unchanged; the new active generation grew.
    assert_eq!(snapshot.len(), 1);
    assert_eq!(store.snapshot().len(), 2);
}

#[tokio::test]
async fn build_is_not_visible_until_persist() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, Metric::Cosine);
    store
        .build_from_documents(&[doc("a.txt", "Pending content.")])
        .await
        .expect("build");

    assert!(store.query("pending", 3).await.expect("query").is_empty());
    store.persist().await.expect("persist");
    assert_eq!(store.query("pending", 3).await.expect("query").len(), 1);
}

#[tokio::test]
async fn l2_metric_round_trips_through_persistence() {
    let tmp = TempDir::new().unwrap();
    let cfg = config(&tmp, Metric::L2);

    let writer = VectorStore::new(&cfg, Arc::new(FakeEmbedding::new(DIM))).unwrap();
    writer.build_from_documents(&corpus()).await.expect("build");
    writer.persist().await.expect("persist");

    let reader = VectorStore::new(&cfg, Arc::new(FakeEmbedding::new(DIM))).unwrap();
    reader.load().await.expect("load");
    let status = reader.status().expect("status");
    assert_eq!(status.metric, Metric::L2);

    let hits = reader.query("self-attention", 2).await.expect("query");
    assert_eq!(hits.len(), 2);
    assert!(hits[0].score >= hits[1].score);
}

#[tokio::test]
async fn status_reports_generation_and_counts() {
    let tmp = TempDir::new().unwrap();
    let store = store(&tmp, Metric::Cosine);

    let before = store.status().expect("status");
    assert_eq!(before.records, 0);
    assert_eq!(before.generation, None);

    store.build_from_documents(&corpus()).await.expect("build");
    store.persist().await.expect("persist");
    store.build_from_documents(&corpus()).await.expect("build");
    store.persist().await.expect("persist");

    let after = store.status().expect("status");
    assert!(after.records > 0);
    assert_eq!(after.generation, Some(2));
}

#[tokio::test]
async fn mismatched_service_dimension_is_rejected_at_construction() {
    let tmp = TempDir::new().unwrap();
    let cfg = config(&tmp, Metric::Cosine);
    let err = VectorStore::new(&cfg, Arc::new(FakeEmbedding::new(DIM + 1))).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}
