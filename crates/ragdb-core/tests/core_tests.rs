use ragdb_core::config::{expand_path, ChunkingConfig, RagdbConfig};
use ragdb_core::types::Metric;
use ragdb_core::Error;

#[test]
fn default_config_validates() {
    let cfg = RagdbConfig::default();
    cfg.validate().expect("defaults are valid");
    assert_eq!(cfg.store.metric, Metric::Cosine);
    assert_eq!(cfg.store.dim, 1024);
    assert_eq!(cfg.query.top_k, 3);
}

#[test]
fn overlap_must_stay_below_window() {
    let mut cfg = RagdbConfig::default();
    cfg.chunking = ChunkingConfig {
        max_chars: 100,
        overlap: 100,
    };
    match cfg.validate() {
        Err(Error::InvalidConfig(msg)) => assert!(msg.contains("overlap")),
        _ => panic!("expected InvalidConfig"),
    }
}

#[test]
fn zero_top_k_is_rejected() {
    let mut cfg = RagdbConfig::default();
    cfg.query.top_k = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn expand_path_passes_plain_paths_through() {
    assert_eq!(expand_path("data/store"), std::path::PathBuf::from("data/store"));
}

#[test]
fn expand_path_resolves_env_vars() {
    std::env::set_var("RAGDB_TEST_BASE", "/tmp/ragdb");
    let p = expand_path("${RAGDB_TEST_BASE}/store");
    assert_eq!(p, std::path::PathBuf::from("/tmp/ragdb/store"));
}
