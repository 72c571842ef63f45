//! Generation-based store layout.
//!
//! Each persisted generation is a directory `gen-<n>` holding two
//! co-located artifacts: `vectors.bin` (bincode: dimension, metric, and the
//! embedding rows in index order) and `records.json` (the parallel metadata
//! table, position -> chunk identity + text + metadata). `CURRENT` names
//! the active generation. Writers stage into a temp directory and rename,
//! then swap the pointer through a temp file, so a reader never observes
//! artifacts from two different generations.

use ragdb_core::types::{ChunkId, Meta, Metric, VectorRecord};
use ragdb_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::index::Index;

const CURRENT_FILE: &str = "CURRENT";
const VECTORS_FILE: &str = "vectors.bin";
const RECORDS_FILE: &str = "records.json";
const MANIFEST_FILE: &str = "manifest.json";

#[derive(Serialize, Deserialize)]
struct VectorsArtifact {
    dim: usize,
    metric: Metric,
    vectors: Vec<Vec<f32>>,
}

#[derive(Serialize, Deserialize)]
struct RecordRow {
    chunk_id: ChunkId,
    text: String,
    metadata: Meta,
}

/// Operational metadata for `status` output; not consulted on load.
#[derive(Serialize, Deserialize)]
struct Manifest {
    generation: u64,
    records: usize,
    dim: usize,
    metric: Metric,
    saved_at: String,
}

pub fn generation_dir(root: &Path, generation: u64) -> PathBuf {
    root.join(format!("gen-{generation:06}"))
}

/// Generation named by `CURRENT`, if the store has ever been persisted.
pub fn current_generation(root: &Path) -> Result<Option<u64>> {
    let pointer = root.join(CURRENT_FILE);
    if !pointer.exists() {
        return Ok(None);
    }
    let name = fs::read_to_string(&pointer)?;
    let name = name.trim();
    let generation = name
        .strip_prefix("gen-")
        .and_then(|n| n.parse::<u64>().ok())
        .ok_or_else(|| Error::CorruptStore(format!("unparseable CURRENT pointer '{name}'")))?;
    Ok(Some(generation))
}

/// Persist `index` as the next generation and swap `CURRENT` to it.
pub fn save(index: &Index, root: &Path) -> Result<u64> {
    fs::create_dir_all(root)?;
    let generation = current_generation(root)?.map_or(1, |g| g + 1);

    let staging = root.join(format!("gen-{generation:06}.tmp"));
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    let vectors = VectorsArtifact {
        dim: index.dim(),
        metric: index.metric(),
        vectors: index.records().iter().map(|r| r.embedding.clone()).collect(),
    };
    let encoded = bincode::serialize(&vectors)
        .map_err(|e| Error::CorruptStore(format!("failed to encode vectors: {e}")))?;
    write_file(&staging.join(VECTORS_FILE), &encoded)?;

    let rows: Vec<RecordRow> = index
        .records()
        .iter()
        .map(|r| RecordRow {
            chunk_id: r.chunk_id.clone(),
            text: r.text.clone(),
            metadata: r.metadata.clone(),
        })
        .collect();
    write_file(&staging.join(RECORDS_FILE), &serde_json::to_vec_pretty(&rows)?)?;

    let manifest = Manifest {
        generation,
        records: index.len(),
        dim: index.dim(),
        metric: index.metric(),
        saved_at: chrono::Utc::now().to_rfc3339(),
    };
    write_file(&staging.join(MANIFEST_FILE), &serde_json::to_vec_pretty(&manifest)?)?;

    let final_dir = generation_dir(root, generation);
    if final_dir.exists() {
        fs::remove_dir_all(&final_dir)?;
    }
    fs::rename(&staging, &final_dir)?;

    // Swap the pointer through a temp file so the update is atomic.
    let pointer_tmp = root.join(format!("{CURRENT_FILE}.tmp"));
    write_file(&pointer_tmp, format!("gen-{generation:06}").as_bytes())?;
    fs::rename(&pointer_tmp, root.join(CURRENT_FILE))?;

    info!(generation, records = index.len(), root = %root.display(), "persisted index generation");
    Ok(generation)
}

/// Load the generation named by `CURRENT`. Returns `Ok(None)` when the
/// store has never been persisted; structural disagreement between the two
/// artifacts is `CorruptStore`.
pub fn load(root: &Path, expected_dim: usize) -> Result<Option<Index>> {
    let Some(generation) = current_generation(root)? else {
        return Ok(None);
    };
    let dir = generation_dir(root, generation);

    let encoded = fs::read(dir.join(VECTORS_FILE))
        .map_err(|e| Error::CorruptStore(format!("missing vectors artifact: {e}")))?;
    let vectors: VectorsArtifact = bincode::deserialize(&encoded)
        .map_err(|e| Error::CorruptStore(format!("undecodable vectors artifact: {e}")))?;

    let rows: Vec<RecordRow> = serde_json::from_slice(
        &fs::read(dir.join(RECORDS_FILE))
            .map_err(|e| Error::CorruptStore(format!("missing metadata table: {e}")))?,
    )
    .map_err(|e| Error::CorruptStore(format!("undecodable metadata table: {e}")))?;

    if vectors.vectors.len() != rows.len() {
        return Err(Error::CorruptStore(format!(
            "artifact cardinality mismatch: {} vectors vs {} metadata rows",
            vectors.vectors.len(),
            rows.len()
        )));
    }
    if vectors.dim != expected_dim {
        return Err(Error::DimensionMismatch {
            expected: expected_dim,
            actual: vectors.dim,
        });
    }

    let records: Vec<VectorRecord> = rows
        .into_iter()
        .zip(vectors.vectors)
        .map(|(row, embedding)| VectorRecord {
            chunk_id: row.chunk_id,
            embedding,
            text: row.text,
            metadata: row.metadata,
        })
        .collect();

    let index = Index::from_parts(vectors.dim, vectors.metric, records)?;
    info!(generation, records = index.len(), "loaded index generation");
    Ok(Some(index))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    if let Err(e) = file.sync_all() {
        warn!(path = %path.display(), error = %e, "fsync failed");
    }
    Ok(())
}
