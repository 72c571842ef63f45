//! Recursive document loader with per-file failure recovery.

use ragdb_core::types::{Document, Meta, SourceFormat};
use ragdb_core::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::extract;

/// One skipped file and the reason extraction failed.
#[derive(Debug, Clone)]
pub struct IngestFailure {
    pub path: String,
    pub reason: String,
}

/// Per-batch accounting. Extraction failures are isolated here instead of
/// aborting the batch.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub files_seen: usize,
    pub loaded: usize,
    pub skipped_unsupported: usize,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn summary(&self) -> String {
        format!(
            "{} files seen, {} loaded, {} unsupported, {} failed",
            self.files_seen,
            self.loaded,
            self.skipped_unsupported,
            self.failures.len()
        )
    }
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub documents: Vec<Document>,
    pub report: IngestReport,
}

/// Walks a root directory and produces one `Document` per supported file.
/// Hidden files are skipped; unsupported extensions are skipped; a file
/// that fails extraction is recorded in the report and the batch continues.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load_directory(&self, root: &Path) -> Result<LoadOutcome> {
        self.load_files(root, self.list_files(root))
    }

    /// Same as `load_directory` but caps the number of files processed.
    pub fn load_directory_limited(&self, root: &Path, limit: usize) -> Result<LoadOutcome> {
        let mut files = self.list_files(root);
        if files.len() > limit {
            files.truncate(limit);
            debug!(limit, "file list truncated");
        }
        self.load_files(root, files)
    }

    /// Load a single file. Returns `Ok(None)` for unsupported extensions.
    pub fn load_file(&self, root: &Path, path: &Path) -> Result<Option<Document>> {
        let format = SourceFormat::from_path(path);
        if format == SourceFormat::Unsupported {
            debug!(path = %path.display(), "skipping unsupported extension");
            return Ok(None);
        }
        let text = extract::extract_text(path, format)?;

        let mut metadata = Meta::new();
        metadata.insert("format".to_string(), format.label().to_string());
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            metadata.insert("file_name".to_string(), name.to_string());
        }
        if let Some(folder) = self.folder_of(root, path) {
            metadata.insert("folder".to_string(), folder);
        }

        Ok(Some(Document::new(
            path.display().to_string(),
            format,
            text,
            metadata,
        )))
    }

    fn load_files(&self, root: &Path, files: Vec<PathBuf>) -> Result<LoadOutcome> {
        let mut report = IngestReport {
            files_seen: files.len(),
            ..IngestReport::default()
        };
        let mut documents = Vec::new();

        for path in files {
            match self.load_file(root, &path) {
                Ok(Some(doc)) => {
                    documents.push(doc);
                    report.loaded += 1;
                }
                Ok(None) => report.skipped_unsupported += 1,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping file");
                    report.failures.push(IngestFailure {
                        path: path.display().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(LoadOutcome { documents, report })
    }

    /// Files under `root`, hidden entries excluded, sorted for reproducible
    /// logging. Downstream stages must not depend on this order.
    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    continue;
                }
            }
            files.push(path.to_path_buf());
        }
        files.sort();
        files
    }

    /// Relative parent directory of `path`, used as a coarse grouping facet.
    fn folder_of(&self, root: &Path, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let parent = relative.parent()?;
        if parent.as_os_str().is_empty() {
            return None;
        }
        parent.to_str().map(|s| s.to_string())
    }
}
