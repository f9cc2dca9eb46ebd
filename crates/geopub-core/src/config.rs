//! Configuration types for geopub components.

use std::path::PathBuf;

/// Where the catalog XML lives and where generated artifacts go.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Catalog XML source-of-truth.
    pub catalog_file: PathBuf,
    /// Output directory for generated GeoJSON and MapML artifacts.
    pub items_dir: PathBuf,
}

/// Catalog index settings.
#[derive(Debug, Clone)]
pub struct IndexingConfig {
    /// Directory holding the on-disk index.
    pub directory: PathBuf,
    /// Upper bound on records returned per search query.
    pub query_max_records: usize,
}

impl IndexingConfig {
    /// Effective per-query record limit, never below 1.
    pub fn effective_max_records(&self) -> usize {
        self.query_max_records.max(1)
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("index"),
            query_max_records: 50,
        }
    }
}
