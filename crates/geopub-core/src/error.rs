use thiserror::Error;

/// Errors raised while loading the catalog source-of-truth.
///
/// Loader failures are startup failures: without a parsed catalog there is
/// nothing to index and nothing to generate, so these propagate to the
/// caller instead of being skipped per record.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Reading the catalog file failed.
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not valid catalog XML.
    #[error("failed to parse catalog XML: {0}")]
    Xml(#[from] quick_xml::DeError),
}
