//! Index error types.

use thiserror::Error;

/// Failures raised by the catalog index.
///
/// `InvalidQuery` is a client-side condition (every search token stripped to
/// nothing); everything else is a storage-backend failure that aborts the
/// enclosing rebuild or query.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Every token of the query was stripped to the empty string.
    #[error("no valid search tokens")]
    InvalidQuery,

    #[error("search backend failure: {0}")]
    Backend(#[from] tantivy::TantivyError),

    #[error("failed to open index directory: {0}")]
    OpenDirectory(#[from] tantivy::directory::error::OpenDirectoryError),

    #[error("index storage failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize publication payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl SearchError {
    /// Whether the failure should be reported as a client error rather than
    /// a server-side one.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SearchError::InvalidQuery)
    }
}
