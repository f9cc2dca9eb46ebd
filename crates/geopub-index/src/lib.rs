//! geopub index - embedded full-text catalog search.
//!
//! Wraps a tantivy index over the publication catalog: weighted field
//! ranking for free-text queries, a sorted full listing, and exact
//! identifier lookup. The index owns its on-disk storage and rebuilds are
//! atomic generation swaps.

pub mod error;
pub mod index;

pub use error::SearchError;
pub use index::CatalogIndex;
