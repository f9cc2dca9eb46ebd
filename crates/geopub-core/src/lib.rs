//! geopub core - domain types, catalog loading and configuration.

pub mod catalog;
pub mod config;
pub mod error;
pub mod formats;
pub mod models;

pub use catalog::load_theme_publications;
pub use config::{AppConfig, IndexingConfig};
pub use error::CatalogError;
pub use formats::{badge_label, ordered_formats, publication_badge_label};
pub use models::{FileFormat, Office, PublicationItem, ThemePublication};
