use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "geopub")]
#[command(
    author,
    version,
    about = "Catalog index and map artifact pipeline for theme publications"
)]
#[command(after_help = "Examples:
  geopub build --catalog-file themepublications.xml
  geopub list
  geopub search \"gebäudeadressen\"
  geopub show ch.so.agi.av_gebaeudeadressen")]
pub struct Config {
    /// Path to the theme publication catalog XML file
    #[arg(long, env = "GEOPUB_CATALOG_FILE", default_value = "themepublications.xml")]
    pub catalog_file: PathBuf,

    /// Output directory for generated GeoJSON and MapML artifacts
    #[arg(long, env = "GEOPUB_ITEMS_DIR", default_value = "items")]
    pub items_dir: PathBuf,

    /// Directory holding the search index
    #[arg(long, env = "GEOPUB_INDEX_DIR", default_value = "index")]
    pub index_dir: PathBuf,

    /// Maximum number of records a search returns
    #[arg(long, env = "GEOPUB_QUERY_MAX_RECORDS", default_value = "50")]
    pub query_max_records: usize,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the catalog, generate map artifacts and rebuild the search index
    #[command(after_help = "Example: geopub build --catalog-file config/themepublications.xml")]
    Build,
    /// List all indexed publications sorted by title
    List,
    /// Search indexed publications by free text
    #[command(after_help = "Example: geopub search \"amtliche vermessung\"")]
    Search {
        /// Search query text
        query: String,
    },
    /// Show a single publication as JSON
    Show {
        /// Publication identifier, matched case-insensitively
        identifier: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["geopub", "list"]);
        assert_eq!(config.catalog_file, PathBuf::from("themepublications.xml"));
        assert_eq!(config.items_dir, PathBuf::from("items"));
        assert_eq!(config.index_dir, PathBuf::from("index"));
        assert_eq!(config.query_max_records, 50);
        assert!(matches!(config.command, Command::List));
    }

    #[test]
    fn test_search_subcommand() {
        let config = Config::parse_from(["geopub", "search", "amtliche vermessung"]);
        match config.command {
            Command::Search { query } => assert_eq!(query, "amtliche vermessung"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_overrides() {
        let config = Config::parse_from([
            "geopub",
            "--index-dir",
            "/var/lib/geopub/index",
            "--query-max-records",
            "10",
            "show",
            "ch.so.agi.alpha",
        ]);
        assert_eq!(config.index_dir, PathBuf::from("/var/lib/geopub/index"));
        assert_eq!(config.query_max_records, 10);
        assert!(matches!(config.command, Command::Show { .. }));
    }
}
