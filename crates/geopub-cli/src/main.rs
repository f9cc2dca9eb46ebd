use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use geopub_cli::{Command, Config};
use geopub_core::{
    load_theme_publications, ordered_formats, publication_badge_label, AppConfig, IndexingConfig,
    ThemePublication,
};
use geopub_geo::ItemArtifactWriter;
use geopub_index::CatalogIndex;

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Setup logging (stderr to keep stdout clean for JSON output)
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    // Parse command line arguments
    let config = Config::parse();
    let app_config = AppConfig {
        catalog_file: config.catalog_file.clone(),
        items_dir: config.items_dir.clone(),
    };
    let indexing_config = IndexingConfig {
        directory: config.index_dir.clone(),
        query_max_records: config.query_max_records,
    };

    let index = CatalogIndex::open(
        &indexing_config.directory,
        indexing_config.effective_max_records(),
    )
    .with_context(|| {
        format!(
            "failed to open search index at {}",
            indexing_config.directory.display()
        )
    })?;

    // Execute command
    match config.command {
        Command::Build => build(&app_config, &index)?,
        Command::List => list(&index)?,
        Command::Search { query } => search(&index, &query)?,
        Command::Show { identifier } => show(&index, &identifier)?,
    }

    Ok(())
}

/// Load the catalog, write map artifacts and rebuild the search index
fn build(app_config: &AppConfig, index: &CatalogIndex) -> anyhow::Result<()> {
    let publications = load_theme_publications(&app_config.catalog_file).with_context(|| {
        format!(
            "failed to load catalog from {}",
            app_config.catalog_file.display()
        )
    })?;
    info!("Loaded {} theme publications from catalog", publications.len());

    let writer = ItemArtifactWriter::new(&app_config.items_dir);
    writer.write_artifacts(&publications).with_context(|| {
        format!(
            "failed to write artifacts to {}",
            app_config.items_dir.display()
        )
    })?;

    index
        .rebuild(&publications)
        .context("failed to rebuild search index")?;

    println!(
        "Indexed {} publications, artifacts in {}",
        publications.len(),
        app_config.items_dir.display()
    );
    Ok(())
}

/// List all indexed publications sorted by title
fn list(index: &CatalogIndex) -> anyhow::Result<()> {
    let publications = index.find_all_sorted_by_title()?;
    if publications.is_empty() {
        println!("No publications indexed yet. Run: geopub build");
        return Ok(());
    }
    for publication in &publications {
        print_summary(publication);
    }
    Ok(())
}

/// Search indexed publications by free text
fn search(index: &CatalogIndex, query: &str) -> anyhow::Result<()> {
    let results = index
        .search(query)
        .with_context(|| format!("search for \"{query}\" failed"))?;

    if results.is_empty() {
        println!("No results for: \"{query}\"");
        return Ok(());
    }

    println!("Found {} publications for \"{query}\":\n", results.len());
    for (i, publication) in results.iter().enumerate() {
        print!("{}. ", i + 1);
        print_summary(publication);
        if let Some(description) = publication.short_description.as_deref() {
            println!("   {}", truncate_text(description, 120));
        }
    }
    Ok(())
}

/// Show a single publication as JSON
fn show(index: &CatalogIndex, identifier: &str) -> anyhow::Result<()> {
    match index.find_by_identifier(identifier)? {
        Some(publication) => {
            println!("{}", serde_json::to_string_pretty(&publication)?);
            Ok(())
        }
        None => anyhow::bail!("no publication found for identifier \"{identifier}\""),
    }
}

fn print_summary(publication: &ThemePublication) {
    let badges: Vec<String> = ordered_formats(&publication.file_formats)
        .iter()
        .map(|f| publication_badge_label(publication, f))
        .filter(|label| !label.is_empty())
        .collect();

    println!(
        "{} [{}]{}",
        publication.title.as_deref().unwrap_or("(untitled)"),
        publication.identifier.as_deref().unwrap_or("-"),
        if badges.is_empty() {
            String::new()
        } else {
            format!(" {}", badges.join(", "))
        }
    );
}

/// Truncate text to a maximum length, adding ellipsis if needed
fn truncate_text(text: &str, max_len: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= max_len {
        cleaned
    } else {
        let truncated: String = cleaned.chars().take(max_len).collect();
        format!("{truncated}...")
    }
}
