//! Artifact generation for publication subunits.
//!
//! For every publication with items this writes, into one output directory:
//! one GeoJSON FeatureCollection (`<id>.geojson`) and one MapML document per
//! file format (`<id>.<format>.mapml`). Items with blank or unparseable
//! geometry are skipped with a warning; a single file write failure never
//! aborts the rest of the batch. Only a directory that cannot be created
//! propagates as an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::warn;

use geopub_core::{PublicationItem, ThemePublication};

use crate::crs::SwissGridTransform;
use crate::geojson;
use crate::geometry::Geometry;
use crate::mapml::{self, SubunitFeature};
use crate::wkt::parse_wkt;

/// Writes per-publication GeoJSON and MapML artifacts to a fixed directory.
#[derive(Debug)]
pub struct ItemArtifactWriter {
    output_dir: PathBuf,
    transform: SwissGridTransform,
}

struct PreparedItem<'a> {
    item: &'a PublicationItem,
    geometry: Geometry,
}

impl ItemArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            transform: SwissGridTransform::new(),
        }
    }

    /// Generates all artifacts for the given publications. Per-item and
    /// per-file failures are logged and skipped; an uncreatable output
    /// directory aborts the whole batch.
    pub fn write_artifacts(&self, publications: &[ThemePublication]) -> io::Result<()> {
        if publications.is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.output_dir)?;

        for publication in publications {
            if publication.items.is_empty() {
                continue;
            }
            let prepared = self.prepare_items(publication);
            self.write_geojson(publication, &prepared);
            self.write_mapml(publication, &prepared);
        }
        Ok(())
    }

    /// Parses and reprojects every item geometry once, shared by both
    /// encoders. Blank geometries are silently skipped, parse failures warn.
    fn prepare_items<'a>(&self, publication: &'a ThemePublication) -> Vec<PreparedItem<'a>> {
        let mut prepared = Vec::new();
        for item in &publication.items {
            let Some(wkt) = item.geometry_str() else {
                continue;
            };
            let mut geometry = match parse_wkt(wkt) {
                Ok(geometry) => geometry,
                Err(e) => {
                    warn!(
                        item = item.identifier_str().unwrap_or("<unknown>"),
                        error = %e,
                        "skipping item with unparseable geometry"
                    );
                    continue;
                }
            };
            self.transform.transform_geometry(&mut geometry);
            prepared.push(PreparedItem { item, geometry });
        }
        prepared
    }

    fn write_geojson(&self, publication: &ThemePublication, prepared: &[PreparedItem<'_>]) {
        let mut features = Vec::new();
        for entry in prepared {
            let Some(geometry) = geojson::encode(&entry.geometry) else {
                continue;
            };

            let mut properties = serde_json::Map::new();
            if let Some(id) = entry.item.identifier_str() {
                properties.insert("identifier".to_string(), json!(id));
            }
            if let Some(title) = entry.item.title_str() {
                properties.insert("title".to_string(), json!(title));
            }
            if let Some(date) = entry.item.last_publishing_date {
                properties.insert("lastPublishingDate".to_string(), json!(date.to_string()));
            }
            if let Some(date) = entry.item.second_to_last_publishing_date {
                properties.insert(
                    "secondToLastPublishingDate".to_string(),
                    json!(date.to_string()),
                );
            }

            let mut feature = serde_json::Map::new();
            feature.insert("type".to_string(), json!("Feature"));
            if let Some(id) = entry.item.identifier_str() {
                feature.insert("id".to_string(), json!(id));
            }
            feature.insert("properties".to_string(), Value::Object(properties));
            feature.insert("geometry".to_string(), geometry);
            features.push(Value::Object(feature));
        }

        let collection = json!({
            "type": "FeatureCollection",
            "features": features,
        });

        let file_name = format!(
            "{}.geojson",
            sanitize_file_name(publication.identifier.as_deref())
        );
        let path = self.output_dir.join(&file_name);
        match serde_json::to_string_pretty(&collection) {
            Ok(content) => {
                if let Err(e) = fs::write(&path, content) {
                    warn!(path = %path.display(), error = %e, "failed to write GeoJSON file");
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to serialize GeoJSON");
            }
        }
    }

    fn write_mapml(&self, publication: &ThemePublication, prepared: &[PreparedItem<'_>]) {
        // A publication whose items all lack usable geometry gets no MapML
        // documents at all, not empty ones.
        if prepared.is_empty() {
            return;
        }

        let features: Vec<SubunitFeature> = prepared
            .iter()
            .map(|entry| SubunitFeature {
                identifier: entry.item.identifier_str().map(str::to_string),
                title: entry.item.title_str().map(str::to_string),
                geometry: entry.geometry.clone(),
            })
            .collect();

        for format in &publication.file_formats {
            let abbreviation = format.normalized_abbreviation();
            if abbreviation.is_empty() {
                continue;
            }

            let file_name = format!(
                "{}.{}.mapml",
                sanitize_file_name(publication.identifier.as_deref()),
                sanitize_file_name(Some(&abbreviation))
            );
            let path = self.output_dir.join(&file_name);
            let document = mapml::to_mapml(publication, &abbreviation, &features);
            if let Err(e) = fs::write(&path, document) {
                warn!(path = %path.display(), error = %e, "failed to write MapML file");
            }
        }
    }
}

/// Restricts a name to `[A-Za-z0-9._-]`, replacing everything else with `_`.
/// Blank input falls back to `items`. The same whitelist must be applied to
/// any user-supplied identifier before resolving it against the output
/// directory.
pub fn sanitize_file_name(identifier: Option<&str>) -> String {
    match identifier {
        Some(id) if !id.trim().is_empty() => id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
        _ => "items".to_string(),
    }
}

/// Checks that a file name resolved from user input stays inside the given
/// directory and contains no path separators.
///
/// The writer itself only produces sanitized names; this is for the
/// static-file responder serving the generated artifacts, which resolves
/// user-supplied identifier/format pairs into file names and must reject
/// traversal before reading.
pub fn is_safe_file_name(directory: &Path, file_name: &str) -> bool {
    if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.contains("..") {
        return false;
    }
    directory.join(file_name).starts_with(directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use geopub_core::FileFormat;

    const SQUARE_WKT: &str =
        "POLYGON((2610000 1210000, 2610100 1210000, 2610100 1210100, 2610000 1210100, 2610000 1210000))";

    fn publication() -> ThemePublication {
        ThemePublication {
            identifier: Some("ch.so.agi.alpha".to_string()),
            title: Some("Alpha Dataset".to_string()),
            download_host_url: Some("https://files.example.org".to_string()),
            file_formats: vec![
                FileFormat {
                    name: Some("GeoPackage".to_string()),
                    abbreviation: Some("gpkg.zip".to_string()),
                    ..FileFormat::default()
                },
                FileFormat {
                    name: Some("INTERLIS".to_string()),
                    abbreviation: Some("XTF.ZIP".to_string()),
                    ..FileFormat::default()
                },
            ],
            items: vec![
                PublicationItem {
                    identifier: Some("alpha-1".to_string()),
                    title: Some("Alpha One".to_string()),
                    last_publishing_date: NaiveDate::from_ymd_opt(2024, 3, 1),
                    geometry: Some(SQUARE_WKT.to_string()),
                    ..PublicationItem::default()
                },
                PublicationItem {
                    identifier: Some("alpha-2".to_string()),
                    geometry: Some("POLYGON((not wkt".to_string()),
                    ..PublicationItem::default()
                },
                PublicationItem {
                    identifier: Some("alpha-3".to_string()),
                    geometry: None,
                    ..PublicationItem::default()
                },
            ],
            ..ThemePublication::default()
        }
    }

    #[test]
    fn test_writes_geojson_and_mapml_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ItemArtifactWriter::new(dir.path());
        writer.write_artifacts(&[publication()]).unwrap();

        let geojson: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("ch.so.agi.alpha.geojson")).unwrap(),
        )
        .unwrap();
        assert_eq!(geojson["type"], "FeatureCollection");

        // Bad and missing geometries are skipped, the valid item survives.
        let features = geojson["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["id"], "alpha-1");
        assert_eq!(features[0]["properties"]["title"], "Alpha One");
        assert_eq!(features[0]["properties"]["lastPublishingDate"], "2024-03-01");

        // Coordinates are reprojected to Web Mercator.
        let x = features[0]["geometry"]["coordinates"][0][0][0].as_f64().unwrap();
        assert!((x - 842_712.19).abs() < 0.5);

        let mapml = fs::read_to_string(dir.path().join("ch.so.agi.alpha.gpkg.zip.mapml")).unwrap();
        assert!(mapml.contains("<map-featurecaption>Alpha One</map-featurecaption>"));
        assert!(mapml.contains("aktuell/alpha-1.gpkg.zip"));

        // Format abbreviations are normalized to lowercase.
        let mapml = fs::read_to_string(dir.path().join("ch.so.agi.alpha.xtf.zip.mapml")).unwrap();
        assert!(mapml.contains("aktuell/alpha-1.xtf.zip"));
    }

    #[test]
    fn test_publication_without_items_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ItemArtifactWriter::new(dir.path());
        let publication = ThemePublication {
            identifier: Some("ch.so.agi.empty".to_string()),
            ..ThemePublication::default()
        };
        writer.write_artifacts(&[publication]).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_no_usable_geometry_writes_no_mapml() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ItemArtifactWriter::new(dir.path());
        let mut publication = publication();
        for item in &mut publication.items {
            item.geometry = Some("POLYGON((broken".to_string());
        }
        writer.write_artifacts(&[publication]).unwrap();

        // The FeatureCollection is still written, just empty.
        let geojson: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("ch.so.agi.alpha.geojson")).unwrap(),
        )
        .unwrap();
        assert!(geojson["features"].as_array().unwrap().is_empty());

        // No per-format MapML documents with an empty body.
        let mapml_count = fs::read_dir(dir.path())
            .unwrap()
            .filter(|entry| {
                entry
                    .as_ref()
                    .unwrap()
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == "mapml")
            })
            .count();
        assert_eq!(mapml_count, 0);
    }

    #[test]
    fn test_identifier_is_sanitized_for_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ItemArtifactWriter::new(dir.path());
        let mut publication = publication();
        publication.identifier = Some("ch.so/agi:alpha".to_string());
        writer.write_artifacts(&[publication]).unwrap();
        assert!(dir.path().join("ch.so_agi_alpha.geojson").exists());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name(Some("ch.so.agi.av")), "ch.so.agi.av");
        assert_eq!(sanitize_file_name(Some("a b/c")), "a_b_c");
        assert_eq!(sanitize_file_name(Some("   ")), "items");
        assert_eq!(sanitize_file_name(None), "items");
    }

    #[test]
    fn test_is_safe_file_name() {
        let dir = Path::new("/srv/items");
        assert!(is_safe_file_name(dir, "ch.so.agi.alpha.geojson"));
        assert!(!is_safe_file_name(dir, "../etc/passwd"));
        assert!(!is_safe_file_name(dir, "a/b.geojson"));
        assert!(!is_safe_file_name(dir, ""));
    }
}
