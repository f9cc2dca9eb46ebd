//! Download badge support for file formats.
//!
//! The browse UI renders one download badge per file format. Known formats
//! get a fixed ordering and a short label; anything else sorts after the
//! known ones and falls back to an uppercased abbreviation or the format
//! name.

use crate::models::{FileFormat, ThemePublication};

/// Preferred badge order for known format abbreviations.
const ORDER: [(&str, usize); 7] = [
    ("xtf.zip", 0),
    ("itf.zip", 1),
    ("gpkg.zip", 2),
    ("shp.zip", 3),
    ("dxf.zip", 4),
    ("laz", 5),
    ("tif", 6),
];

const LABEL: [(&str, &str); 7] = [
    ("xtf.zip", "XTF"),
    ("itf.zip", "ITF"),
    ("gpkg.zip", "GPKG"),
    ("shp.zip", "SHP"),
    ("dxf.zip", "DXF"),
    ("laz", "LAZ"),
    ("tif", "GeoTIFF"),
];

fn order_rank(abbreviation: &str) -> usize {
    ORDER
        .iter()
        .find(|(key, _)| *key == abbreviation)
        .map(|(_, rank)| *rank)
        .unwrap_or(usize::MAX)
}

/// Returns the formats sorted for badge display: known abbreviations in
/// their fixed order, unknown ones after, alphabetically by abbreviation.
pub fn ordered_formats(file_formats: &[FileFormat]) -> Vec<FileFormat> {
    let mut formats: Vec<FileFormat> = file_formats.to_vec();
    formats.sort_by(|a, b| {
        let (a_key, b_key) = (a.normalized_abbreviation(), b.normalized_abbreviation());
        order_rank(&a_key)
            .cmp(&order_rank(&b_key))
            .then_with(|| a_key.cmp(&b_key))
    });
    formats
}

/// Short display label for a format badge.
pub fn badge_label(file_format: &FileFormat) -> String {
    let abbreviation = file_format.normalized_abbreviation();
    if let Some((_, label)) = LABEL.iter().find(|(key, _)| *key == abbreviation) {
        return (*label).to_string();
    }

    let stem = abbreviation
        .strip_suffix(".zip")
        .unwrap_or(&abbreviation)
        .trim();
    if !stem.is_empty() {
        return stem.to_uppercase();
    }

    match file_format.name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => String::new(),
    }
}

/// Badge label in the context of a publication. Raster publications without
/// subunits ship cloud-optimized GeoTIFFs, which get the long label.
pub fn publication_badge_label(publication: &ThemePublication, file_format: &FileFormat) -> String {
    if is_raster_without_subunits(publication) && file_format.normalized_abbreviation() == "tif" {
        return "Cloud Optimized GeoTIFF".to_string();
    }
    badge_label(file_format)
}

fn is_raster_without_subunits(publication: &ThemePublication) -> bool {
    if publication.has_subunits {
        return false;
    }
    match publication.model.as_deref() {
        None => true,
        Some(model) => model.trim().is_empty(),
    }
}
