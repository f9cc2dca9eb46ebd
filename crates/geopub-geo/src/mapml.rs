//! MapML rendering of publication subunits.
//!
//! One document per (publication, file format) pair: a `map-head` with the
//! layer title and projection metadata, then one `map-feature` per item with
//! a caption, the reprojected geometry and a format-specific download link.
//! Encoding follows the same validity rules as the GeoJSON encoder, so a
//! feature whose geometry collapses entirely is left out of the document.

use std::fmt::Write as _;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use geopub_core::ThemePublication;

use crate::geometry::{Coord, Geometry, Ring};

const GEOMETRY_CLASS: &str = "subunit-geometry";

/// Path-segment encoding compatible with form-urlencoding, except that a
/// space becomes `%20` instead of `+`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'*')
    .remove(b'_');

/// One renderable subunit: identifying text plus its reprojected geometry.
#[derive(Debug, Clone)]
pub struct SubunitFeature {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub geometry: Geometry,
}

/// Renders the full MapML document for one publication and file format.
/// Features without any encodable geometry are skipped.
pub fn to_mapml(publication: &ThemePublication, format: &str, features: &[SubunitFeature]) -> String {
    let layer_label = format!(
        "{} (Subunits)",
        first_non_blank(&[
            publication.title.as_deref(),
            publication.identifier.as_deref(),
            Some("Subunits"),
        ])
        .unwrap_or("Subunits")
    );

    let mut mapml = String::new();
    mapml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    mapml.push_str("<mapml- lang=\"de\" xmlns=\"http://www.w3.org/1999/xhtml\">\n");
    mapml.push_str("  <map-head>\n");
    let _ = writeln!(mapml, "    <map-title>{}</map-title>", escape_xml(&layer_label));
    mapml.push_str("    <map-meta http-equiv=\"Content-Type\" content=\"text/mapml;charset=UTF-8\" />\n");
    mapml.push_str("    <map-meta charset=\"utf-8\" />\n");
    mapml.push_str("    <map-meta name=\"projection\" content=\"OSMTILE\" />\n");
    mapml.push_str("    <map-meta name=\"cs\" content=\"pcrs\" />\n");
    let _ = writeln!(
        mapml,
        "    <map-style>.{cls} {{ stroke: #1f6fd6; stroke-width: 3px; fill: #ffffff; fill-opacity: 0.4; }}.{cls}:hover, .{cls}:focus, .{cls}:active {{ stroke: #1f6fd6 !important; fill: #ffffff !important; fill-opacity: 0.1 !important; }}</map-style>",
        cls = GEOMETRY_CLASS
    );
    mapml.push_str("  </map-head>\n");
    mapml.push_str("  <map-body>\n");
    for feature in features {
        append_feature(&mut mapml, publication, format, feature);
    }
    mapml.push_str("  </map-body>\n");
    mapml.push_str("</mapml->\n");
    mapml
}

fn append_feature(
    mapml: &mut String,
    publication: &ThemePublication,
    format: &str,
    feature: &SubunitFeature,
) {
    let Some(geometry_markup) = encode_geometry(&feature.geometry) else {
        return;
    };

    let item_identifier = first_non_blank(&[feature.identifier.as_deref()]);
    let feature_title =
        first_non_blank(&[feature.title.as_deref(), item_identifier, Some("Subunit")])
            .unwrap_or("Subunit");
    let download_url = build_download_url(publication, item_identifier, format);

    mapml.push_str("    <map-feature");
    if let Some(id) = item_identifier {
        let _ = write!(mapml, " id=\"{}\"", escape_xml(id));
    }
    mapml.push_str(">\n");
    let _ = writeln!(
        mapml,
        "      <map-featurecaption>{}</map-featurecaption>",
        escape_xml(feature_title)
    );
    mapml.push_str("      <map-geometry cs=\"pcrs\">\n");
    mapml.push_str(&geometry_markup);
    mapml.push_str("      </map-geometry>\n");
    mapml.push_str("      <map-properties>\n");
    mapml.push_str("        <div>\n");
    let _ = writeln!(
        mapml,
        "          <p><strong>Subunit:</strong> {}</p>",
        escape_xml(feature_title)
    );
    if let Some(id) = item_identifier {
        let _ = writeln!(
            mapml,
            "          <p><strong>Identifier:</strong> {}</p>",
            escape_xml(id)
        );
    }
    if let Some(url) = download_url {
        let _ = writeln!(
            mapml,
            "          <p><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Download {}</a></p>",
            escape_xml(&url),
            escape_xml(&format.to_uppercase())
        );
    }
    mapml.push_str("        </div>\n");
    mapml.push_str("      </map-properties>\n");
    mapml.push_str("    </map-feature>\n");
}

/// Encodes one geometry as a MapML fragment. Returns `None` when nothing
/// valid remains, so the caller can omit the whole feature.
pub fn encode_geometry(geometry: &Geometry) -> Option<String> {
    match geometry {
        Geometry::Point(c) => Some(format!(
            "        <map-point class=\"{GEOMETRY_CLASS}\"><map-coordinates>{}</map-coordinates></map-point>\n",
            pair(*c)
        )),
        Geometry::MultiPoint(points) => {
            if points.is_empty() {
                return None;
            }
            let text = points.iter().map(|c| pair(*c)).collect::<Vec<_>>().join(" ");
            Some(format!(
                "        <map-multipoint class=\"{GEOMETRY_CLASS}\"><map-coordinates>{text}</map-coordinates></map-multipoint>\n"
            ))
        }
        Geometry::LineString(line) => {
            let coords = line_text(line)?;
            Some(format!(
                "        <map-linestring class=\"{GEOMETRY_CLASS}\"><map-coordinates>{coords}</map-coordinates></map-linestring>\n"
            ))
        }
        Geometry::MultiLineString(lines) => {
            let mut content = String::new();
            for line in lines {
                if let Some(coords) = line_text(line) {
                    let _ = writeln!(content, "          <map-coordinates>{coords}</map-coordinates>");
                }
            }
            if content.is_empty() {
                return None;
            }
            Some(format!(
                "        <map-multilinestring class=\"{GEOMETRY_CLASS}\">\n{content}        </map-multilinestring>\n"
            ))
        }
        Geometry::Polygon(rings) => {
            let content = ring_block(rings, "          ")?;
            Some(format!(
                "        <map-polygon class=\"{GEOMETRY_CLASS}\">\n{content}        </map-polygon>\n"
            ))
        }
        Geometry::MultiPolygon(polygons) => {
            let mut content = String::new();
            for rings in polygons {
                if let Some(block) = ring_block(rings, "            ") {
                    let _ = write!(
                        content,
                        "          <map-polygon class=\"{GEOMETRY_CLASS}\">\n{block}          </map-polygon>\n"
                    );
                }
            }
            if content.is_empty() {
                return None;
            }
            Some(format!(
                "        <map-multipolygon class=\"{GEOMETRY_CLASS}\">\n{content}        </map-multipolygon>\n"
            ))
        }
        Geometry::GeometryCollection(children) => {
            let mut content = String::new();
            for child in children {
                if let Some(fragment) = encode_geometry(child) {
                    content.push_str(&fragment);
                }
            }
            if content.is_empty() {
                return None;
            }
            Some(format!(
                "        <map-geometrycollection>\n{content}        </map-geometrycollection>\n"
            ))
        }
    }
}

/// Builds the format-specific download link. All four inputs must be
/// present, otherwise the feature carries no link at all.
pub fn build_download_url(
    publication: &ThemePublication,
    item_identifier: Option<&str>,
    format: &str,
) -> Option<String> {
    let host = publication.download_host_url.as_deref().filter(|h| !h.trim().is_empty())?;
    let publication_id = publication.identifier.as_deref().filter(|i| !i.trim().is_empty())?;
    let item_id = item_identifier.filter(|i| !i.trim().is_empty())?;
    if format.trim().is_empty() {
        return None;
    }

    let host = host.trim_end_matches('/');
    Some(format!(
        "{host}/{}/aktuell/{}",
        encode_path_segment(publication_id),
        encode_path_segment(&format!("{item_id}.{format}"))
    ))
}

fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

fn pair(c: Coord) -> String {
    format!("{} {}", c.x, c.y)
}

fn line_text(line: &Ring) -> Option<String> {
    if line.len() < 2 {
        return None;
    }
    Some(line.iter().map(|c| pair(*c)).collect::<Vec<_>>().join(" "))
}

fn ring_block(rings: &[Ring], indent: &str) -> Option<String> {
    let mut content = String::new();
    for ring in rings {
        if let Some(coords) = line_text(ring) {
            let _ = writeln!(content, "{indent}<map-coordinates>{coords}</map-coordinates>");
        }
    }
    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}

fn first_non_blank<'a>(values: &[Option<&'a str>]) -> Option<&'a str> {
    values
        .iter()
        .flatten()
        .copied()
        .find(|v| !v.trim().is_empty())
}

pub(crate) fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
