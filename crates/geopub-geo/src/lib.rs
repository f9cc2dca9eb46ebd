//! geopub geo - geometry parsing, reprojection and artifact encoding.
//!
//! The pipeline runs per publication item: [`wkt`] parses the stored
//! well-known text into a [`geometry::Geometry`] tree, [`crs`] reprojects it
//! from the Swiss LV95 grid to Web Mercator, and [`geojson`] / [`mapml`]
//! serialize the result. [`writer`] orchestrates the whole thing and writes
//! the per-publication files to disk.

pub mod crs;
pub mod geojson;
pub mod geometry;
pub mod mapml;
pub mod wkt;
pub mod writer;

pub use crs::SwissGridTransform;
pub use geometry::{Coord, Geometry, Ring};
pub use mapml::SubunitFeature;
pub use wkt::{parse_wkt, WktParseError};
pub use writer::{is_safe_file_name, sanitize_file_name, ItemArtifactWriter};
