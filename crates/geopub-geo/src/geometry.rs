//! Geometry model shared by the parser, the transformer and both encoders.
//!
//! Exactly the seven standard vector kinds are supported. Geometries are
//! transient: parsed per item during artifact generation, transformed in
//! place, encoded, and discarded.
//!
//! Validity is decided at encoding time, not here: a ring or line needs at
//! least two coordinate pairs to render, and encoders drop anything below
//! that instead of propagating an error. The model itself permits empty
//! containers so a parsed `MULTIPOLYGON EMPTY` stays representable.

/// A 2D coordinate in a projected CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A sequence of coordinates forming a line or a polygon ring.
pub type Ring = Vec<Coord>;

/// One of the seven standard vector geometry kinds.
///
/// Polygon rings are ordered exterior first, interior rings after, matching
/// the WKT and GeoJSON conventions.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    MultiPoint(Vec<Coord>),
    LineString(Ring),
    MultiLineString(Vec<Ring>),
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// Total number of coordinate pairs in the tree. Used to check that
    /// reprojection never alters topology.
    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::MultiPoint(coords) => coords.len(),
            Geometry::LineString(ring) => ring.len(),
            Geometry::MultiLineString(rings) | Geometry::Polygon(rings) => {
                rings.iter().map(Vec::len).sum()
            }
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .flat_map(|rings| rings.iter())
                .map(Vec::len)
                .sum(),
            Geometry::GeometryCollection(children) => {
                children.iter().map(Geometry::vertex_count).sum()
            }
        }
    }

    /// Applies `f` to every coordinate in place, leaving ring order and part
    /// counts untouched.
    pub fn map_coords<F>(&mut self, f: &F)
    where
        F: Fn(Coord) -> Coord,
    {
        match self {
            Geometry::Point(coord) => *coord = f(*coord),
            Geometry::MultiPoint(coords) | Geometry::LineString(coords) => {
                for coord in coords.iter_mut() {
                    *coord = f(*coord);
                }
            }
            Geometry::MultiLineString(rings) | Geometry::Polygon(rings) => {
                for coord in rings.iter_mut().flatten() {
                    *coord = f(*coord);
                }
            }
            Geometry::MultiPolygon(polygons) => {
                for coord in polygons.iter_mut().flatten().flatten() {
                    *coord = f(*coord);
                }
            }
            Geometry::GeometryCollection(children) => {
                for child in children.iter_mut() {
                    child.map_coords(f);
                }
            }
        }
    }
}
