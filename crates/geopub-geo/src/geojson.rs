//! GeoJSON encoding of geometry trees.
//!
//! Degenerate content (a line or ring with fewer than two coordinate pairs)
//! is dropped rather than emitted; a container left with nothing valid
//! encodes to `None` so callers can omit the feature entirely.

use serde_json::{json, Value};

use crate::geometry::{Coord, Geometry, Ring};

/// Encodes a geometry as a GeoJSON geometry object. Returns `None` when
/// nothing valid remains after degenerate parts are dropped.
pub fn encode(geometry: &Geometry) -> Option<Value> {
    match geometry {
        Geometry::Point(c) => Some(json!({
            "type": "Point",
            "coordinates": position(*c),
        })),
        Geometry::MultiPoint(points) => {
            if points.is_empty() {
                return None;
            }
            Some(json!({
                "type": "MultiPoint",
                "coordinates": points.iter().map(|c| position(*c)).collect::<Vec<_>>(),
            }))
        }
        Geometry::LineString(line) => Some(json!({
            "type": "LineString",
            "coordinates": line_positions(line)?,
        })),
        Geometry::MultiLineString(lines) => {
            let lines: Vec<Value> = lines.iter().filter_map(|l| line_positions(l)).collect();
            if lines.is_empty() {
                return None;
            }
            Some(json!({ "type": "MultiLineString", "coordinates": lines }))
        }
        Geometry::Polygon(rings) => Some(json!({
            "type": "Polygon",
            "coordinates": polygon_positions(rings)?,
        })),
        Geometry::MultiPolygon(polygons) => {
            let polygons: Vec<Value> = polygons
                .iter()
                .filter_map(|rings| polygon_positions(rings))
                .collect();
            if polygons.is_empty() {
                return None;
            }
            Some(json!({ "type": "MultiPolygon", "coordinates": polygons }))
        }
        Geometry::GeometryCollection(children) => {
            let children: Vec<Value> = children.iter().filter_map(encode).collect();
            if children.is_empty() {
                return None;
            }
            Some(json!({
                "type": "GeometryCollection",
                "geometries": children,
            }))
        }
    }
}

fn position(c: Coord) -> Value {
    json!([c.x, c.y])
}

/// A line or ring needs at least two pairs to mean anything.
fn line_positions(line: &Ring) -> Option<Value> {
    if line.len() < 2 {
        return None;
    }
    Some(Value::Array(line.iter().map(|c| position(*c)).collect()))
}

fn polygon_positions(rings: &[Ring]) -> Option<Value> {
    let rings: Vec<Value> = rings.iter().filter_map(line_positions).collect();
    if rings.is_empty() {
        return None;
    }
    Some(Value::Array(rings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_point() {
        let geom = Geometry::Point(Coord::new(1.5, 2.5));
        assert_eq!(
            encode(&geom),
            Some(json!({ "type": "Point", "coordinates": [1.5, 2.5] }))
        );
    }

    #[test]
    fn test_encode_polygon_with_hole() {
        let geom = Geometry::Polygon(vec![
            vec![
                Coord::new(0.0, 0.0),
                Coord::new(4.0, 0.0),
                Coord::new(4.0, 4.0),
                Coord::new(0.0, 0.0),
            ],
            vec![
                Coord::new(1.0, 1.0),
                Coord::new(2.0, 1.0),
                Coord::new(1.0, 2.0),
                Coord::new(1.0, 1.0),
            ],
        ]);
        let value = encode(&geom).unwrap();
        assert_eq!(value["type"], "Polygon");
        assert_eq!(value["coordinates"].as_array().unwrap().len(), 2);
        assert_eq!(value["coordinates"][0][1], json!([4.0, 0.0]));
    }

    #[test]
    fn test_degenerate_polygon_is_dropped() {
        let geom = Geometry::Polygon(vec![vec![Coord::new(1.0, 1.0)]]);
        assert_eq!(encode(&geom), None);
    }

    #[test]
    fn test_polygon_keeps_valid_rings_only() {
        let geom = Geometry::Polygon(vec![
            vec![Coord::new(9.0, 9.0)],
            vec![Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)],
        ]);
        let value = encode(&geom).unwrap();
        assert_eq!(value["coordinates"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_degenerate_line_is_dropped() {
        assert_eq!(encode(&Geometry::LineString(vec![Coord::new(0.0, 0.0)])), None);
        assert_eq!(encode(&Geometry::LineString(vec![])), None);
    }

    #[test]
    fn test_multi_polygon_drops_empty_members() {
        let geom = Geometry::MultiPolygon(vec![
            vec![vec![Coord::new(5.0, 5.0)]],
            vec![vec![
                Coord::new(0.0, 0.0),
                Coord::new(1.0, 0.0),
                Coord::new(0.0, 1.0),
                Coord::new(0.0, 0.0),
            ]],
        ]);
        let value = encode(&geom).unwrap();
        assert_eq!(value["type"], "MultiPolygon");
        assert_eq!(value["coordinates"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_collection_recurses_and_filters() {
        let geom = Geometry::GeometryCollection(vec![
            Geometry::Point(Coord::new(1.0, 2.0)),
            Geometry::LineString(vec![Coord::new(0.0, 0.0)]),
        ]);
        let value = encode(&geom).unwrap();
        let children = value["geometries"].as_array().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["type"], "Point");
    }

    #[test]
    fn test_collection_of_only_invalid_children_is_dropped() {
        let geom = Geometry::GeometryCollection(vec![
            Geometry::LineString(vec![]),
            Geometry::Polygon(vec![]),
        ]);
        assert_eq!(encode(&geom), None);
    }

    #[test]
    fn test_empty_containers_are_dropped() {
        assert_eq!(encode(&Geometry::MultiPoint(vec![])), None);
        assert_eq!(encode(&Geometry::MultiLineString(vec![])), None);
        assert_eq!(encode(&Geometry::MultiPolygon(vec![])), None);
        assert_eq!(encode(&Geometry::GeometryCollection(vec![])), None);
    }
}
