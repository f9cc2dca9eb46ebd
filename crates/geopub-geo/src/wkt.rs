//! Well-known-text geometry parser.
//!
//! Recursive-descent parser over the seven supported geometry kinds. Keyword
//! matching is case-insensitive and whitespace is free-form, matching what
//! the publishing toolchain emits. `EMPTY` bodies parse to empty containers,
//! which downstream encoders then drop; `POINT EMPTY` has no representation
//! in the model and is rejected.
//!
//! Callers are expected to treat a missing or blank geometry field as "no
//! geometry" and skip the item before calling [`parse_wkt`].

use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::{all_consuming, map, value, verify};
use nom::multi::separated_list1;
use nom::number::complete::double;
use nom::sequence::{delimited, preceded, tuple};
use nom::{Finish, IResult};
use thiserror::Error;

use crate::geometry::{Coord, Geometry, Ring};

/// Raised for syntactically invalid WKT. The offending item is skipped and
/// logged by the caller; a parse failure never aborts a batch.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid WKT at offset {offset}: {fragment:?}")]
pub struct WktParseError {
    /// Byte offset of the first unparseable input.
    pub offset: usize,
    /// Input excerpt starting at the offset.
    pub fragment: String,
}

/// Parses a WKT string into a geometry tree.
pub fn parse_wkt(input: &str) -> Result<Geometry, WktParseError> {
    match all_consuming(ws(geometry))(input).finish() {
        Ok((_, geometry)) => Ok(geometry),
        Err(e) => {
            let offset = input.len().saturating_sub(e.input.len());
            let fragment: String = e.input.chars().take(32).collect();
            Err(WktParseError { offset, fragment })
        }
    }
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn geometry(input: &str) -> IResult<&str, Geometry> {
    alt((
        point,
        multi_point,
        line_string,
        multi_line_string,
        polygon,
        multi_polygon,
        geometry_collection,
    ))(input)
}

/// One "x y" pair. Non-finite literals (`inf`, `nan`) are rejected.
fn coord(input: &str) -> IResult<&str, Coord> {
    map(
        verify(tuple((double, multispace1, double)), |(x, _, y)| {
            x.is_finite() && y.is_finite()
        }),
        |(x, _, y)| Coord::new(x, y),
    )(input)
}

fn comma(input: &str) -> IResult<&str, char> {
    ws(char(','))(input)
}

fn parens<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(ws(char('(')), inner, ws(char(')')))
}

fn empty_body<'a, T: Clone>(empty: T) -> impl FnMut(&'a str) -> IResult<&'a str, T> {
    value(empty, tag_no_case("EMPTY"))
}

/// `(x y, x y, ...)` - the body of a line or ring.
fn coord_seq(input: &str) -> IResult<&str, Ring> {
    parens(separated_list1(comma, ws(coord)))(input)
}

/// `((...), (...))` - the body of a polygon or multi-linestring.
fn ring_seq(input: &str) -> IResult<&str, Vec<Ring>> {
    parens(separated_list1(comma, ws(coord_seq)))(input)
}

fn point(input: &str) -> IResult<&str, Geometry> {
    map(
        preceded(tag_no_case("POINT"), ws(parens(ws(coord)))),
        Geometry::Point,
    )(input)
}

fn multi_point(input: &str) -> IResult<&str, Geometry> {
    // Both MULTIPOINT(1 2, 3 4) and MULTIPOINT((1 2), (3 4)) occur in the
    // wild; accept either element form.
    let element = alt((parens(ws(coord)), coord));
    map(
        preceded(
            tag_no_case("MULTIPOINT"),
            ws(alt((
                parens(separated_list1(comma, ws(element))),
                empty_body(Vec::new()),
            ))),
        ),
        Geometry::MultiPoint,
    )(input)
}

fn line_string(input: &str) -> IResult<&str, Geometry> {
    map(
        preceded(
            tag_no_case("LINESTRING"),
            ws(alt((coord_seq, empty_body(Vec::new())))),
        ),
        Geometry::LineString,
    )(input)
}

fn multi_line_string(input: &str) -> IResult<&str, Geometry> {
    map(
        preceded(
            tag_no_case("MULTILINESTRING"),
            ws(alt((ring_seq, empty_body(Vec::new())))),
        ),
        Geometry::MultiLineString,
    )(input)
}

fn polygon(input: &str) -> IResult<&str, Geometry> {
    map(
        preceded(
            tag_no_case("POLYGON"),
            ws(alt((ring_seq, empty_body(Vec::new())))),
        ),
        Geometry::Polygon,
    )(input)
}

fn multi_polygon(input: &str) -> IResult<&str, Geometry> {
    map(
        preceded(
            tag_no_case("MULTIPOLYGON"),
            ws(alt((
                parens(separated_list1(comma, ws(ring_seq))),
                empty_body(Vec::new()),
            ))),
        ),
        Geometry::MultiPolygon,
    )(input)
}

fn geometry_collection(input: &str) -> IResult<&str, Geometry> {
    map(
        preceded(
            tag_no_case("GEOMETRYCOLLECTION"),
            ws(alt((
                parens(separated_list1(comma, ws(geometry))),
                empty_body(Vec::new()),
            ))),
        ),
        Geometry::GeometryCollection,
    )(input)
}
