//! WKT-like text encoding of [`Geom`].
//!
//! The standard `POINT`, `MULTIPOINT`, `LINESTRING`, `MULTILINESTRING`, `POLYGON` and
//! `MULTIPOLYGON` tokens are read and written by [`geozero`] through [`geo_types`]. On top of them
//! the codec understands one extension: `CIRCLE(cx cy r)`, a circle given by its center and
//! radius. Decoding always understands the extension; encoding writes it only when
//! [`CircleEncoding::Compact`] is selected, and approximates the circle with a polygon otherwise.
//!
//! ```
//! use geoviewer_types::wkt::{CircleEncoding, WktCodec};
//! use geoviewer_types::{Circle, Geom, Point2d};
//!
//! let codec = WktCodec::default().with_circle_encoding(CircleEncoding::Compact);
//! let circle = Geom::Circle(Circle::new(Point2d::new(1.0, 2.0), 3.0));
//! assert_eq!(codec.encode(&circle)?, "CIRCLE(1 2 3)");
//! assert_eq!(codec.decode("CIRCLE(1 2 3)")?, circle);
//! # Ok::<(), geoviewer_types::error::GeoTypesError>(())
//! ```
//!
//! `EMPTY` geometries decode to the empty value of the same type. `POINT EMPTY` has no such value
//! and decodes to an empty multipoint.

use geo_types::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon as GeoPolygon,
};
use geozero::wkt::Wkt;
use geozero::{ToGeo, ToWkt};

use crate::cartesian::Point2d;
use crate::error::GeoTypesError;
use crate::geometry::{Circle, Geom, Polygon};
use crate::shapes::CIRCLE_VERTICES;

const CIRCLE_TAG: &str = "CIRCLE";
const EMPTY_TAG: &str = "EMPTY";

/// How circles are written by [`WktCodec::encode`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CircleEncoding {
    /// `CIRCLE(cx cy r)` token.
    Compact,
    /// Regular polygon with the given number of vertices.
    Polygon(usize),
}

impl Default for CircleEncoding {
    fn default() -> Self {
        Self::Polygon(CIRCLE_VERTICES)
    }
}

/// Encoder and decoder of WKT-like geometry text.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct WktCodec {
    precision: Option<u32>,
    circle: CircleEncoding,
}

impl WktCodec {
    /// Rounds written coordinates to the given number of decimals. Without precision the shortest
    /// representation that reads back to the same value is written.
    pub fn with_precision(mut self, decimals: u32) -> Self {
        self.precision = Some(decimals);
        self
    }

    /// Sets the way circles are written.
    pub fn with_circle_encoding(mut self, circle: CircleEncoding) -> Self {
        self.circle = circle;
        self
    }

    /// Current circle encoding.
    pub fn circle_encoding(&self) -> CircleEncoding {
        self.circle
    }

    /// Writes the geometry as text.
    ///
    /// Fails if any coordinate is not finite, since such text could not be read back.
    pub fn encode(&self, geom: &Geom) -> Result<String, GeoTypesError> {
        let geometry = match (geom, self.circle) {
            (Geom::Circle(circle), CircleEncoding::Compact) => return self.encode_circle(circle),
            (Geom::Circle(_), CircleEncoding::Polygon(vertices)) => {
                return self.encode(&geom.linearize(vertices))
            }
            _ if is_empty(geom) => return Ok(format!("{} {EMPTY_TAG}", tag(geom))),
            _ => self.to_geometry(geom)?,
        };

        geometry
            .to_wkt()
            .map_err(|err| GeoTypesError::Conversion(err.to_string()))
    }

    /// Parses geometry text.
    pub fn decode(&self, text: &str) -> Result<Geom, GeoTypesError> {
        let trimmed = text.trim_start();
        let start = text.len() - trimmed.len();
        let tag_len = trimmed
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(trimmed.len());
        let tag = trimmed[..tag_len].to_ascii_uppercase();
        let rest = &trimmed[tag_len..];
        let body = rest.trim();
        let body_start = start + tag_len + (rest.len() - rest.trim_start().len());

        if tag.is_empty() {
            return Err(wkt_error(start, "expected a geometry type"));
        }

        if body.eq_ignore_ascii_case(EMPTY_TAG) {
            return empty_geom(&tag)
                .ok_or_else(|| wkt_error(start, &format!("unsupported geometry type {tag}")));
        }

        match tag.as_str() {
            CIRCLE_TAG => {
                check_enclosed(body, body_start)?;
                decode_circle(body, body_start)
            }
            "POINT" | "MULTIPOINT" | "LINESTRING" | "MULTILINESTRING" | "POLYGON"
            | "MULTIPOLYGON" => {
                check_enclosed(body, body_start)?;
                let normalized = format!("{tag}{body}");
                let geometry = Wkt(normalized.as_str())
                    .to_geo()
                    .map_err(|err| wkt_error(start, &err.to_string()))?;
                from_geometry(geometry)
            }
            _ => Err(wkt_error(start, &format!("unsupported geometry type {tag}"))),
        }
    }

    fn encode_circle(&self, circle: &Circle) -> Result<String, GeoTypesError> {
        Ok(format!(
            "{CIRCLE_TAG}({} {} {})",
            self.number(circle.center.x)?,
            self.number(circle.center.y)?,
            self.number(circle.radius)?
        ))
    }

    fn number(&self, value: f64) -> Result<f64, GeoTypesError> {
        if !value.is_finite() {
            return Err(GeoTypesError::Conversion(format!(
                "cannot write non-finite coordinate {value}"
            )));
        }

        let value = match self.precision {
            Some(decimals) => {
                let factor = 10f64.powi(decimals as i32);
                (value * factor).round() / factor
            }
            None => value,
        };

        // normalize negative zero
        Ok(if value == 0.0 { 0.0 } else { value })
    }

    fn coord(&self, p: &Point2d) -> Result<Coord<f64>, GeoTypesError> {
        Ok(Coord {
            x: self.number(p.x)?,
            y: self.number(p.y)?,
        })
    }

    fn line(&self, points: &[Point2d]) -> Result<LineString<f64>, GeoTypesError> {
        points
            .iter()
            .map(|p| self.coord(p))
            .collect::<Result<Vec<_>, _>>()
            .map(LineString::new)
    }

    fn polygon(&self, polygon: &Polygon) -> Result<GeoPolygon<f64>, GeoTypesError> {
        Ok(GeoPolygon::new(
            self.line(polygon.exterior())?,
            polygon
                .interiors()
                .iter()
                .map(|ring| self.line(ring))
                .collect::<Result<_, _>>()?,
        ))
    }

    fn to_geometry(&self, geom: &Geom) -> Result<Geometry<f64>, GeoTypesError> {
        let geometry = match geom {
            Geom::Point(p) => Point::from(self.coord(p)?).into(),
            Geom::MultiPoint(points) => MultiPoint::new(
                points
                    .iter()
                    .map(|p| self.coord(p).map(Point::from))
                    .collect::<Result<_, _>>()?,
            )
            .into(),
            Geom::LineString(points) => self.line(points)?.into(),
            Geom::MultiLineString(lines) => MultiLineString::new(
                lines
                    .iter()
                    .map(|line| self.line(line))
                    .collect::<Result<_, _>>()?,
            )
            .into(),
            Geom::Polygon(polygon) => self.polygon(polygon)?.into(),
            Geom::MultiPolygon(polygons) => MultiPolygon::new(
                polygons
                    .iter()
                    .map(|p| self.polygon(p))
                    .collect::<Result<_, _>>()?,
            )
            .into(),
            Geom::Circle(circle) => {
                return Err(GeoTypesError::Conversion(format!(
                    "circle {circle:?} has no standard WKT form"
                )))
            }
        };

        Ok(geometry)
    }
}

fn wkt_error(position: usize, message: &str) -> GeoTypesError {
    GeoTypesError::Wkt {
        position,
        message: message.to_string(),
    }
}

fn tag(geom: &Geom) -> &'static str {
    match geom {
        Geom::Point(_) => "POINT",
        Geom::MultiPoint(_) => "MULTIPOINT",
        Geom::LineString(_) => "LINESTRING",
        Geom::MultiLineString(_) => "MULTILINESTRING",
        Geom::Polygon(_) => "POLYGON",
        Geom::MultiPolygon(_) => "MULTIPOLYGON",
        Geom::Circle(_) => CIRCLE_TAG,
    }
}

fn is_empty(geom: &Geom) -> bool {
    match geom {
        Geom::Point(_) | Geom::Circle(_) => false,
        Geom::MultiPoint(points) | Geom::LineString(points) => points.is_empty(),
        Geom::MultiLineString(lines) => lines.is_empty(),
        Geom::Polygon(polygon) => polygon.exterior().is_empty(),
        Geom::MultiPolygon(polygons) => polygons.is_empty(),
    }
}

fn empty_geom(tag: &str) -> Option<Geom> {
    let geom = match tag {
        "POINT" | "MULTIPOINT" => Geom::MultiPoint(vec![]),
        "LINESTRING" => Geom::LineString(vec![]),
        "MULTILINESTRING" => Geom::MultiLineString(vec![]),
        "POLYGON" => Geom::Polygon(Polygon::default()),
        "MULTIPOLYGON" => Geom::MultiPolygon(vec![]),
        _ => return None,
    };

    Some(geom)
}

/// Checks that `body` is a single parenthesized group with nothing after it.
fn check_enclosed(body: &str, offset: usize) -> Result<(), GeoTypesError> {
    if !body.starts_with('(') {
        return Err(wkt_error(offset, "expected '('"));
    }

    let mut depth = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i + 1 < body.len() {
                    return Err(wkt_error(offset + i + 1, "unexpected trailing characters"));
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        return Err(wkt_error(offset + body.len(), "expected ')'"));
    }

    Ok(())
}

fn decode_circle(body: &str, offset: usize) -> Result<Geom, GeoTypesError> {
    let values = body[1..body.len() - 1]
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| wkt_error(offset, &err.to_string()))?;

    match values[..] {
        [cx, cy, radius] => Ok(Geom::Circle(Circle::new(Point2d::new(cx, cy), radius))),
        _ => Err(wkt_error(offset, "circle needs a center and a radius")),
    }
}

fn from_geometry(geometry: Geometry<f64>) -> Result<Geom, GeoTypesError> {
    let geom = match geometry {
        Geometry::Point(p) => Geom::Point(Point2d::new(p.x(), p.y())),
        Geometry::MultiPoint(points) => Geom::MultiPoint(
            points
                .0
                .iter()
                .map(|p| Point2d::new(p.x(), p.y()))
                .collect(),
        ),
        Geometry::LineString(line) => Geom::LineString(points(&line)),
        Geometry::MultiLineString(lines) => {
            Geom::MultiLineString(lines.0.iter().map(points).collect())
        }
        Geometry::Polygon(polygon) => Geom::Polygon(from_polygon(&polygon)),
        Geometry::MultiPolygon(polygons) => {
            Geom::MultiPolygon(polygons.0.iter().map(from_polygon).collect())
        }
        other => {
            return Err(GeoTypesError::Conversion(format!(
                "unsupported geometry {other:?}"
            )))
        }
    };

    Ok(geom)
}

fn points(line: &LineString<f64>) -> Vec<Point2d> {
    line.coords().map(|c| Point2d::new(c.x, c.y)).collect()
}

fn from_polygon(polygon: &GeoPolygon<f64>) -> Polygon {
    Polygon::new(
        points(polygon.exterior()),
        polygon.interiors().iter().map(points).collect(),
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;

    use super::*;

    fn compact() -> WktCodec {
        WktCodec::default().with_circle_encoding(CircleEncoding::Compact)
    }

    #[test]
    fn circle_round_trip_is_exact() {
        let codec = compact();
        let circle = Geom::Circle(Circle::new(Point2d::new(1.0, 2.0), 3.0));
        let text = codec.encode(&circle).unwrap();
        assert_eq!(text, "CIRCLE(1 2 3)");

        let decoded = codec.decode(&text).unwrap();
        assert_eq!(decoded, circle);
        assert_eq!(codec.encode(&decoded).unwrap(), text);
    }

    #[test]
    fn circle_round_trip_keeps_fractional_values() {
        let codec = compact();
        let circle = Geom::Circle(Circle::new(
            Point2d::new(4_187_535.123_456_7, 7_508_434.1),
            0.1 + 0.2,
        ));
        assert_eq!(
            codec.decode(&codec.encode(&circle).unwrap()).unwrap(),
            circle
        );
    }

    #[test]
    fn default_encoding_linearizes_circle() {
        let codec = WktCodec::default();
        let circle = Geom::Circle(Circle::new(Point2d::new(1.0, 2.0), 3.0));
        let text = codec.encode(&circle).unwrap();
        assert!(text.starts_with("POLYGON(("));

        let Geom::Polygon(polygon) = codec.decode(&text).unwrap() else {
            panic!("expected polygon");
        };
        let ring = polygon.exterior();
        assert_eq!(ring.len(), CIRCLE_VERTICES + 1);
        assert_eq!(ring.first(), ring.last());
        for p in ring {
            assert_relative_eq!((p - Point2d::new(1.0, 2.0)).norm(), 3.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn decode_simple_features() {
        let codec = WktCodec::default();
        assert_eq!(
            codec.decode("POINT (10 20)").unwrap(),
            Geom::Point(Point2d::new(10.0, 20.0))
        );
        assert_eq!(
            codec.decode("linestring(0 0, 1 1, 2 0)").unwrap(),
            Geom::LineString(vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(1.0, 1.0),
                Point2d::new(2.0, 0.0)
            ])
        );
        assert_eq!(
            codec.decode("MULTIPOINT((1 2), (3 4))").unwrap(),
            Geom::MultiPoint(vec![Point2d::new(1.0, 2.0), Point2d::new(3.0, 4.0)])
        );

        let Geom::Polygon(polygon) = codec
            .decode("POLYGON((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 4 2, 4 4, 2 2))")
            .unwrap()
        else {
            panic!("expected polygon");
        };
        assert_eq!(polygon.exterior().len(), 5);
        assert_eq!(polygon.interiors().len(), 1);

        assert_matches!(
            codec.decode("MULTIPOLYGON(((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5)))"),
            Ok(Geom::MultiPolygon(polygons)) if polygons.len() == 2
        );
    }

    #[test]
    fn decode_empty_geometries() {
        let codec = WktCodec::default();
        assert_eq!(
            codec.decode("MULTILINESTRING EMPTY").unwrap(),
            Geom::MultiLineString(vec![])
        );
        assert_eq!(
            codec.decode("LineString Empty").unwrap(),
            Geom::LineString(vec![])
        );
        assert_eq!(
            codec.decode("POLYGON EMPTY").unwrap(),
            Geom::Polygon(Polygon::default())
        );
        assert_eq!(
            codec.decode("POINT EMPTY").unwrap(),
            Geom::MultiPoint(vec![])
        );
        assert_matches!(
            codec.decode("CIRCLE EMPTY"),
            Err(GeoTypesError::Wkt { .. })
        );
    }

    #[test]
    fn empty_geometries_round_trip() {
        let codec = WktCodec::default();
        for geom in [
            Geom::LineString(vec![]),
            Geom::MultiPoint(vec![]),
            Geom::MultiPolygon(vec![]),
            Geom::Polygon(Polygon::default()),
        ] {
            let text = codec.encode(&geom).unwrap();
            assert!(text.ends_with(" EMPTY"), "{text}");
            assert_eq!(codec.decode(&text).unwrap(), geom);
        }
    }

    #[test]
    fn encode_simple_features() {
        let codec = WktCodec::default().with_precision(2);
        assert_eq!(
            codec.encode(&Geom::Point(Point2d::new(1.304, -0.001))).unwrap(),
            "POINT(1.3 0)"
        );

        let line = Geom::LineString(vec![Point2d::new(0.123, 1.0), Point2d::new(-2.5, 3.999)]);
        assert_eq!(codec.encode(&line).unwrap(), "LINESTRING(0.12 1,-2.5 4)");

        let polygon = Geom::Polygon(Polygon::new(
            vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(1.0, 0.0),
                Point2d::new(1.0, 1.0),
            ],
            vec![],
        ));
        let text = codec.encode(&polygon).unwrap();
        assert!(text.starts_with("POLYGON(("));
        assert_eq!(codec.decode(&text).unwrap(), polygon);
    }

    #[test]
    fn non_finite_coordinates_are_not_written() {
        let codec = compact();
        assert_matches!(
            codec.encode(&Geom::Point(Point2d::new(f64::NAN, 1.0))),
            Err(GeoTypesError::Conversion(_))
        );
        assert_matches!(
            codec.encode(&Geom::LineString(vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(f64::INFINITY, 1.0)
            ])),
            Err(GeoTypesError::Conversion(_))
        );
        assert_matches!(
            codec.encode(&Geom::Circle(Circle::new(Point2d::new(0.0, 0.0), f64::NAN))),
            Err(GeoTypesError::Conversion(_))
        );
    }

    #[test]
    fn decode_errors() {
        let codec = WktCodec::default();
        assert_matches!(
            codec.decode("TRIANGLE((0 0, 1 0, 1 1, 0 0))"),
            Err(GeoTypesError::Wkt { position: 0, .. })
        );
        assert_matches!(codec.decode("POINT(1)"), Err(GeoTypesError::Wkt { .. }));
        assert_matches!(
            codec.decode("POINT(1 2) trailing"),
            Err(GeoTypesError::Wkt { position: 10, .. })
        );
        assert_matches!(codec.decode("POINT(1 2"), Err(GeoTypesError::Wkt { .. }));
        assert_matches!(codec.decode("CIRCLE(1 2)"), Err(GeoTypesError::Wkt { .. }));
        assert_matches!(codec.decode(""), Err(GeoTypesError::Wkt { .. }));
    }
}
