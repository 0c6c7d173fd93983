//! Geodesic length and area of geometries, formatted for display.

use geo::{GeodesicArea, GeodesicLength};
use geo_types::{Coord, LineString, Polygon as GeoPolygon};

use crate::geo::{reproject, Crs};
use crate::geometry::{Geom, Polygon};
use crate::shapes::CIRCLE_VERTICES;
use crate::Point2d;

/// Lengths up to this value (in meters) are displayed in meters.
const METERS_THRESHOLD: f64 = 100.0;
/// Areas up to this value (in square meters) are displayed in square meters.
const SQUARE_METERS_THRESHOLD: f64 = 10_000.0;

/// Geodesic length of the line parts of the geometry in meters. Polygon boundaries are not
/// counted. Returns `None` if the geometry cannot be converted to geographic coordinates.
pub fn geodesic_length(geom: &Geom, crs: &Crs) -> Option<f64> {
    let geographic = reproject(geom, crs, &Crs::EPSG4326)?;
    Some(
        geographic
            .lines()
            .into_iter()
            .map(|line| to_line_string(line).geodesic_length())
            .sum(),
    )
}

/// Geodesic area of the polygonal parts of the geometry in square meters. Circles are
/// approximated with a regular polygon.
pub fn geodesic_area(geom: &Geom, crs: &Crs) -> Option<f64> {
    let geographic = reproject(&geom.linearize(CIRCLE_VERTICES), crs, &Crs::EPSG4326)?;
    let area = match &geographic {
        Geom::Polygon(polygon) => to_polygon(polygon).geodesic_area_unsigned(),
        Geom::MultiPolygon(polygons) => polygons
            .iter()
            .map(|p| to_polygon(p).geodesic_area_unsigned())
            .sum(),
        _ => 0.0,
    };

    Some(area)
}

/// Formats the length given in meters: `"<n> m"` up to 100 m, `"<n> km"` above.
pub fn format_length(meters: f64) -> String {
    if meters > METERS_THRESHOLD {
        format!("{} km", round2(meters / 1000.0))
    } else {
        format!("{} m", round2(meters))
    }
}

/// Formats the area given in square meters: `"<n> m²"` up to 10000 m², `"<n> km²"` above.
pub fn format_area(square_meters: f64) -> String {
    if square_meters > SQUARE_METERS_THRESHOLD {
        format!("{} km²", round2(square_meters / 1_000_000.0))
    } else {
        format!("{} m²", round2(square_meters))
    }
}

/// Formatted size of the geometry: length for lines, area for polygons and circles. Points have no
/// size.
pub fn format_size(geom: &Geom, crs: &Crs) -> Option<String> {
    match geom {
        Geom::LineString(_) | Geom::MultiLineString(_) => {
            geodesic_length(geom, crs).map(format_length)
        }
        Geom::Polygon(_) | Geom::MultiPolygon(_) | Geom::Circle(_) => {
            geodesic_area(geom, crs).map(format_area)
        }
        Geom::Point(_) | Geom::MultiPoint(_) => None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn to_line_string(points: &[Point2d]) -> LineString<f64> {
    LineString::new(points.iter().map(|p| Coord { x: p.x, y: p.y }).collect())
}

fn to_polygon(polygon: &Polygon) -> GeoPolygon<f64> {
    GeoPolygon::new(
        to_line_string(polygon.exterior()),
        polygon
            .interiors()
            .iter()
            .map(|ring| to_line_string(ring))
            .collect(),
    )
}
