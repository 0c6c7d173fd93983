use serde::{Deserialize, Serialize};

use crate::cartesian::{Point2d, Rect};
use crate::shapes;

/// Geometry of a feature.
///
/// Besides the simple feature types the enum has a [`Geom::Circle`] variant that keeps a circle as
/// its center and radius. Consumers that need an actual outline (filling, export to the standard
/// WKT) call [`Geom::linearize`] to approximate it with a regular polygon.
#[derive(Debug, Clone, PartialEq)]
pub enum Geom {
    /// Single point.
    Point(Point2d),
    /// Set of points.
    MultiPoint(Vec<Point2d>),
    /// Open line.
    LineString(Vec<Point2d>),
    /// Set of open lines.
    MultiLineString(Vec<Vec<Point2d>>),
    /// Polygon with optional holes.
    Polygon(Polygon),
    /// Set of polygons.
    MultiPolygon(Vec<Polygon>),
    /// Circle given by its center and radius.
    Circle(Circle),
}

/// Type of a [`Geom`] without its coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeometryType {
    /// [`Geom::Point`]
    Point,
    /// [`Geom::MultiPoint`]
    MultiPoint,
    /// [`Geom::LineString`]
    LineString,
    /// [`Geom::MultiLineString`]
    MultiLineString,
    /// [`Geom::Polygon`]
    Polygon,
    /// [`Geom::MultiPolygon`]
    MultiPolygon,
    /// [`Geom::Circle`]
    Circle,
}

/// Polygon with one exterior ring and any number of holes.
///
/// Rings are always closed: the first vertex is repeated as the last one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    exterior: Vec<Point2d>,
    interiors: Vec<Vec<Point2d>>,
}

/// Circle given by its center and radius.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Circle {
    /// Center of the circle.
    pub center: Point2d,
    /// Radius in the units of the coordinate system.
    pub radius: f64,
}

impl Polygon {
    /// Creates a new polygon, closing the rings if they are not closed yet.
    pub fn new(exterior: Vec<Point2d>, interiors: Vec<Vec<Point2d>>) -> Self {
        Self {
            exterior: close_ring(exterior),
            interiors: interiors.into_iter().map(close_ring).collect(),
        }
    }

    /// Exterior ring.
    pub fn exterior(&self) -> &[Point2d] {
        &self.exterior
    }

    /// Interior rings (holes).
    pub fn interiors(&self) -> &[Vec<Point2d>] {
        &self.interiors
    }

    /// Iterates over all rings, starting with the exterior one.
    pub fn rings(&self) -> impl Iterator<Item = &[Point2d]> {
        std::iter::once(self.exterior.as_slice()).chain(self.interiors.iter().map(Vec::as_slice))
    }

    fn map_points(&self, f: &mut impl FnMut(&Point2d) -> Option<Point2d>) -> Option<Self> {
        Some(Self {
            exterior: map_all(&self.exterior, f)?,
            interiors: self
                .interiors
                .iter()
                .map(|ring| map_all(ring, f))
                .collect::<Option<_>>()?,
        })
    }
}

impl Circle {
    /// Creates a new circle.
    pub fn new(center: Point2d, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Geom {
    /// Type of the geometry.
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geom::Point(_) => GeometryType::Point,
            Geom::MultiPoint(_) => GeometryType::MultiPoint,
            Geom::LineString(_) => GeometryType::LineString,
            Geom::MultiLineString(_) => GeometryType::MultiLineString,
            Geom::Polygon(_) => GeometryType::Polygon,
            Geom::MultiPolygon(_) => GeometryType::MultiPolygon,
            Geom::Circle(_) => GeometryType::Circle,
        }
    }

    /// Returns `true` for points and multipoints.
    pub fn is_point_like(&self) -> bool {
        matches!(self, Geom::Point(_) | Geom::MultiPoint(_))
    }

    /// Bounding rectangle of the geometry, `None` for empty geometries.
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Geom::Point(p) => Some(Rect::from_point(p)),
            Geom::MultiPoint(points) | Geom::LineString(points) => Rect::from_points(points.iter()),
            Geom::MultiLineString(lines) => Rect::from_points(lines.iter().flatten()),
            Geom::Polygon(polygon) => Rect::from_points(polygon.exterior.iter()),
            Geom::MultiPolygon(polygons) => {
                Rect::from_points(polygons.iter().flat_map(|p| p.exterior.iter()))
            }
            Geom::Circle(circle) => {
                Some(Rect::from_point(&circle.center).buffer(circle.radius.abs()))
            }
        }
    }

    /// A point to anchor markers and labels of non-point geometries to: the point itself for
    /// points, or the center of the bounding rectangle otherwise.
    pub fn anchor_point(&self) -> Option<Point2d> {
        match self {
            Geom::Point(p) => Some(*p),
            Geom::Circle(circle) => Some(circle.center),
            _ => self.bounding_rect().map(|rect| rect.center()),
        }
    }

    /// Line parts of the geometry: the line itself for line strings and every line of multi line
    /// strings. Other geometries have no line parts.
    pub fn lines(&self) -> Vec<&[Point2d]> {
        match self {
            Geom::LineString(points) => vec![points.as_slice()],
            Geom::MultiLineString(lines) => lines.iter().map(Vec::as_slice).collect(),
            _ => vec![],
        }
    }

    /// Replaces a circle with a regular polygon of `vertices` vertices. Other geometries are
    /// returned unchanged.
    pub fn linearize(&self, vertices: usize) -> Geom {
        match self {
            Geom::Circle(circle) => Geom::Polygon(shapes::circle_polygon(circle, vertices)),
            other => other.clone(),
        }
    }

    /// Applies `f` to every vertex of the geometry. Returns `None` if `f` fails for any of them.
    ///
    /// A circle keeps its radius; use [`crate::geo::reproject`] to transform circles between
    /// coordinate systems.
    pub fn map_points(&self, mut f: impl FnMut(&Point2d) -> Option<Point2d>) -> Option<Geom> {
        let geom = match self {
            Geom::Point(p) => Geom::Point(f(p)?),
            Geom::MultiPoint(points) => Geom::MultiPoint(map_all(points, &mut f)?),
            Geom::LineString(points) => Geom::LineString(map_all(points, &mut f)?),
            Geom::MultiLineString(lines) => Geom::MultiLineString(
                lines
                    .iter()
                    .map(|line| map_all(line, &mut f))
                    .collect::<Option<_>>()?,
            ),
            Geom::Polygon(polygon) => Geom::Polygon(polygon.map_points(&mut f)?),
            Geom::MultiPolygon(polygons) => Geom::MultiPolygon(
                polygons
                    .iter()
                    .map(|p| p.map_points(&mut f))
                    .collect::<Option<_>>()?,
            ),
            Geom::Circle(circle) => Geom::Circle(Circle::new(f(&circle.center)?, circle.radius)),
        };

        Some(geom)
    }
}

impl From<Point2d> for Geom {
    fn from(value: Point2d) -> Self {
        Self::Point(value)
    }
}

impl From<Polygon> for Geom {
    fn from(value: Polygon) -> Self {
        Self::Polygon(value)
    }
}

impl From<Circle> for Geom {
    fn from(value: Circle) -> Self {
        Self::Circle(value)
    }
}

fn map_all(
    points: &[Point2d],
    f: &mut impl FnMut(&Point2d) -> Option<Point2d>,
) -> Option<Vec<Point2d>> {
    points.iter().map(f).collect()
}

fn close_ring(mut ring: Vec<Point2d>) -> Vec<Point2d> {
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            let first = *first;
            ring.push(first);
        }
    }

    ring
}
