use serde::{Deserialize, Serialize};

use crate::cartesian::Point2d;
use crate::geometry::Polygon;

/// Axis-aligned rectangle.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl Rect {
    /// Creates a new rectangle. The coordinates are normalized so that `min <= max`.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x_min: x1.min(x2),
            y_min: y1.min(y2),
            x_max: x1.max(x2),
            y_max: y1.max(y2),
        }
    }

    /// Minimum x coordinate.
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Maximum x coordinate.
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Minimum y coordinate.
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    /// Maximum y coordinate.
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> Point2d {
        Point2d::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Returns a rectangle grown by `amount` in every direction.
    pub fn buffer(&self, amount: f64) -> Self {
        Self {
            x_min: self.x_min - amount,
            y_min: self.y_min - amount,
            x_max: self.x_max + amount,
            y_max: self.y_max + amount,
        }
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Degenerate rectangle containing a single point.
    pub fn from_point(p: &Point2d) -> Self {
        Self {
            x_min: p.x,
            y_min: p.y,
            x_max: p.x,
            y_max: p.y,
        }
    }

    /// Bounding rectangle of the points, or `None` if the iterator is empty.
    pub fn from_points<'a>(mut points: impl Iterator<Item = &'a Point2d>) -> Option<Self> {
        let first = points.next()?;
        Some(points.fold(Self::from_point(first), |rect, p| {
            rect.merge(Self::from_point(p))
        }))
    }

    /// Returns `true` if the point lies inside the rectangle or on its border.
    pub fn contains(&self, point: &Point2d) -> bool {
        point.x >= self.x_min
            && point.x <= self.x_max
            && point.y >= self.y_min
            && point.y <= self.y_max
    }

    /// Converts the rectangle into a polygon with a closed counter-clockwise ring.
    pub fn into_polygon(self) -> Polygon {
        Polygon::new(
            vec![
                Point2d::new(self.x_min, self.y_min),
                Point2d::new(self.x_max, self.y_min),
                Point2d::new(self.x_max, self.y_max),
                Point2d::new(self.x_min, self.y_max),
            ],
            vec![],
        )
    }
}
