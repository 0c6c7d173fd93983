//! Construction of regular shapes from a center point and a radius.
//!
//! All functions return polygons with closed rings.

use std::f64::consts::PI;

use crate::cartesian::Point2d;
use crate::geometry::{Circle, Polygon};

/// Number of vertices used to approximate circles for general purposes (buffering, export).
pub const CIRCLE_VERTICES: usize = 128;

/// Number of vertices used to approximate circles for on-screen rendering.
pub const SCREEN_CIRCLE_VERTICES: usize = 64;

/// Regular polygon with `sides` vertices inscribed into the circle of `radius` around `center`.
/// The first vertex lies at `angle` radians from the x-axis.
pub fn regular_polygon(center: Point2d, radius: f64, sides: usize, angle: f64) -> Polygon {
    let sides = sides.max(3);
    let ring = (0..sides)
        .map(|i| {
            let a = angle + 2.0 * PI * i as f64 / sides as f64;
            Point2d::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect();

    Polygon::new(ring, vec![])
}

/// Approximates the circle with a regular polygon of `vertices` vertices.
pub fn circle_polygon(circle: &Circle, vertices: usize) -> Polygon {
    regular_polygon(circle.center, circle.radius, vertices, 0.0)
}

/// Star with `points` rays. Outer vertices lie on the circle of `radius`, inner vertices on the
/// circle of `radius * inner_ratio`. The first ray points at `angle` radians.
pub fn star(center: Point2d, radius: f64, points: usize, inner_ratio: f64, angle: f64) -> Polygon {
    let points = points.max(2);
    let vertex_count = points * 2;
    let ring = (0..vertex_count)
        .map(|i| {
            let r = if i % 2 == 0 {
                radius
            } else {
                radius * inner_ratio
            };
            let a = angle + PI * i as f64 / points as f64;
            Point2d::new(center.x + r * a.cos(), center.y + r * a.sin())
        })
        .collect();

    Polygon::new(ring, vec![])
}

/// Ellipse with semi-axes `dx` and `dy`: a circle approximation of `vertices` vertices scaled
/// non-uniformly along the axes.
pub fn ellipse(center: Point2d, dx: f64, dy: f64, vertices: usize) -> Polygon {
    let unit = regular_polygon(Point2d::origin(), 1.0, vertices, 0.0);
    let ring = unit
        .exterior()
        .iter()
        .map(|p| Point2d::new(center.x + p.x * dx, center.y + p.y * dy))
        .collect();

    Polygon::new(ring, vec![])
}

/// Axis-aligned box with the two given opposite corners.
pub fn rectangle(a: Point2d, b: Point2d) -> Polygon {
    Polygon::new(
        vec![
            Point2d::new(a.x, a.y),
            Point2d::new(b.x, a.y),
            Point2d::new(b.x, b.y),
            Point2d::new(a.x, b.y),
        ],
        vec![],
    )
}
