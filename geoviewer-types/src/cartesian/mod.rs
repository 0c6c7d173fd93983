//! Types and functions on geometries in cartesian coordinates.

mod rect;

pub use rect::Rect;

/// 2d point with `f64` coordinates. Projected coordinates are stored as `x` (easting) and `y`
/// (northing); geographic coordinates as `x` = longitude and `y` = latitude.
pub type Point2d = nalgebra::Point2<f64>;

/// 2d vector with `f64` coordinates.
pub type Vector2d = nalgebra::Vector2<f64>;
