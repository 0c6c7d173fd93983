use crate::cartesian::Point2d;
use crate::geo::Crs;
use crate::geometry::{Circle, Geom};

/// Conversion between geographic coordinates and the coordinates of a coordinate system.
///
/// Geographic points are given as `x` = longitude, `y` = latitude in degrees.
pub trait Projection {
    /// Projects a geographic point.
    fn project(&self, lonlat: &Point2d) -> Option<Point2d>;
    /// Converts a projected point back to geographic coordinates.
    fn unproject(&self, point: &Point2d) -> Option<Point2d>;
}

/// Projection that leaves the coordinates as they are. Used for geographic coordinate systems.
#[derive(Debug, Default, Copy, Clone)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    fn project(&self, lonlat: &Point2d) -> Option<Point2d> {
        Some(*lonlat)
    }

    fn unproject(&self, point: &Point2d) -> Option<Point2d> {
        Some(*point)
    }
}

/// Converts the geometry from `from` coordinate system into `to`.
///
/// Circles keep being circles: the center is reprojected and the radius is scaled by the
/// distortion at the center. Returns `None` if any of the coordinate systems has no projection or
/// any vertex cannot be converted.
pub fn reproject(geom: &Geom, from: &Crs, to: &Crs) -> Option<Geom> {
    if from == to {
        return Some(geom.clone());
    }

    let from_projection = from.get_projection()?;
    let to_projection = to.get_projection()?;
    let convert = |p: &Point2d| to_projection.project(&from_projection.unproject(p)?);

    match geom {
        Geom::Circle(circle) => {
            let center = convert(&circle.center)?;
            let edge = convert(&Point2d::new(
                circle.center.x + circle.radius,
                circle.center.y,
            ))?;
            Some(Geom::Circle(Circle::new(center, (edge - center).norm())))
        }
        other => other.map_points(convert),
    }
}
