use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::cartesian::Point2d;
use crate::geo::projection::Projection;

/// Radius of the sphere used by Web Mercator, equal to the WGS84 semi-major axis.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Spherical Web Mercator projection (EPSG:3857).
#[derive(Debug, Copy, Clone, Default)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn project(&self, lonlat: &Point2d) -> Option<Point2d> {
        if !lonlat.x.is_finite() || !lonlat.y.is_finite() || lonlat.y.abs() >= 90.0 {
            return None;
        }

        let x = EARTH_RADIUS * lonlat.x.to_radians();
        let y = EARTH_RADIUS * (FRAC_PI_4 + lonlat.y.to_radians() / 2.0).tan().ln();
        Some(Point2d::new(x, y))
    }

    fn unproject(&self, point: &Point2d) -> Option<Point2d> {
        let lat = 2.0 * (point.y / EARTH_RADIUS).exp().atan() - FRAC_PI_2;
        let lon = point.x / EARTH_RADIUS;

        Some(Point2d::new(lon.to_degrees(), lat.to_degrees()))
    }
}
