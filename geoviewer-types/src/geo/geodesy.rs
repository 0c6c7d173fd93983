use geodesy::prelude::*;

use crate::cartesian::Point2d;
use crate::error::GeoTypesError;
use crate::geo::projection::Projection;

/// Projection given by a `geodesy` operator definition, e.g.
/// `"laea lon_0=10 lat_0=52 x_0=4321000 y_0=3210000"`.
pub struct GeodesyProjection {
    context: Minimal,
    op: OpHandle,
}

impl std::fmt::Debug for GeodesyProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeodesyProjection").finish_non_exhaustive()
    }
}

impl GeodesyProjection {
    /// Parses the definition.
    pub fn new(definition: &str) -> Result<Self, GeoTypesError> {
        let mut context = Minimal::new();
        let op = context
            .op(definition)
            .map_err(|err| GeoTypesError::Projection(format!("{definition}: {err}")))?;
        Ok(Self { context, op })
    }
}

impl Projection for GeodesyProjection {
    fn project(&self, lonlat: &Point2d) -> Option<Point2d> {
        let mut data = [Coor2D::geo(lonlat.y, lonlat.x)];
        self.context.apply(self.op, Fwd, &mut data).ok()?;

        if !data[0].0[0].is_finite() || !data[0].0[1].is_finite() {
            return None;
        }

        Some(Point2d::new(data[0].0[0], data[0].0[1]))
    }

    fn unproject(&self, point: &Point2d) -> Option<Point2d> {
        let mut data = [Coor2D([point.x, point.y])];
        self.context.apply(self.op, Inv, &mut data).ok()?;

        Some(Point2d::new(
            data[0].0[0].to_degrees(),
            data[0].0[1].to_degrees(),
        ))
    }
}
