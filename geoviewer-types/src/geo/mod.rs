//! Named coordinate systems ([`Crs`]) and conversion of geometries between them
//! ([`Projection`], [`reproject`]).

mod crs;
#[cfg(feature = "geodesy")]
mod geodesy;
mod projection;
mod web_mercator;

pub use crs::{Crs, ProjectionType};
#[cfg(feature = "geodesy")]
pub use geodesy::GeodesyProjection;
pub use projection::{reproject, IdentityProjection, Projection};
pub use web_mercator::{WebMercator, EARTH_RADIUS};
