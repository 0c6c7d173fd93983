//! Geometry types and algorithms used by the `geoviewer` map engine.
//!
//! The crate contains:
//! * an in-memory geometry model ([`Geom`]) that, besides the usual simple features, stores
//!   circles as a center and a radius;
//! * a WKT-like text codec ([`wkt::WktCodec`]) with the non-standard `CIRCLE(cx cy r)` token;
//! * named coordinate systems and projections between them ([`geo::Crs`]);
//! * construction of regular shapes ([`shapes`]) and geodesic measurements for display
//!   ([`measure`]).

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod cartesian;
pub mod error;
pub mod geo;
mod geometry;
pub mod measure;
pub mod shapes;
pub mod wkt;

pub use cartesian::{Point2d, Rect};
pub use geometry::{Circle, Geom, GeometryType, Polygon};
