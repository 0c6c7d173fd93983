//! Resolution of declarative [`StyleDescriptor`]s into ordered [`DrawPrimitive`]s.

mod descriptor;
mod engine;
mod icons;
mod primitive;

pub use descriptor::{ArrowType, PointType, StrokeType, StyleDescriptor};
pub use engine::StyleEngine;
pub use primitive::{
    DrawPrimitive, Fill, Icon, Label, Marker, PrimitiveGeometry, PrimitiveKind, RegularShape,
    ShapeOutline, Stroke,
};
