use geoviewer_types::{Geom, Point2d};

use crate::Color;

/// One atomic drawing instruction produced by the [`StyleEngine`](super::StyleEngine).
///
/// Primitives are ordered: later primitives are drawn on top of the earlier ones with the same
/// `z_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPrimitive {
    /// What the primitive is drawn at.
    pub geometry: PrimitiveGeometry,
    /// What is drawn.
    pub kind: PrimitiveKind,
    /// Rendering order relative to other features.
    pub z_index: i32,
}

/// Geometry a [`DrawPrimitive`] is drawn at.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveGeometry {
    /// Geometry of the styled feature itself.
    Feature,
    /// Bounding rectangle of the styled feature, buffered by the given amount of map units. Used
    /// when the feature is not known at resolution time.
    FeatureExtent {
        /// Buffer size in map units.
        buffer: f64,
    },
    /// Explicit geometry in map coordinates.
    Geometry(Geom),
}

/// Kind of a [`DrawPrimitive`].
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveKind {
    /// Fill and outline of the geometry.
    Shape {
        /// Fill of polygonal geometries.
        fill: Option<Fill>,
        /// Line or outline.
        stroke: Option<Stroke>,
    },
    /// Marker drawn at points.
    Marker(Marker),
    /// Arrow head on a line.
    Arrow {
        /// Arrow marker.
        marker: Marker,
        /// Position of the arrow.
        position: Point2d,
        /// Counterclockwise angle from the x-axis in radians.
        rotation: f64,
    },
    /// Text label.
    Label(Label),
    /// Outline marking the feature as selected.
    SelectionOutline(Stroke),
}

/// Polygon fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    /// Fill color.
    pub color: Color,
    /// Diagonal stripes instead of a solid fill.
    pub striped: bool,
}

/// Line style.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Line color.
    pub color: Color,
    /// Line width in pixels.
    pub width: f64,
    /// Dash pattern in pixels, `None` for solid lines.
    pub dash: Option<Vec<f64>>,
}

impl Stroke {
    /// Solid line.
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }
}

/// Point marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    /// Shape drawn by the renderer from its parameters.
    RegularShape(RegularShape),
    /// Pre-rendered vector image.
    Icon(Icon),
}

/// Outline of a [`RegularShape`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ShapeOutline {
    /// Circle.
    Circle,
    /// Regular polygon. The first vertex is at `angle` radians from the x-axis.
    Polygon {
        /// Number of vertices.
        points: u32,
        /// Angle of the first vertex.
        angle: f64,
    },
    /// Star with inner vertices at `inner_ratio` of the radius.
    Star {
        /// Number of rays.
        points: u32,
        /// Ratio of the inner radius to the outer one.
        inner_ratio: f64,
    },
}

/// Parametric marker shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularShape {
    /// Outline of the shape.
    pub outline: ShapeOutline,
    /// Radius in pixels.
    pub radius: f64,
    /// Clockwise rotation in radians.
    pub rotation: f64,
    /// Fill of the shape.
    pub fill: Option<Fill>,
    /// Outline of the shape.
    pub stroke: Option<Stroke>,
}

/// Vector image marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    /// `data:` url of the SVG image.
    pub src: String,
    /// Size of the image in pixels.
    pub size: f64,
    /// Clockwise rotation in radians.
    pub rotation: f64,
}

/// Text label.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// Text to draw.
    pub text: String,
    /// CSS font definition.
    pub font: String,
    /// Scale applied to the font.
    pub scale: f64,
    /// Text color.
    pub color: Color,
    /// Halo around the text.
    pub halo: Option<Stroke>,
    /// Vertical offset of the text in pixels. Negative values move the label up.
    pub offset_y: f64,
}
