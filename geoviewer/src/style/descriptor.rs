use serde::{Deserialize, Serialize};

use crate::Color;

/// Declarative description of the way a feature is drawn.
///
/// The descriptor is pure data. [`StyleEngine`](super::StyleEngine) turns it into an ordered list
/// of [`DrawPrimitive`](super::DrawPrimitive)s. Descriptors with the same `style_key` are expected
/// to be equal, the key is used as the cache identity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleDescriptor {
    /// Cache identity of the style.
    pub style_key: String,
    /// Z-index of the base primitives.
    pub z_index: i32,
    /// Color of lines and polygon outlines.
    pub stroke_color: Option<Color>,
    /// Width of lines in pixels.
    pub stroke_width: Option<f64>,
    /// Opacity of lines, `0.0..=1.0`.
    pub stroke_opacity: Option<f32>,
    /// Line pattern.
    pub stroke_type: Option<StrokeType>,
    /// Fill color of polygons and circles.
    pub fill_color: Option<Color>,
    /// Fill opacity, `0.0..=1.0`.
    pub fill_opacity: Option<f32>,
    /// Fill polygons with diagonal stripes instead of a solid color.
    pub striped_fill: bool,
    /// Marker drawn at points.
    pub point_type: Option<PointType>,
    /// Fill color of the marker. Falls back to `fill_color`.
    pub point_fill_color: Option<Color>,
    /// Outline color of the marker. Falls back to `stroke_color`.
    pub point_stroke_color: Option<Color>,
    /// Size of the marker in pixels.
    pub point_size: Option<f64>,
    /// Rotation of the marker in degrees, clockwise.
    pub point_rotation: Option<f64>,
    /// Arrow heads drawn on lines.
    pub arrow_type: Option<ArrowType>,
    /// Label text. May contain `{coordinates}` and `{size}` placeholders.
    pub label: Option<String>,
    /// Label font size in pixels.
    pub label_size: Option<f64>,
    /// Label color.
    pub label_color: Option<Color>,
    /// Bold label font.
    pub label_bold: bool,
    /// Italic label font.
    pub label_italic: bool,
    /// Draw the selection outline around the feature.
    pub is_selected: bool,
    /// Analysis buffer around the feature as WKT.
    pub buffer: Option<String>,
}

/// Line pattern.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrokeType {
    /// Continuous line.
    Solid,
    /// Dashed line.
    Dash,
    /// Dotted line.
    Dot,
}

impl StrokeType {
    /// Dash pattern in pixels for a line of the given width, `None` for solid lines.
    pub fn dash_pattern(&self, width: f64) -> Option<Vec<f64>> {
        match self {
            StrokeType::Solid => None,
            StrokeType::Dash => Some(vec![4.0 * width, 4.0 * width]),
            StrokeType::Dot => Some(vec![width, 3.0 * width]),
        }
    }
}

/// Marker shape.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointType {
    /// Circle.
    Circle,
    /// Square standing on its side.
    Square,
    /// Triangle pointing up.
    Triangle,
    /// Five-pointed star.
    Star,
    /// Square standing on its corner.
    Diamond,
    /// Diagonal cross.
    Cross,
    /// Arrow pointing up.
    Arrow,
    /// Diamond filled with a gradient.
    GradientDiamond,
    /// Direction indicator.
    Orientation,
    /// No marker, only the label is drawn.
    Label,
}

impl PointType {
    /// Returns true if the shape is drawn as a generated vector icon.
    pub fn is_icon(&self) -> bool {
        matches!(
            self,
            PointType::Cross | PointType::Arrow | PointType::GradientDiamond | PointType::Orientation
        )
    }

    /// Returns true if a marker is drawn for the shape at all.
    pub fn has_marker(&self) -> bool {
        *self != PointType::Label
    }
}

/// Placement of arrow heads along lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrowType {
    /// No arrows.
    #[default]
    None,
    /// Arrow at the first vertex pointing backwards.
    Start,
    /// Arrow at the last vertex pointing forwards.
    End,
    /// Arrows at both ends.
    Both,
    /// Arrow at the middle of every segment.
    Along,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_camel_case() {
        let style: StyleDescriptor = serde_json::from_str(
            r##"{
                "styleKey": "roads",
                "zIndex": 3,
                "strokeColor": "#FF0000",
                "strokeType": "dash",
                "pointType": "gradientDiamond",
                "arrowType": "along",
                "isSelected": true
            }"##,
        )
        .unwrap();

        assert_eq!(style.style_key, "roads");
        assert_eq!(style.z_index, 3);
        assert_eq!(style.stroke_color, Some(Color::RED));
        assert_eq!(style.stroke_type, Some(StrokeType::Dash));
        assert_eq!(style.point_type, Some(PointType::GradientDiamond));
        assert_eq!(style.arrow_type, Some(ArrowType::Along));
        assert!(style.is_selected);
        assert!(style.label.is_none());
    }

    #[test]
    fn icon_shapes() {
        assert!(PointType::Cross.is_icon());
        assert!(!PointType::Diamond.is_icon());
        assert!(!PointType::Label.has_marker());
    }
}
