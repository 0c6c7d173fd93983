use serde::{Deserialize, Serialize};

use crate::style::StyleDescriptor;

/// Declarative description of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Name of the component that registered the tool.
    pub owner: String,
    /// Enable the tool on registration and every time another tool is disabled or removed.
    #[serde(default)]
    pub auto_enable: bool,
    /// Enable the tool on registration and keep it enabled when other tools are enabled
    /// exclusively.
    #[serde(default)]
    pub always_enabled: bool,
    /// Tool type and its options.
    #[serde(flatten)]
    pub kind: ToolKind,
}

impl ToolDescriptor {
    /// Creates a descriptor with both flags unset.
    pub fn new(owner: impl Into<String>, kind: ToolKind) -> Self {
        Self {
            owner: owner.into(),
            auto_enable: false,
            always_enabled: false,
            kind,
        }
    }

    /// Sets the `auto_enable` flag.
    pub fn with_auto_enable(mut self) -> Self {
        self.auto_enable = true;
        self
    }

    /// Sets the `always_enabled` flag.
    pub fn with_always_enabled(mut self) -> Self {
        self.always_enabled = true;
        self
    }
}

/// Tool types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ToolKind {
    /// Reports map clicks with the features under the cursor.
    Click(ClickOptions),
    /// Draws a new geometry.
    Draw(DrawOptions),
    /// Selects features of layers.
    Select(SelectOptions),
    /// Edits vertices of features.
    Modify(EditOptions),
    /// Moves, rotates and scales features.
    Transform(TransformOptions),
    /// Reports cursor coordinates.
    MousePosition(MousePositionOptions),
    /// Shows a scale bar.
    ScaleLine(ScaleLineOptions),
}

impl ToolKind {
    /// Name of the tool type used in tool ids.
    pub fn type_name(&self) -> &'static str {
        match self {
            ToolKind::Click(_) => "click",
            ToolKind::Draw(_) => "draw",
            ToolKind::Select(_) => "select",
            ToolKind::Modify(_) => "modify",
            ToolKind::Transform(_) => "transform",
            ToolKind::MousePosition(_) => "mouse-position",
            ToolKind::ScaleLine(_) => "scale-line",
        }
    }
}

/// Options of the click tool.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClickOptions {
    /// Report only hits on these layers. `None` reports hits on all layers.
    pub layer_filter: Option<Vec<String>>,
}

/// Geometry drawn by the draw tool.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawingType {
    /// Single point.
    Point,
    /// Open line.
    Line,
    /// Polygon.
    Polygon,
    /// Circle around the first point through the cursor.
    Circle,
    /// Square inscribed into the circle.
    Square,
    /// Box with the first point and the cursor as opposite corners.
    Rectangle,
    /// Ellipse with semi-axes given by the offset of the cursor from the first point.
    Ellipse,
    /// Five-pointed star inscribed into the circle.
    Star,
}

impl DrawingType {
    /// Returns true for shapes built from the two anchor points.
    pub fn is_shape(&self) -> bool {
        !matches!(
            self,
            DrawingType::Point | DrawingType::Line | DrawingType::Polygon
        )
    }
}

/// Options of the draw tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawOptions {
    /// Geometry to draw.
    pub drawing_type: DrawingType,
    /// Style of the sketch.
    #[serde(default)]
    pub style: Option<StyleDescriptor>,
    /// Report length or area of the sketch with every event.
    #[serde(default)]
    pub measure: bool,
}

impl DrawOptions {
    /// Options for drawing the given geometry type without measurements.
    pub fn new(drawing_type: DrawingType) -> Self {
        Self {
            drawing_type,
            style: None,
            measure: false,
        }
    }
}

/// Options of the select tool.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectOptions {
    /// Ids of the layers features can be selected from. Empty list allows all layers.
    pub layer_filter: Vec<String>,
    /// Style of the selected features.
    pub style: Option<StyleDescriptor>,
    /// Allow selecting several features at once.
    pub multi: bool,
    /// Code of the coordinate system of the preselected and reported geometries. Defaults to the
    /// coordinate system of the map.
    pub data_projection: Option<String>,
}

/// Options of the modify tool.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditOptions {
    /// Style of the edited features.
    pub style: Option<StyleDescriptor>,
    /// Code of the coordinate system of the input and output geometries. Defaults to the
    /// coordinate system of the map.
    pub data_projection: Option<String>,
}

/// Options of the transform tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    /// Style of the transformed features.
    pub style: Option<StyleDescriptor>,
    /// Allow moving.
    pub translate: bool,
    /// Allow rotation.
    pub rotate: bool,
    /// Allow scaling.
    pub scale: bool,
    /// Code of the coordinate system of the input and output geometries. Defaults to the
    /// coordinate system of the map.
    pub data_projection: Option<String>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            style: None,
            translate: true,
            rotate: false,
            scale: false,
            data_projection: None,
        }
    }
}

/// Options of the mouse position tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MousePositionOptions {
    /// Code of the coordinate system coordinates are displayed in. Defaults to the coordinate
    /// system of the map.
    pub projection: Option<String>,
    /// Number of decimals in the formatted coordinates.
    pub decimals: u32,
}

impl Default for MousePositionOptions {
    fn default() -> Self {
        Self {
            projection: None,
            decimals: 4,
        }
    }
}

/// Units of the scale bar.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleUnits {
    /// Meters and kilometers.
    #[default]
    Metric,
    /// Feet and miles.
    Imperial,
    /// Nautical miles.
    Nautical,
    /// Degrees.
    Degrees,
}

/// Options of the scale line tool.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScaleLineOptions {
    /// Units of the bar.
    pub units: ScaleUnits,
}

/// Feature handed to a tool when it is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolFeature {
    /// Id of the feature.
    pub id: String,
    /// Geometry as WKT in the data projection of the tool.
    pub geometry: String,
    /// Style of the feature. The tool style is used if not set.
    #[serde(default)]
    pub style: Option<StyleDescriptor>,
}

impl ToolFeature {
    /// Creates a feature with the tool style.
    pub fn new(id: impl Into<String>, geometry: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            geometry: geometry.into(),
            style: None,
        }
    }
}

/// Arguments of [`ToolManager::enable_tool`](super::ToolManager::enable_tool).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnableArgs {
    /// Features to select or edit.
    pub features: Vec<ToolFeature>,
    /// Overrides the drawing type of a draw tool.
    pub drawing_type: Option<DrawingType>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn deserialize_descriptor() {
        let json = r#"{
            "owner": "editor",
            "autoEnable": true,
            "type": "draw",
            "drawingType": "square",
            "measure": true
        }"#;

        let descriptor: ToolDescriptor = serde_json::from_str(json).expect("valid descriptor");
        assert!(descriptor.auto_enable);
        assert!(!descriptor.always_enabled);
        assert_matches!(
            descriptor.kind,
            ToolKind::Draw(DrawOptions {
                drawing_type: DrawingType::Square,
                measure: true,
                style: None,
            })
        );
    }

    #[test]
    fn transform_defaults() {
        let json = r#"{"owner": "editor", "type": "transform"}"#;
        let descriptor: ToolDescriptor = serde_json::from_str(json).expect("valid descriptor");
        assert_eq!(descriptor.kind, ToolKind::Transform(TransformOptions::default()));
        assert_eq!(descriptor.kind.type_name(), "transform");
    }

    #[test]
    fn mouse_position_type_name() {
        let json = r#"{"owner": "status", "type": "mousePosition", "decimals": 2}"#;
        let descriptor: ToolDescriptor = serde_json::from_str(json).expect("valid descriptor");
        assert_eq!(descriptor.kind.type_name(), "mouse-position");
    }
}
