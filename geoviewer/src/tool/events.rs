use futures::channel::mpsc::UnboundedSender;
use serde::{Deserialize, Serialize};

/// Event emitted by a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ToolEvent {
    /// Map click.
    Click(ClickEvent),
    /// Change of the geometry being drawn.
    Draw(DrawingToolEvent),
    /// Selection change.
    Select(SelectEvent),
    /// Vertices of features were edited.
    Modify(EditEvent),
    /// Features were moved, rotated or scaled.
    Transform(EditEvent),
    /// Cursor moved.
    MousePosition(MousePositionEvent),
}

/// Feature found under the cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitFeature {
    /// Id of the layer of the feature.
    pub layer_id: String,
    /// Id of the feature.
    pub feature_id: String,
}

/// Map click with the features under the cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    /// Clicked point in map coordinates.
    pub coordinate: [f64; 2],
    /// Features under the cursor from the top one.
    pub hits: Vec<HitFeature>,
}

/// Phase of a draw gesture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawPhase {
    /// First event of the gesture.
    Start,
    /// The geometry changed.
    Change,
    /// Last event of the gesture.
    End,
}

/// Geometry being drawn.
///
/// A gesture produces exactly one `Start` event, any number of `Change` events and one `End`
/// event. A gesture that is cancelled or interrupted by disabling the tool never gets its `End`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingToolEvent {
    /// Geometry as WKT in map coordinates. Circles use the `CIRCLE(cx cy r)` form.
    pub geometry: String,
    /// First point of the gesture.
    pub center_coordinate: [f64; 2],
    /// Last point of the gesture.
    pub last_coordinate: [f64; 2],
    /// Distance between the first and the last points, for shapes built around a center.
    pub radius: Option<f64>,
    /// Formatted length or area of the geometry, if the tool measures.
    pub size: Option<String>,
    /// Phase of the gesture.
    pub phase: DrawPhase,
}

/// Selected feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedFeature {
    /// Id of the layer of the feature.
    pub layer_id: String,
    /// Id of the feature.
    pub feature_id: String,
    /// Geometry as WKT in map coordinates.
    pub geometry: String,
}

/// All currently selected features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectEvent {
    /// Selected features.
    pub features: Vec<SelectedFeature>,
}

/// Feature after an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditedFeature {
    /// Id of the feature.
    pub id: String,
    /// Geometry as WKT in the data projection of the tool.
    pub geometry: String,
}

/// Completed edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEvent {
    /// Changed features.
    pub features: Vec<EditedFeature>,
}

/// Cursor position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MousePositionEvent {
    /// Cursor position in the display coordinate system.
    pub coordinate: [f64; 2],
    /// Formatted coordinates.
    pub text: String,
}

/// Sending half of the event stream of a tool.
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    sender: UnboundedSender<ToolEvent>,
}

impl EventSink {
    pub(crate) fn new(sender: UnboundedSender<ToolEvent>) -> Self {
        Self { sender }
    }

    pub(crate) fn emit(&self, event: ToolEvent) {
        if self.sender.unbounded_send(event).is_err() {
            log::debug!("Tool event stream is closed, event dropped");
        }
    }
}
