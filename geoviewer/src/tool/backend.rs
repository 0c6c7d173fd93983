use std::sync::Arc;

use geoviewer_types::{Geom, Point2d};
use maybe_sync::{MaybeSend, MaybeSync};

use crate::error::GeoViewerError;
use crate::layer::RenderedFeature;
use crate::style::DrawPrimitive;
use crate::tool::descriptor::ScaleUnits;

/// Identifier of an interaction attached to the map by an [`InteractionBackend`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct InteractionHandle(pub u64);

/// Identifier of a scratch vector layer owned by a tool.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ScratchLayerHandle(pub u64);

/// Identifier of a map control.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ControlHandle(pub u64);

/// Geometry the backend collects during a draw gesture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SketchType {
    /// Single point.
    Point,
    /// Open line.
    LineString,
    /// Polygon.
    Polygon,
    /// Two anchors: the first clicked point and the cursor, reported as a two-point line.
    Anchors,
}

/// Interaction handler requested by a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    /// Reports clicks with the features under the cursor.
    Click,
    /// Reports cursor movement.
    PointerMove,
    /// Draws a sketch of the given type.
    Draw {
        /// Geometry collected by the gesture.
        sketch: SketchType,
        /// Style of the sketch.
        style: Arc<Vec<DrawPrimitive>>,
    },
    /// Picks features of the given layers by clicking on them.
    Select {
        /// Ids of the layers to pick from. Empty list means all layers.
        layers: Vec<String>,
        /// Allow selecting several features at once.
        multi: bool,
    },
    /// Moves vertices of the features of the scratch layer.
    Modify {
        /// Layer with the edited features.
        layer: ScratchLayerHandle,
    },
    /// Moves, rotates or scales the features of the scratch layer as a whole.
    Transform {
        /// Layer with the edited features.
        layer: ScratchLayerHandle,
        /// Allow moving.
        translate: bool,
        /// Allow rotation.
        rotate: bool,
        /// Allow scaling.
        scale: bool,
    },
}

/// Map control requested by a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Scale bar.
    ScaleLine {
        /// Units of the bar.
        units: ScaleUnits,
    },
}

/// Feature found under the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureHit {
    /// Id of the layer of the feature.
    pub layer_id: String,
    /// Id of the feature.
    pub feature_id: String,
    /// Geometry of the feature in map coordinates.
    pub geometry: Geom,
}

/// Feature geometry after an edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditedGeometry {
    /// Id of the feature.
    pub id: String,
    /// New geometry in map coordinates.
    pub geometry: Geom,
}

/// Event reported by an interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    /// Interaction that produced the event.
    pub interaction: InteractionHandle,
    /// Event data.
    pub kind: InteractionEventKind,
}

/// Data of an [`InteractionEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEventKind {
    /// Map click.
    Click {
        /// Clicked point in map coordinates.
        coordinate: Point2d,
        /// Features under the cursor from the top one.
        hits: Vec<FeatureHit>,
    },
    /// Cursor moved.
    PointerMove {
        /// Cursor position in map coordinates.
        coordinate: Point2d,
    },
    /// A draw gesture started.
    SketchStart(Geom),
    /// The sketch of the current gesture changed.
    SketchChange(Geom),
    /// The draw gesture finished.
    SketchEnd(Geom),
    /// The draw gesture was cancelled.
    SketchAbort,
    /// Selection changed.
    Select {
        /// All currently selected features.
        hits: Vec<FeatureHit>,
    },
    /// Vertex editing finished.
    ModifyEnd {
        /// Changed features.
        features: Vec<EditedGeometry>,
    },
    /// Transformation finished.
    TransformEnd {
        /// Changed features.
        features: Vec<EditedGeometry>,
    },
}

/// Interaction part of the map backend.
pub trait InteractionBackend: MaybeSend + MaybeSync {
    /// Attaches an interaction handler to the map.
    fn add_interaction(&mut self, interaction: Interaction) -> InteractionHandle;
    /// Detaches the interaction handler.
    fn remove_interaction(&mut self, handle: InteractionHandle);
    /// Creates an empty vector layer drawn above all other layers.
    fn create_scratch_layer(&mut self) -> Result<ScratchLayerHandle, GeoViewerError>;
    /// Replaces the features of the scratch layer.
    fn set_scratch_features(&mut self, layer: ScratchLayerHandle, features: Vec<RenderedFeature>);
    /// Removes all features of the scratch layer.
    fn clear_scratch_layer(&mut self, layer: ScratchLayerHandle);
    /// Removes the scratch layer from the map.
    fn dispose_scratch_layer(&mut self, layer: ScratchLayerHandle);
    /// Adds a control to the map.
    fn add_control(&mut self, control: Control) -> ControlHandle;
    /// Removes the control.
    fn remove_control(&mut self, handle: ControlHandle);
}
