//! Interactive tools and their registry.
//!
//! A tool is a stateful capability (drawing, selection, editing, ...) that attaches interaction
//! handlers to the map while it is enabled. Tools are registered in the [`ToolManager`] that
//! enforces mutual exclusion of tools and re-enables default tools. Every tool reports its results
//! through its own stream of [`ToolEvent`]s.

use geoviewer_types::geo::Crs;
use geoviewer_types::Point2d;
use maybe_sync::{MaybeSend, MaybeSync};

use crate::style::{PointType, StyleDescriptor, StyleEngine};
use crate::Color;

mod backend;
mod click;
mod descriptor;
mod draw;
mod edit;
mod events;
mod manager;
mod mouse_position;
mod scale_line;
mod scratch;
mod select;

pub use backend::{
    Control, ControlHandle, EditedGeometry, FeatureHit, Interaction, InteractionBackend,
    InteractionEvent, InteractionEventKind, InteractionHandle, ScratchLayerHandle, SketchType,
};
pub use descriptor::{
    ClickOptions, DrawOptions, DrawingType, EditOptions, EnableArgs, MousePositionOptions,
    ScaleLineOptions, ScaleUnits, SelectOptions, ToolDescriptor, ToolFeature, ToolKind,
    TransformOptions,
};
pub use events::{
    ClickEvent, DrawPhase, DrawingToolEvent, EditEvent, EditedFeature, HitFeature,
    MousePositionEvent, SelectEvent, SelectedFeature, ToolEvent,
};
pub use manager::{AddedTool, ToolManager, ToolState};

/// Value returned by a tool to indicate what happens with the event after the tool handled it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventPropagation {
    /// Event should be propagated to the next tool.
    Propagate,
    /// Event should not be propagated to the next tool.
    Stop,
}

/// Services available to a tool while it changes state or handles an event.
pub(crate) struct ToolContext<'a> {
    pub(crate) backend: &'a mut dyn InteractionBackend,
    pub(crate) style_engine: &'a StyleEngine,
}

impl ToolContext<'_> {
    pub(crate) fn crs(&self) -> &Crs {
        self.style_engine.crs()
    }
}

/// Behaviour of a concrete tool. The [`ToolManager`] guarantees that `enable` and `disable` calls
/// follow the tool state machine, except that `enable` may be called again on an enabled tool to
/// apply new arguments.
pub(crate) trait Tool: MaybeSend + MaybeSync {
    fn enable(&mut self, ctx: &mut ToolContext<'_>, args: Option<&EnableArgs>);
    fn disable(&mut self, ctx: &mut ToolContext<'_>);
    /// Releases all backend resources. The tool is never used afterwards.
    fn destroy(&mut self, ctx: &mut ToolContext<'_>) {
        self.disable(ctx);
    }
    fn handle(&mut self, event: &InteractionEvent, ctx: &mut ToolContext<'_>) -> EventPropagation;
}

/// Coordinate system given by the code, or the fallback if the code is not set or unknown.
pub(crate) fn crs_or(code: Option<&str>, fallback: &Crs) -> Crs {
    let Some(code) = code else {
        return fallback.clone();
    };

    match Crs::from_code(code) {
        Ok(crs) => crs,
        Err(err) => {
            log::warn!("Unknown projection {code}, using the map projection: {err}");
            fallback.clone()
        }
    }
}

pub(crate) fn coordinate(point: Point2d) -> [f64; 2] {
    [point.x, point.y]
}

pub(crate) fn default_sketch_style() -> StyleDescriptor {
    StyleDescriptor {
        style_key: "tool-sketch".into(),
        stroke_color: Some(Color::BLUE),
        stroke_width: Some(2.0),
        fill_color: Some(Color::WHITE),
        fill_opacity: Some(0.4),
        point_type: Some(PointType::Circle),
        point_size: Some(8.0),
        ..Default::default()
    }
}

pub(crate) fn default_selection_style() -> StyleDescriptor {
    StyleDescriptor {
        style_key: "tool-selection".into(),
        stroke_color: Some(Color::BLUE),
        stroke_width: Some(3.0),
        fill_color: Some(Color::WHITE),
        fill_opacity: Some(0.2),
        point_type: Some(PointType::Circle),
        point_size: Some(10.0),
        is_selected: true,
        ..Default::default()
    }
}
