use geoviewer_types::geo::{reproject, Crs};
use geoviewer_types::wkt::CircleEncoding;

use crate::layer::RenderedFeature;
use crate::style::StyleDescriptor;
use crate::tool::backend::{
    EditedGeometry, Interaction, InteractionEvent, InteractionEventKind, InteractionHandle,
};
use crate::tool::descriptor::{EditOptions, EnableArgs, TransformOptions};
use crate::tool::events::{EditEvent, EditedFeature, EventSink, ToolEvent};
use crate::tool::scratch::ScratchLayer;
use crate::tool::{crs_or, default_selection_style, EventPropagation, Tool, ToolContext};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum EditMode {
    Modify,
    Transform {
        translate: bool,
        rotate: bool,
        scale: bool,
    },
}

/// Modify and transform tools. The features given on enable are put onto the scratch layer of the
/// tool, and the backend interaction edits them there.
pub(crate) struct EditTool {
    mode: EditMode,
    style: StyleDescriptor,
    data_crs: Crs,
    events: EventSink,
    interaction: Option<InteractionHandle>,
    scratch: ScratchLayer,
}

impl EditTool {
    pub(crate) fn modify(options: EditOptions, map_crs: &Crs, events: EventSink) -> Self {
        Self::new(
            EditMode::Modify,
            options.style,
            options.data_projection.as_deref(),
            map_crs,
            events,
        )
    }

    pub(crate) fn transform(options: TransformOptions, map_crs: &Crs, events: EventSink) -> Self {
        Self::new(
            EditMode::Transform {
                translate: options.translate,
                rotate: options.rotate,
                scale: options.scale,
            },
            options.style,
            options.data_projection.as_deref(),
            map_crs,
            events,
        )
    }

    fn new(
        mode: EditMode,
        style: Option<StyleDescriptor>,
        data_projection: Option<&str>,
        map_crs: &Crs,
        events: EventSink,
    ) -> Self {
        let mut style = style.unwrap_or_else(default_selection_style);
        style.is_selected = true;

        Self {
            mode,
            style,
            data_crs: crs_or(data_projection, map_crs),
            events,
            interaction: None,
            scratch: ScratchLayer::default(),
        }
    }

    fn load_features(&self, ctx: &ToolContext<'_>, args: Option<&EnableArgs>) -> Vec<RenderedFeature> {
        let Some(args) = args else {
            return vec![];
        };

        let codec = ctx.style_engine.codec();
        args.features
            .iter()
            .filter_map(|feature| {
                let geometry = match codec.decode(&feature.geometry) {
                    Ok(geometry) => geometry,
                    Err(err) => {
                        log::warn!("Invalid geometry of feature {}: {err}", feature.id);
                        return None;
                    }
                };
                let Some(geometry) = reproject(&geometry, &self.data_crs, ctx.crs()) else {
                    log::warn!(
                        "Feature {} cannot be projected from {}",
                        feature.id,
                        self.data_crs.code()
                    );
                    return None;
                };

                let mut style = feature.style.clone().unwrap_or_else(|| self.style.clone());
                style.is_selected = true;

                Some(RenderedFeature {
                    id: feature.id.clone(),
                    primitives: ctx.style_engine.resolve(&style, Some(&geometry)),
                    geometry,
                })
            })
            .collect()
    }

    fn edited(&self, ctx: &ToolContext<'_>, features: &[EditedGeometry]) -> EditEvent {
        let codec = ctx
            .style_engine
            .codec()
            .with_circle_encoding(CircleEncoding::Compact);

        let features = features
            .iter()
            .filter_map(|feature| {
                let Some(geometry) = reproject(&feature.geometry, ctx.crs(), &self.data_crs)
                else {
                    log::warn!(
                        "Feature {} cannot be projected to {}",
                        feature.id,
                        self.data_crs.code()
                    );
                    return None;
                };

                match codec.encode(&geometry) {
                    Ok(geometry) => Some(EditedFeature {
                        id: feature.id.clone(),
                        geometry,
                    }),
                    Err(err) => {
                        log::warn!("Feature {} cannot be written: {err}", feature.id);
                        None
                    }
                }
            })
            .collect();

        EditEvent { features }
    }
}

impl Tool for EditTool {
    fn enable(&mut self, ctx: &mut ToolContext<'_>, args: Option<&EnableArgs>) {
        if let Some(handle) = self.interaction.take() {
            ctx.backend.remove_interaction(handle);
        }

        let features = self.load_features(ctx, args);
        let Some(layer) = self.scratch.replace(ctx.backend, features) else {
            return;
        };

        let interaction = match self.mode {
            EditMode::Modify => Interaction::Modify { layer },
            EditMode::Transform {
                translate,
                rotate,
                scale,
            } => Interaction::Transform {
                layer,
                translate,
                rotate,
                scale,
            },
        };
        self.interaction = Some(ctx.backend.add_interaction(interaction));
    }

    fn disable(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(handle) = self.interaction.take() {
            ctx.backend.remove_interaction(handle);
        }
        self.scratch.clear(ctx.backend);
    }

    fn destroy(&mut self, ctx: &mut ToolContext<'_>) {
        self.disable(ctx);
        self.scratch.dispose(ctx.backend);
    }

    fn handle(&mut self, event: &InteractionEvent, ctx: &mut ToolContext<'_>) -> EventPropagation {
        if Some(event.interaction) != self.interaction {
            return EventPropagation::Propagate;
        }

        match (&event.kind, self.mode) {
            (InteractionEventKind::ModifyEnd { features }, EditMode::Modify) => {
                let event = self.edited(ctx, features);
                self.events.emit(ToolEvent::Modify(event));
                EventPropagation::Stop
            }
            (InteractionEventKind::TransformEnd { features }, EditMode::Transform { .. }) => {
                let event = self.edited(ctx, features);
                self.events.emit(ToolEvent::Transform(event));
                EventPropagation::Stop
            }
            _ => EventPropagation::Propagate,
        }
    }
}
