use geoviewer_types::geo::{reproject, Crs};
use geoviewer_types::wkt::CircleEncoding;
use geoviewer_types::Geom;

use crate::layer::RenderedFeature;
use crate::style::StyleDescriptor;
use crate::tool::backend::{Interaction, InteractionEvent, InteractionEventKind, InteractionHandle};
use crate::tool::descriptor::{EnableArgs, SelectOptions};
use crate::tool::events::{EventSink, SelectEvent, SelectedFeature, ToolEvent};
use crate::tool::scratch::ScratchLayer;
use crate::tool::{crs_or, default_selection_style, EventPropagation, Tool, ToolContext};

/// Picks features of the map layers. Selected features are highlighted on the scratch layer of
/// the tool.
pub(crate) struct SelectTool {
    options: SelectOptions,
    style: StyleDescriptor,
    data_crs: Crs,
    events: EventSink,
    interaction: Option<InteractionHandle>,
    scratch: ScratchLayer,
}

impl SelectTool {
    pub(crate) fn new(options: SelectOptions, map_crs: &Crs, events: EventSink) -> Self {
        let mut style = options.style.clone().unwrap_or_else(default_selection_style);
        style.is_selected = true;

        Self {
            data_crs: crs_or(options.data_projection.as_deref(), map_crs),
            options,
            style,
            events,
            interaction: None,
            scratch: ScratchLayer::default(),
        }
    }

    fn render(
        &self,
        ctx: &ToolContext<'_>,
        id: String,
        geometry: Geom,
        style: Option<&StyleDescriptor>,
    ) -> RenderedFeature {
        let primitives = match style {
            Some(style) => {
                let mut style = style.clone();
                style.is_selected = true;
                ctx.style_engine.resolve(&style, Some(&geometry))
            }
            None => ctx.style_engine.resolve(&self.style, Some(&geometry)),
        };

        RenderedFeature {
            id,
            geometry,
            primitives,
        }
    }
}

impl Tool for SelectTool {
    fn enable(&mut self, ctx: &mut ToolContext<'_>, args: Option<&EnableArgs>) {
        if let Some(handle) = self.interaction.take() {
            ctx.backend.remove_interaction(handle);
        }

        let codec = *ctx.style_engine.codec();
        let preselected = args
            .map(|args| args.features.as_slice())
            .unwrap_or_default()
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

                Some(self.render(ctx, feature.id.clone(), geometry, feature.style.as_ref()))
            })
            .collect();
        self.scratch.replace(ctx.backend, preselected);

        self.interaction = Some(ctx.backend.add_interaction(Interaction::Select {
            layers: self.options.layer_filter.clone(),
            multi: self.options.multi,
        }));
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
        let InteractionEventKind::Select { hits } = &event.kind else {
            return EventPropagation::Propagate;
        };

        let hits: Vec<_> = hits
            .iter()
            .filter(|hit| {
                self.options.layer_filter.is_empty()
                    || self.options.layer_filter.contains(&hit.layer_id)
            })
            .collect();

        let codec = ctx
            .style_engine
            .codec()
            .with_circle_encoding(CircleEncoding::Compact);
        let features = hits
            .iter()
            .filter_map(|hit| {
                let Some(geometry) = reproject(&hit.geometry, ctx.crs(), &self.data_crs) else {
                    log::warn!(
                        "Feature {} cannot be projected to {}",
                        hit.feature_id,
                        self.data_crs.code()
                    );
                    return None;
                };

                match codec.encode(&geometry) {
                    Ok(geometry) => Some(SelectedFeature {
                        layer_id: hit.layer_id.clone(),
                        feature_id: hit.feature_id.clone(),
                        geometry,
                    }),
                    Err(err) => {
                        log::warn!("Feature {} cannot be written: {err}", hit.feature_id);
                        None
                    }
                }
            })
            .collect();

        let rendered = hits
            .iter()
            .map(|hit| self.render(ctx, hit.feature_id.clone(), hit.geometry.clone(), None))
            .collect();
        self.scratch.replace(ctx.backend, rendered);

        self.events.emit(ToolEvent::Select(SelectEvent { features }));
        EventPropagation::Stop
    }
}
