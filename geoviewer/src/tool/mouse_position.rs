use geoviewer_types::geo::{reproject, Crs};
use geoviewer_types::Geom;

use crate::tool::backend::{Interaction, InteractionEvent, InteractionEventKind, InteractionHandle};
use crate::tool::descriptor::{EnableArgs, MousePositionOptions};
use crate::tool::events::{EventSink, MousePositionEvent, ToolEvent};
use crate::tool::{coordinate, crs_or, EventPropagation, Tool, ToolContext};

pub(crate) struct MousePositionTool {
    display_crs: Crs,
    decimals: usize,
    events: EventSink,
    interaction: Option<InteractionHandle>,
}

impl MousePositionTool {
    pub(crate) fn new(options: MousePositionOptions, map_crs: &Crs, events: EventSink) -> Self {
        Self {
            display_crs: crs_or(options.projection.as_deref(), map_crs),
            decimals: options.decimals as usize,
            events,
            interaction: None,
        }
    }
}

impl Tool for MousePositionTool {
    fn enable(&mut self, ctx: &mut ToolContext<'_>, _args: Option<&EnableArgs>) {
        if self.interaction.is_none() {
            self.interaction = Some(ctx.backend.add_interaction(Interaction::PointerMove));
        }
    }

    fn disable(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(handle) = self.interaction.take() {
            ctx.backend.remove_interaction(handle);
        }
    }

    fn handle(&mut self, event: &InteractionEvent, ctx: &mut ToolContext<'_>) -> EventPropagation {
        if Some(event.interaction) != self.interaction {
            return EventPropagation::Propagate;
        }
        let InteractionEventKind::PointerMove { coordinate: point } = &event.kind else {
            return EventPropagation::Propagate;
        };

        let Some(Geom::Point(point)) =
            reproject(&Geom::Point(*point), ctx.crs(), &self.display_crs)
        else {
            return EventPropagation::Propagate;
        };

        let precision = self.decimals;
        self.events
            .emit(ToolEvent::MousePosition(MousePositionEvent {
                coordinate: coordinate(point),
                text: format!("{:.precision$}, {:.precision$}", point.x, point.y),
            }));

        EventPropagation::Propagate
    }
}
