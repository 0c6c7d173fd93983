use crate::tool::backend::{Interaction, InteractionEvent, InteractionEventKind, InteractionHandle};
use crate::tool::descriptor::{ClickOptions, EnableArgs};
use crate::tool::events::{ClickEvent, EventSink, HitFeature, ToolEvent};
use crate::tool::{coordinate, EventPropagation, Tool, ToolContext};

pub(crate) struct ClickTool {
    options: ClickOptions,
    events: EventSink,
    interaction: Option<InteractionHandle>,
}

impl ClickTool {
    pub(crate) fn new(options: ClickOptions, events: EventSink) -> Self {
        Self {
            options,
            events,
            interaction: None,
        }
    }

    fn passes_filter(&self, layer_id: &str) -> bool {
        match &self.options.layer_filter {
            Some(layers) => layers.iter().any(|layer| layer == layer_id),
            None => true,
        }
    }
}

impl Tool for ClickTool {
    fn enable(&mut self, ctx: &mut ToolContext<'_>, _args: Option<&EnableArgs>) {
        if self.interaction.is_none() {
            self.interaction = Some(ctx.backend.add_interaction(Interaction::Click));
        }
    }

    fn disable(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(handle) = self.interaction.take() {
            ctx.backend.remove_interaction(handle);
        }
    }

    fn handle(&mut self, event: &InteractionEvent, _ctx: &mut ToolContext<'_>) -> EventPropagation {
        if Some(event.interaction) != self.interaction {
            return EventPropagation::Propagate;
        }

        if let InteractionEventKind::Click {
            coordinate: point,
            hits,
        } = &event.kind
        {
            let hits = hits
                .iter()
                .filter(|hit| self.passes_filter(&hit.layer_id))
                .map(|hit| HitFeature {
                    layer_id: hit.layer_id.clone(),
                    feature_id: hit.feature_id.clone(),
                })
                .collect();

            self.events.emit(ToolEvent::Click(ClickEvent {
                coordinate: coordinate(*point),
                hits,
            }));
        }

        EventPropagation::Propagate
    }
}
