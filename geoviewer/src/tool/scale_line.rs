use crate::tool::backend::{Control, ControlHandle, InteractionEvent};
use crate::tool::descriptor::{EnableArgs, ScaleLineOptions};
use crate::tool::{EventPropagation, Tool, ToolContext};

/// Scale bar. Has no events of its own.
pub(crate) struct ScaleLineTool {
    options: ScaleLineOptions,
    control: Option<ControlHandle>,
}

impl ScaleLineTool {
    pub(crate) fn new(options: ScaleLineOptions) -> Self {
        Self {
            options,
            control: None,
        }
    }
}

impl Tool for ScaleLineTool {
    fn enable(&mut self, ctx: &mut ToolContext<'_>, _args: Option<&EnableArgs>) {
        if self.control.is_none() {
            self.control = Some(ctx.backend.add_control(Control::ScaleLine {
                units: self.options.units,
            }));
        }
    }

    fn disable(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(handle) = self.control.take() {
            ctx.backend.remove_control(handle);
        }
    }

    fn handle(&mut self, _event: &InteractionEvent, _ctx: &mut ToolContext<'_>) -> EventPropagation {
        EventPropagation::Propagate
    }
}
