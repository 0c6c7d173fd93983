use std::sync::Arc;

use futures::channel::mpsc::{self, UnboundedReceiver};
use indexmap::IndexMap;

use crate::style::StyleEngine;
use crate::tool::backend::{InteractionBackend, InteractionEvent};
use crate::tool::click::ClickTool;
use crate::tool::descriptor::{EnableArgs, ToolDescriptor, ToolKind};
use crate::tool::draw::DrawTool;
use crate::tool::edit::EditTool;
use crate::tool::events::{EventSink, ToolEvent};
use crate::tool::mouse_position::MousePositionTool;
use crate::tool::scale_line::ScaleLineTool;
use crate::tool::select::SelectTool;
use crate::tool::{EventPropagation, Tool, ToolContext};

/// State of a registered tool. Removed tools are forgotten by the manager, so the terminal
/// destroyed state is never reported.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ToolState {
    /// Registered but never enabled.
    Created,
    /// Interaction handlers are attached.
    Enabled,
    /// Interaction handlers are detached.
    Disabled,
}

/// Result of [`ToolManager::add_tool`].
#[derive(Debug)]
pub struct AddedTool {
    /// Id of the new tool.
    pub id: String,
    /// Events of the tool. The stream ends when the tool is removed.
    pub events: UnboundedReceiver<ToolEvent>,
}

struct ToolEntry {
    descriptor: ToolDescriptor,
    state: ToolState,
    tool: Box<dyn Tool>,
}

/// Registry of the tools of the map.
///
/// At most one exclusive tool is expected to be enabled at a time: callers enable user-selectable
/// tools with `disable_others = true`. Tools with the `always_enabled` flag are never disabled by
/// that, and tools with the `auto_enable` flag are enabled again every time another tool is
/// disabled or removed.
pub struct ToolManager {
    backend: Box<dyn InteractionBackend>,
    style_engine: Arc<StyleEngine>,
    tools: IndexMap<String, ToolEntry>,
    sequence: u64,
}

impl ToolManager {
    /// Creates a manager without tools.
    pub fn new(backend: Box<dyn InteractionBackend>, style_engine: Arc<StyleEngine>) -> Self {
        Self {
            backend,
            style_engine,
            tools: IndexMap::new(),
            sequence: 0,
        }
    }

    /// Registers a new tool. Tools with `always_enabled` or `auto_enable` flags are enabled
    /// immediately.
    pub fn add_tool(&mut self, descriptor: ToolDescriptor) -> AddedTool {
        self.sequence += 1;
        let id = format!("{}-{}", descriptor.kind.type_name(), self.sequence);

        let (sender, events) = mpsc::unbounded();
        let sink = EventSink::new(sender);
        let crs = self.style_engine.crs();
        let tool: Box<dyn Tool> = match &descriptor.kind {
            ToolKind::Click(options) => Box::new(ClickTool::new(options.clone(), sink)),
            ToolKind::Draw(options) => Box::new(DrawTool::new(options.clone(), sink)),
            ToolKind::Select(options) => Box::new(SelectTool::new(options.clone(), crs, sink)),
            ToolKind::Modify(options) => Box::new(EditTool::modify(options.clone(), crs, sink)),
            ToolKind::Transform(options) => {
                Box::new(EditTool::transform(options.clone(), crs, sink))
            }
            ToolKind::MousePosition(options) => {
                Box::new(MousePositionTool::new(options.clone(), crs, sink))
            }
            ToolKind::ScaleLine(options) => Box::new(ScaleLineTool::new(options.clone())),
        };

        let enable = descriptor.always_enabled || descriptor.auto_enable;
        log::debug!("Tool {id} registered by {}", descriptor.owner);
        self.tools.insert(
            id.clone(),
            ToolEntry {
                descriptor,
                state: ToolState::Created,
                tool,
            },
        );

        if enable {
            self.enable_entry(&id, None);
        }

        AddedTool { id, events }
    }

    /// Enables the tool.
    ///
    /// With `disable_others` every other enabled tool except the `always_enabled` ones is disabled
    /// first. An enabled tool stays enabled; if `args` are given, it is enabled again with them.
    /// Unknown ids are ignored.
    pub fn enable_tool(&mut self, id: &str, disable_others: bool, args: Option<&EnableArgs>) {
        if !self.tools.contains_key(id) {
            return;
        }

        if disable_others {
            let others: Vec<String> = self
                .tools
                .iter()
                .filter(|(other, entry)| {
                    other.as_str() != id
                        && entry.state == ToolState::Enabled
                        && !entry.descriptor.always_enabled
                })
                .map(|(other, _)| other.clone())
                .collect();
            for other in others {
                self.disable_entry(&other);
            }
        }

        self.enable_entry(id, args);
    }

    /// Disables the tool. Unless `prevent_auto_enable` is set, every other `auto_enable` tool that
    /// is not enabled is enabled afterwards. Unknown ids are ignored.
    pub fn disable_tool(&mut self, id: &str, prevent_auto_enable: bool) {
        if !self.tools.contains_key(id) {
            return;
        }

        self.disable_entry(id);
        if !prevent_auto_enable {
            self.auto_enable(Some(id));
        }
    }

    /// Destroys the tool and forgets it, then enables `auto_enable` tools like
    /// [`ToolManager::disable_tool`] does. Unknown ids are ignored.
    pub fn remove_tool(&mut self, id: &str) {
        let Some(mut entry) = self.tools.shift_remove(id) else {
            return;
        };

        let mut ctx = ToolContext {
            backend: &mut *self.backend,
            style_engine: &self.style_engine,
        };
        entry.tool.destroy(&mut ctx);
        log::debug!("Tool {id} removed");

        self.auto_enable(None);
    }

    /// Destroys all tools in registration order.
    pub fn destroy(mut self) {
        let mut ctx = ToolContext {
            backend: &mut *self.backend,
            style_engine: &self.style_engine,
        };
        for (id, mut entry) in self.tools.drain(..) {
            entry.tool.destroy(&mut ctx);
            log::debug!("Tool {id} destroyed");
        }
    }

    /// Passes the event to the enabled tools in registration order until one of them stops it.
    pub fn dispatch(&mut self, event: &InteractionEvent) {
        let mut ctx = ToolContext {
            backend: &mut *self.backend,
            style_engine: &self.style_engine,
        };

        for entry in self.tools.values_mut() {
            if entry.state != ToolState::Enabled {
                continue;
            }

            match entry.tool.handle(event, &mut ctx) {
                EventPropagation::Propagate => {}
                EventPropagation::Stop => break,
            }
        }
    }

    /// State of the tool, `None` for unknown ids.
    pub fn state(&self, id: &str) -> Option<ToolState> {
        self.tools.get(id).map(|entry| entry.state)
    }

    /// Ids of the enabled tools in registration order.
    pub fn enabled_ids(&self) -> Vec<&str> {
        self.tools
            .iter()
            .filter(|(_, entry)| entry.state == ToolState::Enabled)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Ids of all tools in registration order.
    pub fn tool_ids(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Descriptor the tool was registered with.
    pub fn descriptor(&self, id: &str) -> Option<&ToolDescriptor> {
        self.tools.get(id).map(|entry| &entry.descriptor)
    }

    fn enable_entry(&mut self, id: &str, args: Option<&EnableArgs>) {
        let Some(entry) = self.tools.get_mut(id) else {
            return;
        };
        if entry.state == ToolState::Enabled && args.is_none() {
            return;
        }

        let mut ctx = ToolContext {
            backend: &mut *self.backend,
            style_engine: &self.style_engine,
        };
        entry.tool.enable(&mut ctx, args);
        entry.state = ToolState::Enabled;
        log::debug!("Tool {id} enabled");
    }

    fn disable_entry(&mut self, id: &str) {
        let Some(entry) = self.tools.get_mut(id) else {
            return;
        };
        if entry.state != ToolState::Enabled {
            return;
        }

        let mut ctx = ToolContext {
            backend: &mut *self.backend,
            style_engine: &self.style_engine,
        };
        entry.tool.disable(&mut ctx);
        entry.state = ToolState::Disabled;
        log::debug!("Tool {id} disabled");
    }

    fn auto_enable(&mut self, except: Option<&str>) {
        let ids: Vec<String> = self
            .tools
            .iter()
            .filter(|(id, entry)| {
                entry.descriptor.auto_enable
                    && entry.state != ToolState::Enabled
                    && Some(id.as_str()) != except
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in ids {
            self.enable_entry(&id, None);
        }
    }
}
