use geoviewer_types::measure::format_size;
use geoviewer_types::shapes::{self, SCREEN_CIRCLE_VERTICES};
use geoviewer_types::wkt::CircleEncoding;
use geoviewer_types::{Circle, Geom, Point2d};

use crate::tool::backend::{
    Interaction, InteractionEvent, InteractionEventKind, InteractionHandle, SketchType,
};
use crate::tool::descriptor::{DrawOptions, DrawingType, EnableArgs};
use crate::tool::events::{DrawPhase, DrawingToolEvent, EventSink, ToolEvent};
use crate::tool::{coordinate, default_sketch_style, EventPropagation, Tool, ToolContext};

const STAR_POINTS: usize = 5;
const STAR_INNER_RATIO: f64 = 0.5;

pub(crate) struct DrawTool {
    options: DrawOptions,
    drawing_type: DrawingType,
    events: EventSink,
    interaction: Option<InteractionHandle>,
    in_gesture: bool,
}

struct Drawn {
    geometry: Geom,
    center: Point2d,
    last: Point2d,
    radius: Option<f64>,
}

impl DrawTool {
    pub(crate) fn new(options: DrawOptions, events: EventSink) -> Self {
        Self {
            drawing_type: options.drawing_type,
            options,
            events,
            interaction: None,
            in_gesture: false,
        }
    }

    fn detach(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(handle) = self.interaction.take() {
            ctx.backend.remove_interaction(handle);
        }
        self.in_gesture = false;
    }

    fn emit(&self, drawn: Drawn, phase: DrawPhase, ctx: &ToolContext<'_>) {
        let codec = ctx
            .style_engine
            .codec()
            .with_circle_encoding(CircleEncoding::Compact);
        let geometry = match codec.encode(&drawn.geometry) {
            Ok(geometry) => geometry,
            Err(err) => {
                log::warn!("Drawn geometry cannot be written: {err}");
                return;
            }
        };
        let size = if self.options.measure {
            format_size(&drawn.geometry, ctx.crs())
        } else {
            None
        };

        self.events.emit(ToolEvent::Draw(DrawingToolEvent {
            geometry,
            center_coordinate: coordinate(drawn.center),
            last_coordinate: coordinate(drawn.last),
            radius: drawn.radius,
            size,
            phase,
        }));
    }

    /// Converts the sketch reported by the backend into the drawn geometry. Sketches of other
    /// geometry types are transient features of the backend and are ignored.
    fn build(&self, sketch: &Geom) -> Option<Drawn> {
        match (self.drawing_type, sketch) {
            (DrawingType::Point, Geom::Point(point)) => Some(Drawn {
                geometry: sketch.clone(),
                center: *point,
                last: *point,
                radius: None,
            }),
            (DrawingType::Line, Geom::LineString(points)) => Some(Drawn {
                geometry: sketch.clone(),
                center: *points.first()?,
                last: *points.last()?,
                radius: None,
            }),
            (DrawingType::Polygon, Geom::Polygon(polygon)) => {
                let ring = polygon.exterior();
                let last = if ring.len() > 1 {
                    ring[ring.len() - 2]
                } else {
                    *ring.first()?
                };

                Some(Drawn {
                    geometry: sketch.clone(),
                    center: *ring.first()?,
                    last,
                    radius: None,
                })
            }
            (shape, Geom::LineString(anchors)) if shape.is_shape() && anchors.len() >= 2 => {
                let center = *anchors.first()?;
                let last = *anchors.last()?;
                let radius = (last - center).norm();

                Some(Drawn {
                    geometry: shape_geometry(shape, center, last),
                    center,
                    last,
                    radius: Some(radius),
                })
            }
            _ => None,
        }
    }
}

fn sketch_type(drawing_type: DrawingType) -> SketchType {
    match drawing_type {
        DrawingType::Point => SketchType::Point,
        DrawingType::Line => SketchType::LineString,
        DrawingType::Polygon => SketchType::Polygon,
        DrawingType::Circle
        | DrawingType::Square
        | DrawingType::Rectangle
        | DrawingType::Ellipse
        | DrawingType::Star => SketchType::Anchors,
    }
}

/// Shape built around `center` with the cursor at `last`.
fn shape_geometry(shape: DrawingType, center: Point2d, last: Point2d) -> Geom {
    let delta = last - center;
    let radius = delta.norm();
    let angle = delta.y.atan2(delta.x);

    match shape {
        DrawingType::Square => shapes::regular_polygon(center, radius, 4, angle).into(),
        DrawingType::Rectangle => shapes::rectangle(center, last).into(),
        DrawingType::Ellipse => {
            shapes::ellipse(center, delta.x.abs(), delta.y.abs(), SCREEN_CIRCLE_VERTICES).into()
        }
        DrawingType::Star => {
            shapes::star(center, radius, STAR_POINTS, STAR_INNER_RATIO, angle).into()
        }
        DrawingType::Circle | DrawingType::Point | DrawingType::Line | DrawingType::Polygon => {
            Circle::new(center, radius).into()
        }
    }
}

impl Tool for DrawTool {
    fn enable(&mut self, ctx: &mut ToolContext<'_>, args: Option<&EnableArgs>) {
        self.detach(ctx);

        self.drawing_type = args
            .and_then(|args| args.drawing_type)
            .unwrap_or(self.options.drawing_type);
        let style = match &self.options.style {
            Some(style) => ctx.style_engine.resolve_cached(style),
            None => ctx.style_engine.resolve_cached(&default_sketch_style()),
        };

        self.interaction = Some(ctx.backend.add_interaction(Interaction::Draw {
            sketch: sketch_type(self.drawing_type),
            style,
        }));
    }

    fn disable(&mut self, ctx: &mut ToolContext<'_>) {
        if self.in_gesture {
            log::debug!("Draw gesture abandoned");
        }
        self.detach(ctx);
    }

    fn handle(&mut self, event: &InteractionEvent, ctx: &mut ToolContext<'_>) -> EventPropagation {
        if Some(event.interaction) != self.interaction {
            return EventPropagation::Propagate;
        }

        let (sketch, phase) = match &event.kind {
            InteractionEventKind::SketchStart(sketch) => (sketch, DrawPhase::Start),
            InteractionEventKind::SketchChange(sketch) => (sketch, DrawPhase::Change),
            InteractionEventKind::SketchEnd(sketch) => (sketch, DrawPhase::End),
            InteractionEventKind::SketchAbort => {
                self.in_gesture = false;
                return EventPropagation::Stop;
            }
            _ => return EventPropagation::Propagate,
        };

        let Some(drawn) = self.build(sketch) else {
            return EventPropagation::Stop;
        };

        match phase {
            DrawPhase::Start => self.in_gesture = true,
            DrawPhase::Change if !self.in_gesture => return EventPropagation::Stop,
            DrawPhase::Change => {}
            DrawPhase::End if !self.in_gesture => return EventPropagation::Stop,
            DrawPhase::End => self.in_gesture = false,
        }

        self.emit(drawn, phase, ctx);
        EventPropagation::Stop
    }
}
