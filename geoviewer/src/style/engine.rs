use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::sync::Arc;

use geoviewer_types::geo::Crs;
use geoviewer_types::measure::format_size;
use geoviewer_types::shapes::{CIRCLE_VERTICES, SCREEN_CIRCLE_VERTICES};
use geoviewer_types::wkt::WktCodec;
use geoviewer_types::{Geom, Point2d};
use quick_cache::sync::Cache;

use crate::style::descriptor::{ArrowType, PointType, StyleDescriptor};
use crate::style::icons::icon_data_url;
use crate::style::primitive::{
    DrawPrimitive, Fill, Icon, Label, Marker, PrimitiveGeometry, PrimitiveKind, RegularShape,
    ShapeOutline, Stroke,
};
use crate::Color;

const DEFAULT_STROKE_WIDTH: f64 = 1.0;
const DEFAULT_POINT_SIZE: f64 = 10.0;
const DEFAULT_LABEL_SIZE: f64 = 12.0;
const SELECTION_BUFFER: f64 = 4.0;
const SELECTION_COLOR: Color = Color::RED;
const BUFFER_OPACITY_DECREMENT: f32 = 0.2;
const CACHE_CAPACITY: usize = 1000;

/// Converts [`StyleDescriptor`]s into ordered lists of [`DrawPrimitive`]s.
///
/// Resolution is a pure function of the descriptor and the optional feature geometry. The engine
/// only carries the WKT codec used to read buffer geometries and the coordinate system of the map
/// used to measure features for labels.
///
/// The primitives are produced in the following order:
/// 1. fill and outline of the feature, if any of the colors is set;
/// 2. point marker;
/// 3. arrow heads on lines (need the feature geometry);
/// 4. label;
/// 5. selection outline, unless the style has both a marker and a label;
/// 6. fill and outline of the analysis buffer.
pub struct StyleEngine {
    codec: WktCodec,
    crs: Crs,
    cache: Cache<String, Arc<Vec<DrawPrimitive>>>,
}

impl std::fmt::Debug for StyleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleEngine")
            .field("codec", &self.codec)
            .field("crs", &self.crs)
            .finish_non_exhaustive()
    }
}

impl StyleEngine {
    /// Creates a new engine.
    pub fn new(codec: WktCodec, crs: Crs) -> Self {
        Self {
            codec,
            crs,
            cache: Cache::new(CACHE_CAPACITY),
        }
    }

    /// WKT codec of the engine.
    pub fn codec(&self) -> &WktCodec {
        &self.codec
    }

    /// Coordinate system features are expected in.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Resolves the primitives for the given style and optional feature geometry.
    pub fn resolve(
        &self,
        descriptor: &StyleDescriptor,
        feature: Option<&Geom>,
    ) -> Vec<DrawPrimitive> {
        let mut primitives = vec![];
        let z_index = descriptor.z_index;

        if let Some(kind) = self.shape(descriptor, 0.0) {
            let geometry = match feature {
                Some(geom)
                    if matches!(geom, Geom::Circle(_)) && descriptor.fill_color.is_some() =>
                {
                    PrimitiveGeometry::Geometry(geom.linearize(CIRCLE_VERTICES))
                }
                _ => PrimitiveGeometry::Feature,
            };
            primitives.push(DrawPrimitive {
                geometry,
                kind,
                z_index,
            });
        }

        let marker = self.marker(descriptor, feature);
        let has_marker = marker.is_some();
        if let Some(marker) = marker {
            primitives.push(DrawPrimitive {
                geometry: PrimitiveGeometry::Feature,
                kind: PrimitiveKind::Marker(marker),
                z_index,
            });
        }

        if let Some(feature) = feature {
            primitives.extend(self.arrows(descriptor, feature));
        }

        let label = self.label(descriptor, feature, has_marker);
        let has_label = label.is_some();
        if let Some(label) = label {
            primitives.push(DrawPrimitive {
                geometry: PrimitiveGeometry::Feature,
                kind: PrimitiveKind::Label(label),
                z_index,
            });
        }

        if descriptor.is_selected && !(has_marker && has_label) {
            let geometry = match feature.and_then(Geom::bounding_rect) {
                Some(bbox) => {
                    PrimitiveGeometry::Geometry(bbox.buffer(SELECTION_BUFFER).into_polygon().into())
                }
                None => PrimitiveGeometry::FeatureExtent {
                    buffer: SELECTION_BUFFER,
                },
            };
            primitives.push(DrawPrimitive {
                geometry,
                kind: PrimitiveKind::SelectionOutline(Stroke {
                    color: SELECTION_COLOR,
                    width: 2.0,
                    dash: Some(vec![6.0, 4.0]),
                }),
                z_index,
            });
        }

        if let Some(buffer) = &descriptor.buffer {
            match self.codec.decode(buffer) {
                Ok(geom) => {
                    if let Some(kind) = self.shape(descriptor, BUFFER_OPACITY_DECREMENT) {
                        primitives.push(DrawPrimitive {
                            geometry: PrimitiveGeometry::Geometry(
                                geom.linearize(SCREEN_CIRCLE_VERTICES),
                            ),
                            kind,
                            z_index,
                        });
                    }
                }
                Err(err) => log::warn!(
                    "Invalid buffer geometry in style {}: {err}",
                    descriptor.style_key
                ),
            }
        }

        primitives
    }

    /// Resolves the feature-independent primitives of the style, caching the result by
    /// `style_key`. Styles with empty keys are not cached.
    pub fn resolve_cached(&self, descriptor: &StyleDescriptor) -> Arc<Vec<DrawPrimitive>> {
        if descriptor.style_key.is_empty() {
            return Arc::new(self.resolve(descriptor, None));
        }

        if let Some(cached) = self.cache.get(&descriptor.style_key) {
            return cached;
        }

        let resolved = Arc::new(self.resolve(descriptor, None));
        self.cache
            .insert(descriptor.style_key.clone(), resolved.clone());
        resolved
    }

    fn shape(&self, descriptor: &StyleDescriptor, opacity_decrement: f32) -> Option<PrimitiveKind> {
        if descriptor.fill_color.is_none() && descriptor.stroke_color.is_none() {
            return None;
        }

        let fill = descriptor.fill_color.map(|color| Fill {
            color: color
                .with_opacity(reduced_opacity(descriptor.fill_opacity, opacity_decrement)),
            striped: descriptor.striped_fill,
        });
        let stroke = descriptor.stroke_color.map(|color| {
            let width = descriptor.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH);
            Stroke {
                color: color
                    .with_opacity(reduced_opacity(descriptor.stroke_opacity, opacity_decrement)),
                width,
                dash: descriptor
                    .stroke_type
                    .and_then(|stroke_type| stroke_type.dash_pattern(width)),
            }
        });

        Some(PrimitiveKind::Shape { fill, stroke })
    }

    fn marker(&self, descriptor: &StyleDescriptor, feature: Option<&Geom>) -> Option<Marker> {
        let point_type = descriptor.point_type?;
        if !point_type.has_marker() || feature.is_some_and(|f| !f.is_point_like()) {
            return None;
        }

        let size = point_size(descriptor);
        let rotation = descriptor.point_rotation.unwrap_or(0.0).to_radians();
        let fill_color = descriptor
            .point_fill_color
            .or(descriptor.fill_color)
            .unwrap_or(Color::WHITE);
        let stroke_color = descriptor
            .point_stroke_color
            .or(descriptor.stroke_color)
            .unwrap_or(Color::BLACK);

        if point_type.is_icon() {
            return icon_data_url(point_type, size, fill_color, stroke_color).map(|src| {
                Marker::Icon(Icon {
                    src,
                    size,
                    rotation,
                })
            });
        }

        let outline = match point_type {
            PointType::Square => ShapeOutline::Polygon {
                points: 4,
                angle: FRAC_PI_4,
            },
            PointType::Diamond => ShapeOutline::Polygon {
                points: 4,
                angle: 0.0,
            },
            PointType::Triangle => ShapeOutline::Polygon {
                points: 3,
                angle: FRAC_PI_2,
            },
            PointType::Star => ShapeOutline::Star {
                points: 5,
                inner_ratio: 0.5,
            },
            _ => ShapeOutline::Circle,
        };

        Some(Marker::RegularShape(RegularShape {
            outline,
            radius: size / 2.0,
            rotation,
            fill: Some(Fill {
                color: fill_color,
                striped: false,
            }),
            stroke: Some(Stroke::solid(stroke_color, DEFAULT_STROKE_WIDTH)),
        }))
    }

    fn arrows(&self, descriptor: &StyleDescriptor, feature: &Geom) -> Vec<DrawPrimitive> {
        let arrow_type = descriptor.arrow_type.unwrap_or_default();
        if arrow_type == ArrowType::None {
            return vec![];
        }

        let color = descriptor.stroke_color.unwrap_or(Color::BLACK);
        let width = descriptor.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH);
        let marker = Marker::RegularShape(RegularShape {
            outline: ShapeOutline::Polygon {
                points: 3,
                angle: 0.0,
            },
            radius: (width * 3.0).max(5.0),
            rotation: 0.0,
            fill: Some(Fill {
                color,
                striped: false,
            }),
            stroke: None,
        });

        let arrow = |position: Point2d, from: Point2d, to: Point2d| DrawPrimitive {
            geometry: PrimitiveGeometry::Feature,
            kind: PrimitiveKind::Arrow {
                marker: marker.clone(),
                position,
                rotation: (to.y - from.y).atan2(to.x - from.x),
            },
            z_index: descriptor.z_index + 1,
        };

        let mut arrows = vec![];
        for line in feature.lines() {
            if line.len() < 2 {
                continue;
            }

            let first = line[0];
            let second = line[1];
            let last = line[line.len() - 1];
            let before_last = line[line.len() - 2];

            match arrow_type {
                ArrowType::Start => arrows.push(arrow(first, second, first)),
                ArrowType::End => arrows.push(arrow(last, before_last, last)),
                ArrowType::Both => {
                    arrows.push(arrow(first, second, first));
                    arrows.push(arrow(last, before_last, last));
                }
                ArrowType::Along => {
                    for segment in line.windows(2) {
                        let middle = Point2d::from((segment[0].coords + segment[1].coords) / 2.0);
                        arrows.push(arrow(middle, segment[0], segment[1]));
                    }
                }
                ArrowType::None => {}
            }
        }

        arrows
    }

    fn label(
        &self,
        descriptor: &StyleDescriptor,
        feature: Option<&Geom>,
        has_marker: bool,
    ) -> Option<Label> {
        let text = descriptor.label.as_ref()?;
        let size = descriptor.label_size.unwrap_or(DEFAULT_LABEL_SIZE);

        let text = match feature {
            Some(feature) => self.substitute_placeholders(text, feature),
            None => text.clone(),
        };

        let mut font = String::new();
        if descriptor.label_italic {
            font.push_str("italic ");
        }
        if descriptor.label_bold {
            font.push_str("bold ");
        }
        font.push_str("12px sans-serif");

        let offset_y = if has_marker {
            -(point_size(descriptor) / 2.0 + size / 2.0 + 2.0)
        } else {
            0.0
        };

        Some(Label {
            text,
            font,
            scale: size / DEFAULT_LABEL_SIZE,
            color: descriptor.label_color.unwrap_or(Color::BLACK),
            halo: Some(Stroke::solid(Color::WHITE, 3.0)),
            offset_y,
        })
    }

    fn substitute_placeholders(&self, text: &str, feature: &Geom) -> String {
        if !text.contains('{') {
            return text.to_string();
        }

        let mut vars = HashMap::new();
        if let Some(anchor) = feature.anchor_point() {
            vars.insert("coordinates".to_string(), format_coordinates(&anchor, &self.crs));
        }
        vars.insert(
            "size".to_string(),
            format_size(feature, &self.crs).unwrap_or_default(),
        );

        match strfmt::strfmt(text, &vars) {
            Ok(text) => text,
            Err(err) => {
                log::debug!("Label '{text}' placeholders are not substituted: {err}");
                text.to_string()
            }
        }
    }
}

fn point_size(descriptor: &StyleDescriptor) -> f64 {
    descriptor.point_size.unwrap_or(DEFAULT_POINT_SIZE)
}

fn reduced_opacity(opacity: Option<f32>, decrement: f32) -> f32 {
    (opacity.unwrap_or(1.0) - decrement).max(0.0)
}

fn format_coordinates(point: &Point2d, crs: &Crs) -> String {
    if crs.is_geographic() {
        format!("{:.6}, {:.6}", point.x, point.y)
    } else {
        format!("{:.2}, {:.2}", point.x, point.y)
    }
}
