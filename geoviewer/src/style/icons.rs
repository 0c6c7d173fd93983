//! Vector icons for marker shapes that cannot be drawn as regular shapes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::style::descriptor::PointType;
use crate::Color;

const SVG_DATA_PREFIX: &str = "data:image/svg+xml;base64,";

/// Returns the `data:` url of the SVG icon for the point type, or `None` if the type is not drawn
/// as an icon.
pub(crate) fn icon_data_url(
    point_type: PointType,
    size: f64,
    fill: Color,
    stroke: Color,
) -> Option<String> {
    let svg = icon_svg(point_type, size, fill, stroke)?;
    Some(format!("{SVG_DATA_PREFIX}{}", STANDARD.encode(svg)))
}

fn icon_svg(point_type: PointType, size: f64, fill: Color, stroke: Color) -> Option<String> {
    let fill = fill.to_css();
    let stroke = stroke.to_css();

    let body = match point_type {
        PointType::Cross => format!(
            r#"<path d="M4 4L28 28M28 4L4 28" stroke="{fill}" stroke-width="6" stroke-linecap="round"/><path d="M4 4L28 28M28 4L4 28" stroke="{stroke}" stroke-width="2" stroke-linecap="round"/>"#
        ),
        PointType::Arrow => format!(
            r#"<path d="M16 2L28 16H21V30H11V16H4Z" fill="{fill}" stroke="{stroke}" stroke-width="2" stroke-linejoin="round"/>"#
        ),
        PointType::GradientDiamond => format!(
            r#"<defs><linearGradient id="g" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="{fill}"/><stop offset="1" stop-color="{stroke}"/></linearGradient></defs><path d="M16 1L31 16L16 31L1 16Z" fill="url(#g)" stroke="{stroke}" stroke-width="1"/>"#
        ),
        PointType::Orientation => format!(
            r#"<circle cx="16" cy="20" r="6" fill="{fill}" stroke="{stroke}" stroke-width="2"/><path d="M16 1L23 13H9Z" fill="{stroke}"/>"#
        ),
        _ => return None,
    };

    Some(format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 32 32">{body}</svg>"#
    ))
}
