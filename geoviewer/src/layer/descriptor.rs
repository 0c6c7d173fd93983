use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::layer::hidpi::HidpiMode;

/// Declarative description of one map layer.
///
/// Descriptors are immutable values supplied by the application. The layer manager compares the
/// descriptors of consecutive calls by `id`: changes of the `visible`, `opacity` and `name` fields
/// and of the position in the list are applied to the existing backend layer, any change of the
/// [`LayerKind`] recreates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDescriptor {
    /// Unique and stable identifier of the layer.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Whether the layer is shown.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Opacity in percent, `0..=100`. Fully opaque if not set.
    #[serde(default)]
    pub opacity: Option<u8>,
    /// Source of the layer data.
    #[serde(flatten)]
    pub kind: LayerKind,
}

fn default_visible() -> bool {
    true
}

impl LayerDescriptor {
    /// Creates a visible descriptor without a name.
    pub fn new(id: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            visible: true,
            opacity: None,
            kind,
        }
    }

    /// Sets visibility of the layer.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Sets opacity of the layer in percent.
    pub fn with_opacity(mut self, percent: u8) -> Self {
        self.opacity = Some(percent);
        self
    }

    /// Opacity as a fraction in `0.0..=1.0` range.
    pub fn opacity_fraction(&self) -> f32 {
        opacity_fraction(self.opacity.unwrap_or(100))
    }
}

pub(crate) fn opacity_fraction(percent: u8) -> f32 {
    percent.min(100) as f32 / 100.0
}

/// Data source of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LayerKind {
    /// Raster images from an OGC WMS service.
    Wms(WmsLayerParams),
    /// Pre-rendered tiles from an OGC WMTS service.
    Wmts(WmtsLayerParams),
    /// Pre-rendered tiles addressed by a `{z}/{x}/{y}` url template.
    Xyz(XyzLayerParams),
    /// In-memory features supplied by the application.
    Vector,
    /// 3D tileset, displayed only in the 3D scene.
    Tileset3d {
        /// Url of the tileset.
        url: String,
    },
    /// Terrain elevation, displayed only in the 3D scene.
    Terrain {
        /// Url of the terrain provider.
        url: String,
    },
}

impl LayerKind {
    /// Name of the kind as used in the serialized form.
    pub fn type_name(&self) -> &'static str {
        match self {
            LayerKind::Wms(_) => "wms",
            LayerKind::Wmts(_) => "wmts",
            LayerKind::Xyz(_) => "xyz",
            LayerKind::Vector => "vector",
            LayerKind::Tileset3d { .. } => "tileset3d",
            LayerKind::Terrain { .. } => "terrain",
        }
    }

    /// Returns true for the kinds that exist only in the 3D scene.
    pub fn is_3d_only(&self) -> bool {
        matches!(self, LayerKind::Tileset3d { .. } | LayerKind::Terrain { .. })
    }
}

/// Parameters of the remote service common for all tile layers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceParams {
    /// Url of the service.
    pub url: String,
    /// CORS mode of image requests.
    pub cross_origin: Option<String>,
    /// Pixel ratio to use instead of the device one.
    pub pixel_ratio: Option<f64>,
    /// Strategy for high density displays.
    pub hidpi_mode: Option<HidpiMode>,
    /// Never request high density images from this service.
    pub hidpi_disabled: bool,
    /// Alternative source used in [`HidpiMode::SubstituteLayerShowNextZoomLevel`] mode.
    pub hidpi_substitute: Option<HidpiSubstitute>,
}

/// Alternative high density source of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HidpiSubstitute {
    /// Url of the substitute service.
    pub url: String,
    /// Layer name in the substitute service.
    pub layers: String,
}

/// Vendor of a WMS server. Determines how high density images are requested.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    /// GeoServer: `FORMAT_OPTIONS=dpi:<dpi>`.
    Geoserver,
    /// MapServer: `MAP_RESOLUTION=<dpi>`.
    Mapserver,
    /// QGIS server: `DPI=<dpi>`.
    Qgis,
    /// Carmenta server: `DPI=<dpi>`.
    Carmentaserver,
}

/// WMS layer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmsLayerParams {
    /// Service parameters.
    pub service: ServiceParams,
    /// Comma separated list of layer names.
    pub layers: String,
    /// Layers used for feature info requests.
    #[serde(default)]
    pub query_layers: Option<String>,
    /// Comma separated list of style names.
    #[serde(default)]
    pub styles: Option<String>,
    /// Image format.
    #[serde(default = "default_format")]
    pub format: String,
    /// Server vendor.
    #[serde(default)]
    pub server_type: Option<ServerType>,
    /// Request one image for the whole view instead of tiles.
    #[serde(default)]
    pub tiling_disabled: bool,
    /// Extra pixels requested around every tile.
    #[serde(default)]
    pub gutter: u32,
    /// Additional request parameters, e.g. `CQL_FILTER`.
    #[serde(default)]
    pub params: IndexMap<String, String>,
}

impl WmsLayerParams {
    /// Creates parameters for the given service url and layer names.
    pub fn new(url: impl Into<String>, layers: impl Into<String>) -> Self {
        Self {
            service: ServiceParams {
                url: url.into(),
                ..Default::default()
            },
            layers: layers.into(),
            query_layers: None,
            styles: None,
            format: default_format(),
            server_type: None,
            tiling_disabled: false,
            gutter: 0,
            params: IndexMap::new(),
        }
    }
}

/// WMTS layer parameters. The tile grid is read from the service capabilities by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmtsLayerParams {
    /// Service parameters.
    pub service: ServiceParams,
    /// Layer identifier.
    pub layer: String,
    /// Tile matrix set identifier.
    pub matrix_set: String,
    /// Style identifier.
    #[serde(default = "default_style")]
    pub style: String,
    /// Image format.
    #[serde(default = "default_format")]
    pub format: String,
    /// Tile grid of the matrix set.
    pub tile_grid: WmtsTileGrid,
}

/// Tile grid of a WMTS matrix set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmtsTileGrid {
    /// Top left corner of the grid.
    pub origin: [f64; 2],
    /// Resolutions of the matrices from the top one down.
    pub resolutions: Vec<f64>,
    /// Identifiers of the matrices, one per resolution.
    pub matrix_ids: Vec<String>,
    /// Tile size in pixels.
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
}

/// XYZ layer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XyzLayerParams {
    /// Service parameters. The url contains `{x}`, `{y}` and `{z}` placeholders.
    pub service: ServiceParams,
    /// Tile size in pixels, 256 by default.
    #[serde(default)]
    pub tile_size: Option<u32>,
    /// Most detailed zoom level, 19 by default.
    #[serde(default)]
    pub max_zoom: Option<u32>,
}

fn default_format() -> String {
    "image/png".to_string()
}

fn default_style() -> String {
    "default".to_string()
}

pub(crate) fn default_tile_size() -> u32 {
    256
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn deserialize_descriptor_list() {
        let layers: Vec<LayerDescriptor> = serde_json::from_str(
            r#"[
                {"id": "roads", "type": "wms", "opacity": 50,
                 "service": {"url": "https://maps.example.com/wms", "hidpiMode": "showNextZoomLevel"},
                 "layers": "roads", "serverType": "geoserver",
                 "params": {"CQL_FILTER": "type='highway'"}},
                {"id": "sketch", "type": "vector", "visible": false},
                {"id": "buildings", "type": "tileset3d", "url": "https://3d.example.com/tileset.json"}
            ]"#,
        )
        .unwrap();

        assert_eq!(layers.len(), 3);
        assert_matches!(&layers[0].kind, LayerKind::Wms(params) if params.format == "image/png");
        assert_eq!(layers[0].opacity_fraction(), 0.5);
        assert!(layers[0].visible);
        assert_eq!(layers[1].kind, LayerKind::Vector);
        assert!(!layers[1].visible);
        assert!(layers[2].kind.is_3d_only());
        assert_eq!(layers[2].kind.type_name(), "tileset3d");
    }
}
