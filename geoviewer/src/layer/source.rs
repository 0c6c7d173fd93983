use indexmap::IndexMap;
use url::Url;

use geoviewer_types::geo::Crs;
use geoviewer_types::{Point2d, Rect};

use crate::error::GeoViewerError;
use crate::layer::descriptor::{
    default_tile_size, LayerKind, WmsLayerParams, WmtsLayerParams, XyzLayerParams,
};
use crate::layer::hidpi::HidpiPolicy;
use crate::layer::wms::{WmsDelivery, WmsSource, WMS_GRID_LEVELS, WMS_TILE_SIZE};
use crate::tile_schema::{TileIndex, TileSchema};

const DEFAULT_MAX_ZOOM: u32 = 19;

/// Viewer-wide parameters used to construct layer sources.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceContext {
    /// Coordinate system of the map.
    pub crs: Crs,
    /// Extent of the map projection.
    pub extent: Rect,
    /// Pixel ratio of the screen.
    pub device_pixel_ratio: f64,
    /// Never request high density images.
    pub hidpi_disabled: bool,
}

/// Source of a backend layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSource {
    /// Remote images.
    Tile(TileSource),
    /// In-memory features pushed with
    /// [`LayerBackend::set_features`](crate::layer::LayerBackend::set_features).
    Vector,
}

/// Remote image source.
#[derive(Debug, Clone, PartialEq)]
pub enum TileSource {
    /// OGC WMS.
    Wms(WmsSource),
    /// OGC WMTS.
    Wmts(WmtsSource),
    /// `{z}/{x}/{y}` url template.
    Xyz(XyzSource),
}

impl TileSource {
    /// Sets an extra request parameter.
    pub fn set_param(&mut self, name: &str, value: impl Into<String>) {
        match self {
            TileSource::Wms(source) => source.set_param(name, value),
            TileSource::Wmts(source) => {
                source.params.insert(name.to_string(), value.into());
            }
            TileSource::Xyz(source) => {
                source.params.insert(name.to_string(), value.into());
            }
        }
    }

    /// Value of an extra request parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        match self {
            TileSource::Wms(source) => source.param(name),
            TileSource::Wmts(source) => source.params.get(name).map(String::as_str),
            TileSource::Xyz(source) => source.params.get(name).map(String::as_str),
        }
    }

    /// Tile grid of the source, `None` for single image WMS.
    pub fn tile_schema(&self) -> Option<&TileSchema> {
        match self {
            TileSource::Wms(source) => match source.delivery() {
                WmsDelivery::Tiled { schema, .. } => Some(schema),
                WmsDelivery::Image => None,
            },
            TileSource::Wmts(source) => Some(&source.schema),
            TileSource::Xyz(source) => Some(&source.schema),
        }
    }
}

/// WMTS tile source using KVP `GetTile` requests, or a REST template if the url contains
/// `{TileMatrix}`.
#[derive(Debug, Clone, PartialEq)]
pub struct WmtsSource {
    url: String,
    layer: String,
    matrix_set: String,
    style: String,
    format: String,
    matrix_ids: Vec<String>,
    schema: TileSchema,
    pixel_ratio: f64,
    params: IndexMap<String, String>,
}

impl WmtsSource {
    /// Tile grid.
    pub fn schema(&self) -> &TileSchema {
        &self.schema
    }

    /// Pixel ratio of requested tiles.
    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Url of the tile.
    pub fn tile_url(&self, index: TileIndex) -> Result<String, GeoViewerError> {
        let matrix = self
            .matrix_ids
            .get(index.z as usize)
            .ok_or(GeoViewerError::NotFound)?;

        if self.url.contains("{TileMatrix}") {
            let url = self
                .url
                .replace("{TileMatrixSet}", &self.matrix_set)
                .replace("{TileMatrix}", matrix)
                .replace("{TileRow}", &index.y.to_string())
                .replace("{TileCol}", &index.x.to_string())
                .replace("{Style}", &self.style)
                .replace("{Layer}", &self.layer);
            let mut url = Url::parse(&url)?;
            if !self.params.is_empty() {
                url.query_pairs_mut().extend_pairs(self.params.iter());
            }
            return Ok(url.into());
        }

        let mut url = Url::parse(&self.url)?;
        url.query_pairs_mut()
            .append_pair("SERVICE", "WMTS")
            .append_pair("REQUEST", "GetTile")
            .append_pair("VERSION", "1.0.0")
            .append_pair("LAYER", &self.layer)
            .append_pair("STYLE", &self.style)
            .append_pair("FORMAT", &self.format)
            .append_pair("TILEMATRIXSET", &self.matrix_set)
            .append_pair("TILEMATRIX", matrix)
            .append_pair("TILEROW", &index.y.to_string())
            .append_pair("TILECOL", &index.x.to_string())
            .extend_pairs(self.params.iter());
        Ok(url.into())
    }
}

/// Tile source addressed by a `{z}/{x}/{y}` url template.
#[derive(Debug, Clone, PartialEq)]
pub struct XyzSource {
    url_template: String,
    schema: TileSchema,
    pixel_ratio: f64,
    params: IndexMap<String, String>,
}

impl XyzSource {
    /// Tile grid.
    pub fn schema(&self) -> &TileSchema {
        &self.schema
    }

    /// Pixel ratio of requested tiles.
    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Url of the tile.
    pub fn tile_url(&self, index: TileIndex) -> Result<String, GeoViewerError> {
        let url = self
            .url_template
            .replace("{z}", &index.z.to_string())
            .replace("{x}", &index.x.to_string())
            .replace("{y}", &index.y.to_string());

        if self.params.is_empty() {
            return Ok(url);
        }

        let mut url = Url::parse(&url)?;
        url.query_pairs_mut().extend_pairs(self.params.iter());
        Ok(url.into())
    }
}

impl LayerSource {
    /// Constructs the source of a 2D layer. Returns `None` for the kinds that are not displayed in
    /// 2D.
    pub fn from_kind(
        kind: &LayerKind,
        context: &SourceContext,
    ) -> Result<Option<Self>, GeoViewerError> {
        let source = match kind {
            LayerKind::Wms(params) => Self::Tile(TileSource::Wms(wms_source(params, context)?)),
            LayerKind::Wmts(params) => Self::Tile(TileSource::Wmts(wmts_source(params, context)?)),
            LayerKind::Xyz(params) => Self::Tile(TileSource::Xyz(xyz_source(params, context)?)),
            LayerKind::Vector => Self::Vector,
            LayerKind::Tileset3d { .. } | LayerKind::Terrain { .. } => return Ok(None),
        };

        Ok(Some(source))
    }
}

fn wms_source(params: &WmsLayerParams, context: &SourceContext) -> Result<WmsSource, GeoViewerError> {
    let policy = HidpiPolicy::resolve(
        &params.service,
        context.device_pixel_ratio,
        context.hidpi_disabled,
    );

    let (url, layers) = match (&policy, &params.service.hidpi_substitute) {
        (Some(policy), Some(substitute)) if policy.substitutes_source() => {
            (substitute.url.as_str(), substitute.layers.as_str())
        }
        _ => (params.service.url.as_str(), params.layers.as_str()),
    };
    Url::parse(url)?;

    let delivery = if params.tiling_disabled {
        WmsDelivery::Image
    } else {
        let schema = TileSchema::for_extent(
            context.extent,
            WMS_TILE_SIZE,
            WMS_GRID_LEVELS,
            context.crs.clone(),
        );
        WmsDelivery::Tiled {
            schema: apply_policy(policy.as_ref(), schema),
            gutter: params.gutter,
        }
    };

    let mut source = WmsSource::new(url, layers, context.crs.clone())
        .with_server_type(params.server_type)
        .with_pixel_ratio(pixel_ratio(policy.as_ref()))
        .with_cross_origin(params.service.cross_origin.clone())
        .with_delivery(delivery);

    source.set_param("FORMAT", params.format.clone());
    if let Some(styles) = &params.styles {
        source.set_param("STYLES", styles.clone());
    }
    if let Some(query_layers) = &params.query_layers {
        source.set_param("QUERY_LAYERS", query_layers.clone());
    }
    for (name, value) in &params.params {
        source.set_param(name, value.clone());
    }

    Ok(source)
}

fn wmts_source(
    params: &WmtsLayerParams,
    context: &SourceContext,
) -> Result<WmtsSource, GeoViewerError> {
    let policy = HidpiPolicy::resolve(
        &params.service,
        context.device_pixel_ratio,
        context.hidpi_disabled,
    );

    let (url, layer) = match (&policy, &params.service.hidpi_substitute) {
        (Some(policy), Some(substitute)) if policy.substitutes_source() => {
            (substitute.url.clone(), substitute.layers.clone())
        }
        _ => (params.service.url.clone(), params.layer.clone()),
    };

    let grid = &params.tile_grid;
    if grid.matrix_ids.len() != grid.resolutions.len() {
        return Err(GeoViewerError::Construction(format!(
            "WMTS layer {layer}: {} matrix ids for {} resolutions",
            grid.matrix_ids.len(),
            grid.resolutions.len()
        )));
    }

    let schema = TileSchema::with_resolutions(
        Point2d::new(grid.origin[0], grid.origin[1]),
        context.extent,
        &grid.resolutions,
        grid.tile_size,
        context.crs.clone(),
    );

    Ok(WmtsSource {
        url,
        layer,
        matrix_set: params.matrix_set.clone(),
        style: params.style.clone(),
        format: params.format.clone(),
        matrix_ids: grid.matrix_ids.clone(),
        schema: apply_policy(policy.as_ref(), schema),
        pixel_ratio: pixel_ratio(policy.as_ref()),
        params: IndexMap::new(),
    })
}

fn xyz_source(params: &XyzLayerParams, context: &SourceContext) -> Result<XyzSource, GeoViewerError> {
    let policy = HidpiPolicy::resolve(
        &params.service,
        context.device_pixel_ratio,
        context.hidpi_disabled,
    );

    let url_template = match (&policy, &params.service.hidpi_substitute) {
        (Some(policy), Some(substitute)) if policy.substitutes_source() => substitute.url.clone(),
        _ => params.service.url.clone(),
    };

    if !url_template.contains("{z}") {
        return Err(GeoViewerError::Construction(format!(
            "XYZ url template {url_template} has no {{z}} placeholder"
        )));
    }

    let schema = TileSchema::for_extent(
        context.extent,
        params.tile_size.unwrap_or_else(default_tile_size),
        params.max_zoom.unwrap_or(DEFAULT_MAX_ZOOM) + 1,
        context.crs.clone(),
    );

    Ok(XyzSource {
        url_template,
        schema: apply_policy(policy.as_ref(), schema),
        pixel_ratio: pixel_ratio(policy.as_ref()),
        params: IndexMap::new(),
    })
}

fn apply_policy(policy: Option<&HidpiPolicy>, schema: TileSchema) -> TileSchema {
    match policy {
        Some(policy) => policy.apply(schema),
        None => schema,
    }
}

fn pixel_ratio(policy: Option<&HidpiPolicy>) -> f64 {
    policy.map(HidpiPolicy::tile_pixel_ratio).unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::layer::descriptor::{HidpiSubstitute, ServiceParams, WmtsTileGrid};
    use crate::layer::hidpi::HidpiMode;

    fn context(device_pixel_ratio: f64) -> SourceContext {
        SourceContext {
            crs: Crs::EPSG3857,
            extent: TileSchema::web(1).bounds,
            device_pixel_ratio,
            hidpi_disabled: false,
        }
    }

    fn wmts_params() -> WmtsLayerParams {
        WmtsLayerParams {
            service: ServiceParams {
                url: "https://tiles.example.com/wmts".into(),
                hidpi_mode: Some(HidpiMode::ShowNextZoomLevel),
                ..Default::default()
            },
            layer: "ortho".into(),
            matrix_set: "google".into(),
            style: "default".into(),
            format: "image/jpeg".into(),
            tile_grid: WmtsTileGrid {
                origin: [-20037508.342787, 20037508.342787],
                resolutions: vec![156543.03392800014, 78271.51696400007],
                matrix_ids: vec!["0".into(), "1".into()],
                tile_size: 256,
            },
        }
    }

    #[test]
    fn next_zoom_level_for_wmts() {
        let Some(LayerSource::Tile(TileSource::Wmts(source))) =
            LayerSource::from_kind(&LayerKind::Wmts(wmts_params()), &context(2.0)).unwrap()
        else {
            panic!("expected WMTS source");
        };

        assert_eq!(source.schema().tile_width(), 128);
        assert_eq!(
            source.schema().resolutions(),
            vec![2.0 * 156543.03392800014, 2.0 * 78271.51696400007]
        );
        assert_eq!(source.pixel_ratio(), 1.0);

        let url = source.tile_url(TileIndex::new(3, 2, 1)).unwrap();
        assert!(url.contains("TILEMATRIX=1&TILEROW=2&TILECOL=3"));
    }

    #[test]
    fn low_density_keeps_grid() {
        let Some(LayerSource::Tile(source)) =
            LayerSource::from_kind(&LayerKind::Wmts(wmts_params()), &context(1.0)).unwrap()
        else {
            panic!("expected tile source");
        };
        assert_eq!(source.tile_schema().unwrap().tile_width(), 256);
    }

    #[test]
    fn wmts_rest_template() {
        let mut params = wmts_params();
        params.service.url =
            "https://tiles.example.com/{Layer}/{TileMatrixSet}/{TileMatrix}/{TileRow}/{TileCol}.jpg"
                .into();
        let Some(LayerSource::Tile(mut source)) =
            LayerSource::from_kind(&LayerKind::Wmts(params), &context(1.0)).unwrap()
        else {
            panic!("expected tile source");
        };
        source.set_param("_cb", "1");

        let TileSource::Wmts(source) = source else {
            panic!("expected WMTS source");
        };
        assert_eq!(
            source.tile_url(TileIndex::new(3, 2, 1)).unwrap(),
            "https://tiles.example.com/ortho/google/1/2/3.jpg?_cb=1"
        );
        assert_matches!(
            source.tile_url(TileIndex::new(0, 0, 5)),
            Err(GeoViewerError::NotFound)
        );
    }

    #[test]
    fn substitute_source_for_wms() {
        let mut params = WmsLayerParams::new("https://maps.example.com/wms", "roads");
        params.service.hidpi_mode = Some(HidpiMode::SubstituteLayerShowNextZoomLevel);
        params.service.hidpi_substitute = Some(HidpiSubstitute {
            url: "https://hidpi.example.com/wms".into(),
            layers: "roads_hd".into(),
        });

        let Some(LayerSource::Tile(TileSource::Wms(source))) =
            LayerSource::from_kind(&LayerKind::Wms(params), &context(2.0)).unwrap()
        else {
            panic!("expected WMS source");
        };

        assert_eq!(source.url(), "https://hidpi.example.com/wms");
        assert_eq!(source.param("layers"), Some("roads_hd"));
        let WmsDelivery::Tiled { schema, .. } = source.delivery() else {
            panic!("tiling is enabled by default");
        };
        assert_eq!(schema.tile_width(), WMS_TILE_SIZE / 2);
    }

    #[test]
    fn wms_image_delivery_with_pixel_ratio() {
        let mut params = WmsLayerParams::new("https://maps.example.com/wms", "roads");
        params.tiling_disabled = true;
        params.params.insert("cql_filter".into(), "a=1".into());

        let Some(LayerSource::Tile(TileSource::Wms(source))) =
            LayerSource::from_kind(&LayerKind::Wms(params), &context(2.0)).unwrap()
        else {
            panic!("expected WMS source");
        };
        assert_eq!(source.delivery(), &WmsDelivery::Image);
        assert_eq!(source.pixel_ratio(), 2.0);
        assert_eq!(source.param("CQL_FILTER"), Some("a=1"));
    }

    #[test]
    fn xyz_url() {
        let kind = LayerKind::Xyz(XyzLayerParams {
            service: ServiceParams {
                url: "https://tile.example.com/{z}/{x}/{y}.png".into(),
                ..Default::default()
            },
            tile_size: None,
            max_zoom: Some(5),
        });
        let Some(LayerSource::Tile(mut source)) =
            LayerSource::from_kind(&kind, &context(1.0)).unwrap()
        else {
            panic!("expected tile source");
        };
        assert_eq!(source.tile_schema().unwrap().lods.len(), 6);

        source.set_param("_cb", "7");
        let TileSource::Xyz(source) = source else {
            panic!("expected XYZ source");
        };
        assert_eq!(
            source.tile_url(TileIndex::new(1, 2, 3)).unwrap(),
            "https://tile.example.com/3/1/2.png?_cb=7"
        );
    }

    #[test]
    fn invalid_sources() {
        let kind = LayerKind::Xyz(XyzLayerParams {
            service: ServiceParams {
                url: "https://tile.example.com/tile.png".into(),
                ..Default::default()
            },
            tile_size: None,
            max_zoom: None,
        });
        assert_matches!(
            LayerSource::from_kind(&kind, &context(1.0)),
            Err(GeoViewerError::Construction(_))
        );

        let kind = LayerKind::Wms(WmsLayerParams::new("::", "roads"));
        assert_matches!(
            LayerSource::from_kind(&kind, &context(1.0)),
            Err(GeoViewerError::Url(_))
        );

        let kind = LayerKind::Terrain {
            url: "https://terrain.example.com".into(),
        };
        assert_eq!(LayerSource::from_kind(&kind, &context(1.0)).unwrap(), None);
    }
}
