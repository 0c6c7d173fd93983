use indexmap::IndexMap;
use url::form_urlencoded;
use url::Url;

use geoviewer_types::geo::Crs;
use geoviewer_types::Rect;

use crate::error::GeoViewerError;
use crate::layer::descriptor::ServerType;
use crate::tile_schema::{TileIndex, TileSchema};

/// Requests with urls longer than this are sent as POST.
pub const MAX_GET_URL_LENGTH: usize = 4096;

/// Parameters moved into the body of POST requests.
const POST_BODY_PARAMS: &[&str] = &["CQL_FILTER"];

/// Tile size of the grid used for tiled WMS delivery.
pub const WMS_TILE_SIZE: u32 = 512;

/// Number of levels in the grid used for tiled WMS delivery.
pub const WMS_GRID_LEVELS: u32 = 22;

/// DPI of a standard resolution image as assumed by the servers.
const BASE_DPI: f64 = 90.0;

/// Content type of POST request bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// GetMap request.
#[derive(Debug, Clone, PartialEq)]
pub enum WmsRequest {
    /// All parameters are in the url.
    Get {
        /// Request url.
        url: String,
    },
    /// Long parameters are sent as a form-encoded body.
    Post {
        /// Request url with the remaining parameters.
        url: String,
        /// Form-encoded body, see [`FORM_CONTENT_TYPE`].
        body: String,
    },
}

impl WmsRequest {
    /// Url of the request.
    pub fn url(&self) -> &str {
        match self {
            WmsRequest::Get { url } | WmsRequest::Post { url, .. } => url,
        }
    }
}

/// Way images are requested from a WMS service.
#[derive(Debug, Clone, PartialEq)]
pub enum WmsDelivery {
    /// One image covering the whole view.
    Image,
    /// Tiles of a fixed grid.
    Tiled {
        /// Grid of the tiles.
        schema: TileSchema,
        /// Extra pixels requested around every tile.
        gutter: u32,
    },
}

/// WMS image source.
#[derive(Debug, Clone, PartialEq)]
pub struct WmsSource {
    url: String,
    params: IndexMap<String, String>,
    crs: Crs,
    server_type: Option<ServerType>,
    pixel_ratio: f64,
    cross_origin: Option<String>,
    delivery: WmsDelivery,
}

impl WmsSource {
    /// Creates a source requesting `layers` from the service at `url`.
    pub fn new(url: impl Into<String>, layers: impl Into<String>, crs: Crs) -> Self {
        let mut params = IndexMap::new();
        params.insert("LAYERS".to_string(), layers.into());
        params.insert("STYLES".to_string(), String::new());
        params.insert("FORMAT".to_string(), "image/png".to_string());
        params.insert("TRANSPARENT".to_string(), "TRUE".to_string());

        Self {
            url: url.into(),
            params,
            crs,
            server_type: None,
            pixel_ratio: 1.0,
            cross_origin: None,
            delivery: WmsDelivery::Image,
        }
    }

    /// Sets the server vendor.
    pub fn with_server_type(mut self, server_type: Option<ServerType>) -> Self {
        self.server_type = server_type;
        self
    }

    /// Sets the pixel ratio of requested images.
    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    /// Sets the CORS mode.
    pub fn with_cross_origin(mut self, cross_origin: Option<String>) -> Self {
        self.cross_origin = cross_origin;
        self
    }

    /// Sets the delivery mode.
    pub fn with_delivery(mut self, delivery: WmsDelivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Sets a request parameter. Parameter names are case-insensitive and stored upper-cased.
    pub fn set_param(&mut self, name: &str, value: impl Into<String>) {
        self.params.insert(name.to_ascii_uppercase(), value.into());
    }

    /// Value of a request parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(&name.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// Service url.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Delivery mode.
    pub fn delivery(&self) -> &WmsDelivery {
        &self.delivery
    }

    /// Pixel ratio of requested images.
    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// CORS mode.
    pub fn cross_origin(&self) -> Option<&str> {
        self.cross_origin.as_deref()
    }

    /// Builds a GetMap request of an image covering `bbox` with the given size in pixels.
    ///
    /// If the resulting url is longer than [`MAX_GET_URL_LENGTH`], feature filter parameters are
    /// moved into the body of a POST request.
    pub fn request(&self, bbox: Rect, width: u32, height: u32) -> Result<WmsRequest, GeoViewerError> {
        let params = self.request_params(bbox, width, height);
        let url = build_url(&self.url, params.iter())?;
        if url.len() <= MAX_GET_URL_LENGTH {
            return Ok(WmsRequest::Get { url });
        }

        let (body_params, url_params): (Vec<_>, Vec<_>) = params
            .iter()
            .partition(|(name, _)| POST_BODY_PARAMS.contains(&name.as_str()));

        if body_params.is_empty() {
            log::debug!(
                "WMS request url is {} characters long, but has no parameters to move to a POST body",
                url.len()
            );
            return Ok(WmsRequest::Get { url });
        }

        log::debug!("WMS request url is {} characters long, using POST", url.len());
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(body_params)
            .finish();

        Ok(WmsRequest::Post {
            url: build_url(&self.url, url_params.into_iter())?,
            body,
        })
    }

    /// Builds a GetMap request for the tile of the tiled delivery grid. Returns `None` for image
    /// delivery or tiles outside of the grid.
    ///
    /// The requested area is extended by the gutter on every side.
    pub fn tile_request(&self, index: TileIndex) -> Option<Result<WmsRequest, GeoViewerError>> {
        let WmsDelivery::Tiled { schema, gutter } = &self.delivery else {
            return None;
        };

        let resolution = schema.lod_resolution(index.z)?;
        let bbox = schema
            .tile_bbox(index)?
            .buffer(*gutter as f64 * resolution);
        let width = ((schema.tile_width() + 2 * gutter) as f64 * self.pixel_ratio).round() as u32;
        let height =
            ((schema.tile_height() + 2 * gutter) as f64 * self.pixel_ratio).round() as u32;

        Some(self.request(bbox, width, height))
    }

    fn request_params(&self, bbox: Rect, width: u32, height: u32) -> IndexMap<String, String> {
        let mut params = IndexMap::new();
        params.insert("SERVICE".to_string(), "WMS".to_string());
        params.insert("VERSION".to_string(), "1.3.0".to_string());
        params.insert("REQUEST".to_string(), "GetMap".to_string());
        for (name, value) in &self.params {
            params.insert(name.clone(), value.clone());
        }

        if self.pixel_ratio != 1.0 {
            self.add_dpi_params(&mut params);
        }

        params.insert("CRS".to_string(), self.crs.code().to_string());
        params.insert("WIDTH".to_string(), width.to_string());
        params.insert("HEIGHT".to_string(), height.to_string());

        // WMS 1.3.0 uses latitude first for geographic coordinates
        let bbox_value = if self.crs.is_geographic() {
            [bbox.y_min(), bbox.x_min(), bbox.y_max(), bbox.x_max()]
        } else {
            [bbox.x_min(), bbox.y_min(), bbox.x_max(), bbox.y_max()]
        };
        params.insert(
            "BBOX".to_string(),
            bbox_value
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(","),
        );

        params
    }

    fn add_dpi_params(&self, params: &mut IndexMap<String, String>) {
        let dpi = (BASE_DPI * self.pixel_ratio).round();
        match self.server_type {
            Some(ServerType::Geoserver) => {
                let options = match params.get("FORMAT_OPTIONS") {
                    Some(existing) if !existing.is_empty() => format!("{existing};dpi:{dpi}"),
                    _ => format!("dpi:{dpi}"),
                };
                params.insert("FORMAT_OPTIONS".to_string(), options);
            }
            Some(ServerType::Mapserver) => {
                params.insert("MAP_RESOLUTION".to_string(), dpi.to_string());
            }
            Some(ServerType::Qgis) | Some(ServerType::Carmentaserver) => {
                params.insert("DPI".to_string(), dpi.to_string());
            }
            None => {}
        }
    }
}

fn build_url<'a>(
    base: &str,
    params: impl Iterator<Item = (&'a String, &'a String)>,
) -> Result<String, GeoViewerError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut().extend_pairs(params);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn source() -> WmsSource {
        WmsSource::new("https://maps.example.com/wms?map=base", "roads", Crs::EPSG3857)
    }

    fn query(url: &str) -> Vec<(String, String)> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn get_map_url() {
        let request = source()
            .request(Rect::new(0.0, 0.0, 100.0, 50.0), 256, 128)
            .unwrap();
        let WmsRequest::Get { url } = request else {
            panic!("short requests must use GET");
        };

        let params = query(&url);
        assert_eq!(params[0], ("map".to_string(), "base".to_string()));
        assert!(params.contains(&("REQUEST".to_string(), "GetMap".to_string())));
        assert!(params.contains(&("LAYERS".to_string(), "roads".to_string())));
        assert!(params.contains(&("BBOX".to_string(), "0,0,100,50".to_string())));
        assert!(params.contains(&("WIDTH".to_string(), "256".to_string())));
        assert!(params.contains(&("CRS".to_string(), "EPSG:3857".to_string())));
    }

    #[test]
    fn geographic_bbox_is_lat_first() {
        let source = WmsSource::new("https://maps.example.com/wms", "roads", Crs::EPSG4326);
        let request = source
            .request(Rect::new(10.0, 50.0, 11.0, 51.0), 256, 256)
            .unwrap();
        assert!(query(request.url()).contains(&("BBOX".to_string(), "50,10,51,11".to_string())));
    }

    #[test]
    fn long_filter_is_posted() {
        let mut source = source();
        let filter = format!("name IN ({})", vec!["'feature'"; 600].join(","));
        source.set_param("cql_filter", filter.clone());

        let request = source
            .request(Rect::new(0.0, 0.0, 100.0, 100.0), 256, 256)
            .unwrap();
        let WmsRequest::Post { url, body } = request else {
            panic!("long requests must use POST");
        };

        assert!(url.len() <= MAX_GET_URL_LENGTH);
        assert!(!url.contains("CQL_FILTER"));
        assert!(url.contains("LAYERS=roads"));

        let body_params: Vec<(String, String)> = form_urlencoded::parse(body.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(body_params, vec![("CQL_FILTER".to_string(), filter)]);
    }

    #[test]
    fn long_url_without_filter_stays_get() {
        let mut source = source();
        source.set_param("LAYERS", "x".repeat(5000));
        let request = source
            .request(Rect::new(0.0, 0.0, 1.0, 1.0), 256, 256)
            .unwrap();
        assert_matches!(request, WmsRequest::Get { .. });
    }

    #[test]
    fn dpi_params_by_server_type() {
        let bbox = Rect::new(0.0, 0.0, 1.0, 1.0);

        let geoserver = source()
            .with_server_type(Some(ServerType::Geoserver))
            .with_pixel_ratio(2.0);
        assert!(query(geoserver.request(bbox, 512, 512).unwrap().url())
            .contains(&("FORMAT_OPTIONS".to_string(), "dpi:180".to_string())));

        let mapserver = source()
            .with_server_type(Some(ServerType::Mapserver))
            .with_pixel_ratio(2.0);
        assert!(query(mapserver.request(bbox, 512, 512).unwrap().url())
            .contains(&("MAP_RESOLUTION".to_string(), "180".to_string())));

        let qgis = source()
            .with_server_type(Some(ServerType::Qgis))
            .with_pixel_ratio(1.5);
        assert!(query(qgis.request(bbox, 512, 512).unwrap().url())
            .contains(&("DPI".to_string(), "135".to_string())));

        let standard = source().with_server_type(Some(ServerType::Qgis));
        assert!(!standard
            .request(bbox, 512, 512)
            .unwrap()
            .url()
            .contains("DPI"));
    }

    #[test]
    fn tile_request_with_gutter() {
        let schema = TileSchema::for_extent(
            Rect::new(0.0, 0.0, 5120.0, 5120.0),
            WMS_TILE_SIZE,
            3,
            Crs::EPSG3857,
        );
        let tiled = source().with_delivery(WmsDelivery::Tiled { schema, gutter: 16 });

        let request = tiled.tile_request(TileIndex::new(0, 0, 0)).unwrap().unwrap();
        let params = query(request.url());
        assert!(params.contains(&("WIDTH".to_string(), "544".to_string())));
        assert!(params.contains(&("BBOX".to_string(), "-160,-160,5280,5280".to_string())));

        assert!(source().tile_request(TileIndex::new(0, 0, 0)).is_none());
    }

    #[test]
    fn invalid_url() {
        let source = WmsSource::new("not a url", "roads", Crs::EPSG3857);
        assert_matches!(
            source.request(Rect::new(0.0, 0.0, 1.0, 1.0), 1, 1),
            Err(GeoViewerError::Url(_))
        );
    }
}
