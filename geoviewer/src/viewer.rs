//! Composition root of the engine.

use std::sync::Arc;

use geoviewer_types::geo::{Crs, ProjectionType};
use geoviewer_types::wkt::WktCodec;
use geoviewer_types::{Geom, Rect};
use serde::{Deserialize, Serialize};

use crate::error::GeoViewerError;
use crate::layer::{LayerBackend, LayerDescriptor, LayerManager, SourceContext};
use crate::messenger::{DummyMessenger, Messenger};
use crate::scene::{SceneBackend, SceneSynchronizer};
use crate::scheduler::{RuntimeScheduler, Scheduler};
use crate::style::{DrawPrimitive, StyleDescriptor, StyleEngine};
use crate::tool::{InteractionBackend, ToolManager};

const WEB_MERCATOR_HALF_WIDTH: f64 = 20037508.342787;

/// Coordinate system of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionConfig {
    /// Code of the coordinate system, e.g. `EPSG:3857`.
    pub code: String,
    /// Extent of the projection as `[x_min, y_min, x_max, y_max]`. Required for custom
    /// projections.
    #[serde(default)]
    pub extent: Option<[f64; 4]>,
    /// Projection definition for codes that are not built in.
    #[serde(default)]
    pub definition: Option<String>,
}

/// Configuration of a [`MapViewer`].
///
/// ```
/// use geoviewer::viewer::ViewerConfig;
///
/// let config = ViewerConfig::from_json(r#"{"projection": {"code": "EPSG:3857"}}"#).unwrap();
/// assert_eq!(config.device_pixel_ratio, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Coordinate system of the map.
    pub projection: ProjectionConfig,
    /// Pixel ratio of the screen.
    #[serde(default = "default_pixel_ratio")]
    pub device_pixel_ratio: f64,
    /// Never request high density images.
    #[serde(default)]
    pub hidpi_disabled: bool,
    /// Number of decimals in WKT written by the engine. Shortest exact representation if not set.
    #[serde(default)]
    pub wkt_precision: Option<u32>,
}

fn default_pixel_ratio() -> f64 {
    1.0
}

impl ViewerConfig {
    /// Configuration for the map in the given coordinate system with default settings.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            projection: ProjectionConfig {
                code: code.into(),
                extent: None,
                definition: None,
            },
            device_pixel_ratio: default_pixel_ratio(),
            hidpi_disabled: false,
            wkt_precision: None,
        }
    }

    /// Reads configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, GeoViewerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Coordinate system of the map.
    pub fn crs(&self) -> Result<Crs, GeoViewerError> {
        let projection = &self.projection;
        match &projection.definition {
            Some(definition) => Ok(Crs::custom(projection.code.clone(), definition.clone())),
            None => Ok(Crs::from_code(&projection.code)?),
        }
    }

    /// Extent of the projection: the configured one, or the world extent of built-in projections.
    pub fn extent(&self, crs: &Crs) -> Result<Rect, GeoViewerError> {
        if let Some([x_min, y_min, x_max, y_max]) = self.projection.extent {
            return Ok(Rect::new(x_min, y_min, x_max, y_max));
        }

        match crs.projection_type() {
            ProjectionType::WebMercator => Ok(Rect::new(
                -WEB_MERCATOR_HALF_WIDTH,
                -WEB_MERCATOR_HALF_WIDTH,
                WEB_MERCATOR_HALF_WIDTH,
                WEB_MERCATOR_HALF_WIDTH,
            )),
            ProjectionType::Geographic => Ok(Rect::new(-180.0, -90.0, 180.0, 90.0)),
            ProjectionType::Custom(_) => Err(GeoViewerError::Config(format!(
                "extent of projection {} is not set",
                crs.code()
            ))),
        }
    }

    fn codec(&self) -> WktCodec {
        match self.wkt_precision {
            Some(decimals) => WktCodec::default().with_precision(decimals),
            None => WktCodec::default(),
        }
    }
}

/// Map engine: 2D layers, optional 3D scene and tools, driven by one declarative layer list.
pub struct MapViewer {
    layers: LayerManager,
    scene: Option<SceneSynchronizer>,
    tools: ToolManager,
    style_engine: Arc<StyleEngine>,
    messenger: Box<dyn Messenger>,
    config: ViewerConfig,
}

#[cfg(test)]
impl std::fmt::Debug for MapViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapViewer").field("config", &self.config).finish_non_exhaustive()
    }
}

impl MapViewer {
    /// Applies the layer list to the 2D map and to the 3D scene.
    pub fn set_layers(&mut self, list: &[LayerDescriptor]) {
        self.layers.set_layers(list);
        if let Some(scene) = &self.scene {
            scene.add_layers(list);
        }
        self.messenger.request_redraw();
    }

    /// Applies the background layer list to the 2D map.
    pub fn set_background_layers(&mut self, list: &[LayerDescriptor]) {
        self.layers.set_background_layers(list);
        self.messenger.request_redraw();
    }

    /// Removes the layer from the 2D map and from the 3D scene.
    pub fn remove_layer(&mut self, id: &str) {
        self.layers.remove_layer(id);
        if let Some(scene) = &self.scene {
            scene.remove_layer(id);
        }
        self.messenger.request_redraw();
    }

    /// Reloads images of the layer.
    pub fn refresh_layer(&mut self, id: &str) {
        self.layers.refresh_layer(id);
        self.messenger.request_redraw();
    }

    /// Resolves the style without caching.
    pub fn resolve_styles(
        &self,
        descriptor: &StyleDescriptor,
        feature: Option<&Geom>,
    ) -> Vec<DrawPrimitive> {
        self.style_engine.resolve(descriptor, feature)
    }

    /// 2D layers.
    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    /// 2D layers.
    pub fn layers_mut(&mut self) -> &mut LayerManager {
        &mut self.layers
    }

    /// 3D scene, if the viewer has one.
    pub fn scene(&self) -> Option<&SceneSynchronizer> {
        self.scene.as_ref()
    }

    /// Tools.
    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    /// Tools.
    pub fn tools_mut(&mut self) -> &mut ToolManager {
        &mut self.tools
    }

    /// Style engine shared by the layers and the tools.
    pub fn style_engine(&self) -> &Arc<StyleEngine> {
        &self.style_engine
    }

    /// WKT codec used by the viewer.
    pub fn codec(&self) -> &WktCodec {
        self.style_engine.codec()
    }

    /// Coordinate system of the map.
    pub fn crs(&self) -> &Crs {
        self.style_engine.crs()
    }

    /// Configuration the viewer was built with.
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Releases all backend resources: tools first, then the 3D scene and the 2D layers.
    pub fn destroy(self) {
        let Self {
            mut layers,
            scene,
            tools,
            ..
        } = self;

        tools.destroy();
        if let Some(scene) = scene {
            scene.destroy();
        }
        layers.clear();
    }
}

/// Builder of a [`MapViewer`].
///
/// Layer and interaction backends are required. Without a scene backend the viewer has no 3D
/// scene. The scheduler defaults to [`RuntimeScheduler`] and the messenger to
/// [`DummyMessenger`].
pub struct MapViewerBuilder {
    config: ViewerConfig,
    layer_backend: Option<Box<dyn LayerBackend>>,
    interaction_backend: Option<Box<dyn InteractionBackend>>,
    scene_backend: Option<Arc<dyn SceneBackend>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    messenger: Option<Box<dyn Messenger>>,
}

impl MapViewerBuilder {
    /// Creates a builder for the configuration.
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            layer_backend: None,
            interaction_backend: None,
            scene_backend: None,
            scheduler: None,
            messenger: None,
        }
    }

    /// Sets the 2D backend.
    pub fn with_layer_backend(mut self, backend: impl LayerBackend + 'static) -> Self {
        self.layer_backend = Some(Box::new(backend));
        self
    }

    /// Sets the interaction backend.
    pub fn with_interaction_backend(
        mut self,
        backend: impl InteractionBackend + 'static,
    ) -> Self {
        self.interaction_backend = Some(Box::new(backend));
        self
    }

    /// Sets the 3D backend.
    pub fn with_scene_backend(mut self, backend: Arc<dyn SceneBackend>) -> Self {
        self.scene_backend = Some(backend);
        self
    }

    /// Sets the scheduler of 3D asset construction.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Sets the messenger notified when the map needs to be redrawn.
    pub fn with_messenger(mut self, messenger: impl Messenger + 'static) -> Self {
        self.messenger = Some(Box::new(messenger));
        self
    }

    /// Builds the viewer.
    pub fn build(self) -> Result<MapViewer, GeoViewerError> {
        let crs = self.config.crs()?;
        let extent = self.config.extent(&crs)?;

        let layer_backend = self
            .layer_backend
            .ok_or_else(|| GeoViewerError::Config("layer backend is not set".into()))?;
        let interaction_backend = self
            .interaction_backend
            .ok_or_else(|| GeoViewerError::Config("interaction backend is not set".into()))?;

        let style_engine = Arc::new(StyleEngine::new(self.config.codec(), crs.clone()));
        let context = SourceContext {
            crs,
            extent,
            device_pixel_ratio: self.config.device_pixel_ratio,
            hidpi_disabled: self.config.hidpi_disabled,
        };

        let scene = self.scene_backend.map(|backend| {
            let scheduler = self
                .scheduler
                .unwrap_or_else(|| Arc::new(RuntimeScheduler));
            SceneSynchronizer::new(backend, scheduler)
        });

        Ok(MapViewer {
            layers: LayerManager::new(layer_backend, context, style_engine.clone()),
            scene,
            tools: ToolManager::new(interaction_backend, style_engine.clone()),
            style_engine,
            messenger: self
                .messenger
                .unwrap_or_else(|| Box::new(DummyMessenger)),
            config: self.config,
        })
    }
}
