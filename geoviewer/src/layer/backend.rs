use geoviewer_types::Geom;
use maybe_sync::{MaybeSend, MaybeSync};

use crate::error::GeoViewerError;
use crate::layer::descriptor::LayerKind;
use crate::layer::source::LayerSource;
use crate::style::DrawPrimitive;

/// Identifier of a layer object created by a [`LayerBackend`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerHandle(pub u64);

/// Everything the backend needs to create a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRequest {
    /// Id of the layer descriptor.
    pub id: String,
    /// Source of the layer.
    pub source: LayerSource,
    /// Rendering order. Layers with larger values are drawn on top.
    pub z_index: i32,
    /// Whether the layer is shown.
    pub visible: bool,
    /// Opacity in `0.0..=1.0` range.
    pub opacity: f32,
}

/// Feature of a vector layer with its resolved style.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFeature {
    /// Id of the feature.
    pub id: String,
    /// Geometry in map coordinates.
    pub geometry: Geom,
    /// Resolved style of the feature.
    pub primitives: Vec<DrawPrimitive>,
}

/// 2D rendering backend.
///
/// The layer manager never renders anything itself: it only creates, updates and removes layer
/// objects through this trait.
pub trait LayerBackend: MaybeSend + MaybeSync {
    /// Returns false if the backend cannot display layers of the kind.
    fn supports(&self, kind: &LayerKind) -> bool {
        !kind.is_3d_only()
    }
    /// Creates a layer.
    fn create_layer(&mut self, request: LayerRequest) -> Result<LayerHandle, GeoViewerError>;
    /// Destroys the layer.
    fn remove_layer(&mut self, handle: LayerHandle);
    /// Shows or hides the layer.
    fn set_visible(&mut self, handle: LayerHandle, visible: bool);
    /// Sets opacity of the layer in `0.0..=1.0` range.
    fn set_opacity(&mut self, handle: LayerHandle, opacity: f32);
    /// Changes rendering order of the layer.
    fn set_z_index(&mut self, handle: LayerHandle, z_index: i32);
    /// Replaces the source of the layer, reloading all its images.
    fn replace_source(&mut self, handle: LayerHandle, source: LayerSource);
    /// Replaces the features of a vector layer.
    fn set_features(&mut self, handle: LayerHandle, features: Vec<RenderedFeature>);
    /// Removes all features of a vector layer.
    fn clear_features(&mut self, handle: LayerHandle);
}
