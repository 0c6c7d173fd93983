use async_trait::async_trait;
use maybe_sync::{MaybeSend, MaybeSync};

use crate::error::GeoViewerError;

/// Identifier of a 3D primitive (tileset) created by a [`SceneBackend`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PrimitiveHandle(pub u64);

/// Identifier of a terrain provider created by a [`SceneBackend`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TerrainHandle(pub u64);

/// 3D rendering backend.
///
/// Construction of tilesets and terrain providers loads remote assets and is asynchronous. All
/// other methods are cheap and synchronous.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait SceneBackend: MaybeSend + MaybeSync {
    /// Loads a 3D tileset and adds it to the scene as a hidden primitive.
    async fn create_tileset(&self, url: &str) -> Result<PrimitiveHandle, GeoViewerError>;
    /// Loads a terrain provider without activating it.
    async fn create_terrain(&self, url: &str) -> Result<TerrainHandle, GeoViewerError>;
    /// Shows or hides the primitive.
    fn set_primitive_shown(&self, handle: PrimitiveHandle, shown: bool);
    /// Removes the primitive from the scene and releases its resources.
    fn remove_primitive(&self, handle: PrimitiveHandle);
    /// Current position of the primitive in the scene's primitive collection.
    fn primitive_index(&self, handle: PrimitiveHandle) -> Option<usize>;
    /// Activates the terrain provider. `None` activates the default ellipsoid.
    fn set_terrain(&self, terrain: Option<TerrainHandle>);
    /// Schedules redrawing of the scene.
    fn request_render(&self);
}
