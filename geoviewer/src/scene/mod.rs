//! Mirroring of the layer list into a 3D scene.

mod backend;
mod synchronizer;

pub use backend::{PrimitiveHandle, SceneBackend, TerrainHandle};
pub use synchronizer::SceneSynchronizer;
