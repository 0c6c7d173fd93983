//! Backends that record calls, shared by the tests of the crate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use geoviewer_types::Geom;
use parking_lot::Mutex;

use crate::error::GeoViewerError;
use crate::layer::{LayerBackend, LayerHandle, LayerRequest, LayerSource, RenderedFeature};
use crate::scene::{PrimitiveHandle, SceneBackend, TerrainHandle};
use crate::tool::{
    Control, ControlHandle, Interaction, InteractionBackend, InteractionHandle, ScratchLayerHandle,
};

/// Routes `log` output of the code under test to the test harness.
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LayerCall {
    Create {
        id: String,
        z_index: i32,
        visible: bool,
        opacity: f32,
    },
    Remove(LayerHandle),
    Visible(LayerHandle, bool),
    Opacity(LayerHandle, f32),
    ZIndex(LayerHandle, i32),
    ReplaceSource(LayerHandle),
    SetFeatures(LayerHandle, usize),
    ClearFeatures(LayerHandle),
}

#[derive(Debug, Clone)]
pub(crate) struct MockLayer {
    pub(crate) id: String,
    pub(crate) source: LayerSource,
    pub(crate) z_index: i32,
    pub(crate) visible: bool,
    pub(crate) opacity: f32,
    pub(crate) features: Vec<RenderedFeature>,
}

#[derive(Debug, Default)]
struct LayerBackendState {
    next_handle: u64,
    layers: HashMap<LayerHandle, MockLayer>,
    calls: Vec<LayerCall>,
    failing: HashSet<String>,
}

/// 2D backend keeping the created layers in memory.
#[derive(Debug, Default, Clone)]
pub(crate) struct MockLayerBackend {
    state: Arc<Mutex<LayerBackendState>>,
}

impl MockLayerBackend {
    /// Creation of the layer with the id will fail.
    pub(crate) fn fail_layer(&self, id: &str) {
        self.state.lock().failing.insert(id.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<LayerCall> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub(crate) fn layer_count(&self) -> usize {
        self.state.lock().layers.len()
    }

    /// Layer created for the descriptor with the id.
    pub(crate) fn layer(&self, id: &str) -> Option<MockLayer> {
        self.state
            .lock()
            .layers
            .values()
            .find(|layer| layer.id == id)
            .cloned()
    }

    /// Ids of live layers from the top one.
    pub(crate) fn ids_by_z_index(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut layers: Vec<&MockLayer> = state.layers.values().collect();
        layers.sort_by_key(|layer| std::cmp::Reverse(layer.z_index));
        layers.into_iter().map(|layer| layer.id.clone()).collect()
    }

    pub(crate) fn creation_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, LayerCall::Create { .. }))
            .count()
    }
}

impl LayerBackend for MockLayerBackend {
    fn create_layer(&mut self, request: LayerRequest) -> Result<LayerHandle, GeoViewerError> {
        let mut state = self.state.lock();
        if state.failing.contains(&request.id) {
            return Err(GeoViewerError::Construction(request.id));
        }

        state.next_handle += 1;
        let handle = LayerHandle(state.next_handle);
        state.calls.push(LayerCall::Create {
            id: request.id.clone(),
            z_index: request.z_index,
            visible: request.visible,
            opacity: request.opacity,
        });
        state.layers.insert(
            handle,
            MockLayer {
                id: request.id,
                source: request.source,
                z_index: request.z_index,
                visible: request.visible,
                opacity: request.opacity,
                features: vec![],
            },
        );

        Ok(handle)
    }

    fn remove_layer(&mut self, handle: LayerHandle) {
        let mut state = self.state.lock();
        state.calls.push(LayerCall::Remove(handle));
        state.layers.remove(&handle);
    }

    fn set_visible(&mut self, handle: LayerHandle, visible: bool) {
        let mut state = self.state.lock();
        state.calls.push(LayerCall::Visible(handle, visible));
        if let Some(layer) = state.layers.get_mut(&handle) {
            layer.visible = visible;
        }
    }

    fn set_opacity(&mut self, handle: LayerHandle, opacity: f32) {
        let mut state = self.state.lock();
        state.calls.push(LayerCall::Opacity(handle, opacity));
        if let Some(layer) = state.layers.get_mut(&handle) {
            layer.opacity = opacity;
        }
    }

    fn set_z_index(&mut self, handle: LayerHandle, z_index: i32) {
        let mut state = self.state.lock();
        state.calls.push(LayerCall::ZIndex(handle, z_index));
        if let Some(layer) = state.layers.get_mut(&handle) {
            layer.z_index = z_index;
        }
    }

    fn replace_source(&mut self, handle: LayerHandle, source: LayerSource) {
        let mut state = self.state.lock();
        state.calls.push(LayerCall::ReplaceSource(handle));
        if let Some(layer) = state.layers.get_mut(&handle) {
            layer.source = source;
        }
    }

    fn set_features(&mut self, handle: LayerHandle, features: Vec<RenderedFeature>) {
        let mut state = self.state.lock();
        state.calls.push(LayerCall::SetFeatures(handle, features.len()));
        if let Some(layer) = state.layers.get_mut(&handle) {
            layer.features = features;
        }
    }

    fn clear_features(&mut self, handle: LayerHandle) {
        let mut state = self.state.lock();
        state.calls.push(LayerCall::ClearFeatures(handle));
        if let Some(layer) = state.layers.get_mut(&handle) {
            layer.features.clear();
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SceneCall {
    CreateTileset(String),
    CreateTerrain(String),
    SetPrimitiveShown(PrimitiveHandle, bool),
    RemovePrimitive(PrimitiveHandle),
    SetTerrain(Option<TerrainHandle>),
    RequestRender,
}

#[derive(Debug, Default)]
struct SceneBackendState {
    next_handle: u64,
    // Live primitives in scene order.
    primitives: Vec<(PrimitiveHandle, String, bool)>,
    terrains: HashMap<String, TerrainHandle>,
    active_terrain: Option<Option<TerrainHandle>>,
    failing: HashSet<String>,
    calls: Vec<SceneCall>,
}

/// 3D backend keeping its primitives in a list, like a scene primitive collection does.
#[derive(Debug, Default, Clone)]
pub(crate) struct MockSceneBackend {
    state: Arc<Mutex<SceneBackendState>>,
}

impl MockSceneBackend {
    pub(crate) fn fail_url(&self, url: &str) {
        self.state.lock().failing.insert(url.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<SceneCall> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub(crate) fn construction_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    SceneCall::CreateTileset(_) | SceneCall::CreateTerrain(_)
                )
            })
            .count()
    }

    pub(crate) fn primitive_count(&self) -> usize {
        self.state.lock().primitives.len()
    }

    pub(crate) fn is_shown(&self, handle: PrimitiveHandle) -> bool {
        self.state
            .lock()
            .primitives
            .iter()
            .any(|(h, _, shown)| *h == handle && *shown)
    }

    /// Handle of the live tileset whose url contains the needle.
    pub(crate) fn handle_of(&self, needle: &str) -> Option<PrimitiveHandle> {
        self.state
            .lock()
            .primitives
            .iter()
            .find(|(_, url, _)| url.contains(needle))
            .map(|(handle, _, _)| *handle)
    }

    /// Terrain created for the url.
    ///
    /// # Panics
    /// If no terrain was created for the url.
    pub(crate) fn terrain_of(&self, url: &str) -> TerrainHandle {
        self.state.lock().terrains[url]
    }

    /// `None` if the terrain was never set, `Some(None)` for the ellipsoid.
    pub(crate) fn active_terrain(&self) -> Option<Option<TerrainHandle>> {
        self.state.lock().active_terrain
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl SceneBackend for MockSceneBackend {
    async fn create_tileset(&self, url: &str) -> Result<PrimitiveHandle, GeoViewerError> {
        let mut state = self.state.lock();
        state.calls.push(SceneCall::CreateTileset(url.to_string()));
        if state.failing.contains(url) {
            return Err(GeoViewerError::Construction(url.to_string()));
        }

        state.next_handle += 1;
        let handle = PrimitiveHandle(state.next_handle);
        state.primitives.push((handle, url.to_string(), false));
        Ok(handle)
    }

    async fn create_terrain(&self, url: &str) -> Result<TerrainHandle, GeoViewerError> {
        let mut state = self.state.lock();
        state.calls.push(SceneCall::CreateTerrain(url.to_string()));
        if state.failing.contains(url) {
            return Err(GeoViewerError::Construction(url.to_string()));
        }

        state.next_handle += 1;
        let handle = TerrainHandle(state.next_handle);
        state.terrains.insert(url.to_string(), handle);
        Ok(handle)
    }

    fn set_primitive_shown(&self, handle: PrimitiveHandle, shown: bool) {
        let mut state = self.state.lock();
        state.calls.push(SceneCall::SetPrimitiveShown(handle, shown));
        if let Some(primitive) = state.primitives.iter_mut().find(|(h, _, _)| *h == handle) {
            primitive.2 = shown;
        }
    }

    fn remove_primitive(&self, handle: PrimitiveHandle) {
        let mut state = self.state.lock();
        state.calls.push(SceneCall::RemovePrimitive(handle));
        state.primitives.retain(|(h, _, _)| *h != handle);
    }

    fn primitive_index(&self, handle: PrimitiveHandle) -> Option<usize> {
        self.state
            .lock()
            .primitives
            .iter()
            .position(|(h, _, _)| *h == handle)
    }

    fn set_terrain(&self, terrain: Option<TerrainHandle>) {
        let mut state = self.state.lock();
        state.calls.push(SceneCall::SetTerrain(terrain));
        state.active_terrain = Some(terrain);
    }

    fn request_render(&self) {
        self.state.lock().calls.push(SceneCall::RequestRender);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum InteractionCall {
    AddInteraction(Interaction),
    RemoveInteraction(InteractionHandle),
    CreateScratchLayer(ScratchLayerHandle),
    SetScratchFeatures(ScratchLayerHandle, usize),
    ClearScratchLayer(ScratchLayerHandle),
    DisposeScratchLayer(ScratchLayerHandle),
    AddControl(Control),
    RemoveControl(ControlHandle),
}

#[derive(Debug, Default)]
struct InteractionBackendState {
    next_handle: u64,
    interactions: Vec<(InteractionHandle, Interaction)>,
    scratch_layers: HashMap<ScratchLayerHandle, Vec<RenderedFeature>>,
    controls: HashSet<ControlHandle>,
    calls: Vec<InteractionCall>,
}

impl InteractionBackendState {
    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// Interaction backend keeping attached interactions, controls and scratch layers in memory.
#[derive(Debug, Default, Clone)]
pub(crate) struct MockInteractionBackend {
    state: Arc<Mutex<InteractionBackendState>>,
}

impl MockInteractionBackend {
    pub(crate) fn calls(&self) -> Vec<InteractionCall> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub(crate) fn interaction_count(&self) -> usize {
        self.state.lock().interactions.len()
    }

    pub(crate) fn control_count(&self) -> usize {
        self.state.lock().controls.len()
    }

    pub(crate) fn scratch_layer_count(&self) -> usize {
        self.state.lock().scratch_layers.len()
    }

    pub(crate) fn scratch_layers_created(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, InteractionCall::CreateScratchLayer(_)))
            .count()
    }

    /// Handle of the first live interaction matching the predicate.
    pub(crate) fn interaction_of(
        &self,
        predicate: impl Fn(&Interaction) -> bool,
    ) -> Option<InteractionHandle> {
        self.state
            .lock()
            .interactions
            .iter()
            .find(|(_, interaction)| predicate(interaction))
            .map(|(handle, _)| *handle)
    }

    /// Ids of the features on all scratch layers.
    pub(crate) fn scratch_features(&self) -> Vec<String> {
        self.state
            .lock()
            .scratch_layers
            .values()
            .flatten()
            .map(|feature| feature.id.clone())
            .collect()
    }

    /// Geometries of the features on all scratch layers.
    pub(crate) fn scratch_geometries(&self) -> Vec<Geom> {
        self.state
            .lock()
            .scratch_layers
            .values()
            .flatten()
            .map(|feature| feature.geometry.clone())
            .collect()
    }
}

impl InteractionBackend for MockInteractionBackend {
    fn add_interaction(&mut self, interaction: Interaction) -> InteractionHandle {
        let mut state = self.state.lock();
        let handle = InteractionHandle(state.next_handle());
        state
            .calls
            .push(InteractionCall::AddInteraction(interaction.clone()));
        state.interactions.push((handle, interaction));
        handle
    }

    fn remove_interaction(&mut self, handle: InteractionHandle) {
        let mut state = self.state.lock();
        state.calls.push(InteractionCall::RemoveInteraction(handle));
        state.interactions.retain(|(h, _)| *h != handle);
    }

    fn create_scratch_layer(&mut self) -> Result<ScratchLayerHandle, GeoViewerError> {
        let mut state = self.state.lock();
        let handle = ScratchLayerHandle(state.next_handle());
        state.calls.push(InteractionCall::CreateScratchLayer(handle));
        state.scratch_layers.insert(handle, vec![]);
        Ok(handle)
    }

    fn set_scratch_features(&mut self, layer: ScratchLayerHandle, features: Vec<RenderedFeature>) {
        let mut state = self.state.lock();
        state
            .calls
            .push(InteractionCall::SetScratchFeatures(layer, features.len()));
        if let Some(existing) = state.scratch_layers.get_mut(&layer) {
            *existing = features;
        }
    }

    fn clear_scratch_layer(&mut self, layer: ScratchLayerHandle) {
        let mut state = self.state.lock();
        state.calls.push(InteractionCall::ClearScratchLayer(layer));
        if let Some(existing) = state.scratch_layers.get_mut(&layer) {
            existing.clear();
        }
    }

    fn dispose_scratch_layer(&mut self, layer: ScratchLayerHandle) {
        let mut state = self.state.lock();
        state.calls.push(InteractionCall::DisposeScratchLayer(layer));
        state.scratch_layers.remove(&layer);
    }

    fn add_control(&mut self, control: Control) -> ControlHandle {
        let mut state = self.state.lock();
        let handle = ControlHandle(state.next_handle());
        state.calls.push(InteractionCall::AddControl(control));
        state.controls.insert(handle);
        handle
    }

    fn remove_control(&mut self, handle: ControlHandle) {
        let mut state = self.state.lock();
        state.calls.push(InteractionCall::RemoveControl(handle));
        state.controls.remove(&handle);
    }
}
