use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::layer::{LayerDescriptor, LayerKind};
use crate::scene::backend::{PrimitiveHandle, SceneBackend, TerrainHandle};
use crate::scheduler::{Scheduler, Task};

/// Separates entries of the list signature so that different lists never concatenate to the same
/// text.
const SIGNATURE_SEPARATOR: char = '\u{1f}';

#[derive(Debug, Clone, PartialEq, Eq)]
struct TerrainLayer {
    id: String,
    url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum ActiveTerrain {
    /// Nothing was applied yet.
    #[default]
    Unset,
    Ellipsoid,
    Layer(TerrainLayer),
}

#[derive(Debug, Default)]
struct SceneState {
    signature: Option<String>,
    tilesets: HashMap<String, PrimitiveHandle>,
    creating: HashSet<String>,
    // Last requested visibility of every listed tileset. Ids missing here are not listed anymore.
    requested: HashMap<String, bool>,
    active_terrain: ActiveTerrain,
    // Terrain requested by the latest list that is still being constructed.
    pending_terrain: Option<TerrainLayer>,
    reverse_index: Option<HashMap<usize, String>>,
    // Incremented whenever the reverse index is invalidated.
    index_generation: u64,
    destroyed: bool,
}

impl SceneState {
    fn invalidate_index(&mut self) {
        self.reverse_index = None;
        self.index_generation += 1;
    }
}

/// Backend call decided while the scene state is locked.
///
/// The calls are made after the lock is released: the state lock is not reentrant and backends
/// may query the synchronizer from their callbacks.
enum SceneAction {
    Show(PrimitiveHandle, bool),
    Terrain(Option<TerrainHandle>),
    Spawn(Task),
}

/// Mirrors the declarative layer list into a 3D scene.
///
/// Only 3D tilesets and terrain layers are handled, other layer kinds are ignored. Tilesets are
/// never destroyed when they are hidden, so showing them again is cheap.
pub struct SceneSynchronizer {
    backend: Arc<dyn SceneBackend>,
    scheduler: Arc<dyn Scheduler>,
    state: Arc<Mutex<SceneState>>,
}

impl SceneSynchronizer {
    /// Creates a synchronizer for an empty scene.
    pub fn new(backend: Arc<dyn SceneBackend>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            backend,
            scheduler,
            state: Arc::new(Mutex::new(SceneState::default())),
        }
    }

    /// Applies the full layer list to the scene.
    ///
    /// Calling the method again with the same ids and visibility flags only requests a redraw.
    pub fn add_layers(&self, list: &[LayerDescriptor]) {
        let signature = list_signature(list);
        let mut actions = vec![];

        {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }

            if state.signature.as_deref() != Some(signature.as_str()) {
                state.signature = Some(signature);
                self.sync(&mut state, list, &mut actions);
            }
        }

        self.apply(actions);
        self.backend.request_render();
    }

    /// Id of the layer the primitive at the given position of the scene belongs to.
    pub fn layer_id(&self, primitive_index: usize) -> Option<String> {
        let (tilesets, generation) = {
            let state = self.state.lock();
            if let Some(index) = &state.reverse_index {
                return index.get(&primitive_index).cloned();
            }

            let tilesets: Vec<(String, PrimitiveHandle)> = state
                .tilesets
                .iter()
                .map(|(id, handle)| (id.clone(), *handle))
                .collect();
            (tilesets, state.index_generation)
        };

        let index: HashMap<usize, String> = tilesets
            .into_iter()
            .filter_map(|(id, handle)| {
                self.backend
                    .primitive_index(handle)
                    .map(|position| (position, id))
            })
            .collect();
        let layer_id = index.get(&primitive_index).cloned();

        let mut state = self.state.lock();
        if state.index_generation == generation {
            state.reverse_index = Some(index);
        }

        layer_id
    }

    /// Removes the tileset or terrain of the layer from the scene. Does nothing for unknown ids.
    ///
    /// A tileset that is still being constructed is removed as soon as the construction completes.
    pub fn remove_layer(&self, id: &str) {
        let mut actions = vec![];

        {
            let mut state = self.state.lock();
            state.signature = None;
            state.requested.remove(id);

            if let Some(handle) = state.tilesets.remove(id) {
                state.invalidate_index();
                let backend = self.backend.clone();
                actions.push(SceneAction::Spawn(Box::pin(async move {
                    backend.remove_primitive(handle);
                })));
            }

            if matches!(&state.pending_terrain, Some(pending) if pending.id == id) {
                state.pending_terrain = None;
            }
            if matches!(&state.active_terrain, ActiveTerrain::Layer(active) if active.id == id) {
                state.active_terrain = ActiveTerrain::Ellipsoid;
                actions.push(SceneAction::Terrain(None));
            }
        }

        self.apply(actions);
    }

    /// Removes every primitive created by the synchronizer and restores the ellipsoid terrain.
    /// Constructions that complete later are discarded.
    pub fn destroy(self) {
        let mut actions = vec![];

        {
            let mut state = self.state.lock();
            state.destroyed = true;
            state.requested.clear();
            state.creating.clear();
            state.pending_terrain = None;
            state.invalidate_index();

            if state.active_terrain != ActiveTerrain::Ellipsoid {
                state.active_terrain = ActiveTerrain::Ellipsoid;
                actions.push(SceneAction::Terrain(None));
            }

            let handles: Vec<PrimitiveHandle> = state.tilesets.drain().map(|(_, h)| h).collect();
            let backend = self.backend.clone();
            actions.push(SceneAction::Spawn(Box::pin(async move {
                for handle in handles {
                    backend.remove_primitive(handle);
                }
            })));
        }

        self.apply(actions);
    }

    fn sync(
        &self,
        state: &mut SceneState,
        list: &[LayerDescriptor],
        actions: &mut Vec<SceneAction>,
    ) {
        let mut terrain_shown = false;
        let mut listed = HashSet::new();

        for layer in list {
            match &layer.kind {
                LayerKind::Terrain { url } if layer.visible && !terrain_shown => {
                    terrain_shown = true;
                    self.show_terrain(state, actions, &layer.id, url);
                }
                LayerKind::Tileset3d { url } => {
                    listed.insert(layer.id.as_str());
                    self.show_tileset(state, actions, &layer.id, url, layer.visible);
                }
                _ => {}
            }
        }

        let unlisted: Vec<String> = state
            .requested
            .keys()
            .filter(|id| !listed.contains(id.as_str()))
            .cloned()
            .collect();
        for id in unlisted {
            state.requested.remove(&id);
            if let Some(handle) = state.tilesets.get(&id) {
                actions.push(SceneAction::Show(*handle, false));
            }
        }

        if !terrain_shown {
            state.pending_terrain = None;
            if state.active_terrain != ActiveTerrain::Ellipsoid {
                log::debug!("No visible terrain layer, using ellipsoid");
                state.active_terrain = ActiveTerrain::Ellipsoid;
                actions.push(SceneAction::Terrain(None));
            }
        }
    }

    fn apply(&self, actions: Vec<SceneAction>) {
        for action in actions {
            match action {
                SceneAction::Show(handle, shown) => self.backend.set_primitive_shown(handle, shown),
                SceneAction::Terrain(terrain) => self.backend.set_terrain(terrain),
                SceneAction::Spawn(task) => self.scheduler.spawn(task),
            }
        }
    }

    fn show_terrain(
        &self,
        state: &mut SceneState,
        actions: &mut Vec<SceneAction>,
        id: &str,
        url: &str,
    ) {
        let terrain = TerrainLayer {
            id: id.to_string(),
            url: url.to_string(),
        };

        if state.active_terrain == ActiveTerrain::Layer(terrain.clone()) {
            state.pending_terrain = None;
            return;
        }
        if state.pending_terrain.as_ref() == Some(&terrain) {
            return;
        }

        state.pending_terrain = Some(terrain.clone());

        let backend = self.backend.clone();
        let shared = self.state.clone();
        actions.push(SceneAction::Spawn(Box::pin(async move {
            let result = backend.create_terrain(&terrain.url).await;

            let mut state = shared.lock();
            let requested = !state.destroyed && state.pending_terrain.as_ref() == Some(&terrain);
            if requested {
                state.pending_terrain = None;
            }

            let handle = match result {
                Ok(handle) => handle,
                Err(err) => {
                    log::error!("Failed to create terrain of layer {}: {err}", terrain.id);
                    return;
                }
            };

            if !requested {
                log::debug!("Terrain of layer {} is not requested anymore", terrain.id);
                return;
            }

            log::debug!("Switching terrain to layer {}", terrain.id);
            state.active_terrain = ActiveTerrain::Layer(terrain);
            drop(state);

            backend.set_terrain(Some(handle));
            backend.request_render();
        })));
    }

    fn show_tileset(
        &self,
        state: &mut SceneState,
        actions: &mut Vec<SceneAction>,
        id: &str,
        url: &str,
        visible: bool,
    ) {
        state.requested.insert(id.to_string(), visible);

        if let Some(handle) = state.tilesets.get(id) {
            actions.push(SceneAction::Show(*handle, visible));
            return;
        }

        if !visible || state.creating.contains(id) {
            return;
        }

        state.creating.insert(id.to_string());

        let id = id.to_string();
        let url = url.to_string();
        let backend = self.backend.clone();
        let shared = self.state.clone();
        actions.push(SceneAction::Spawn(Box::pin(async move {
            let result = backend.create_tileset(&url).await;

            let mut state = shared.lock();
            state.creating.remove(&id);

            let handle = match result {
                Ok(handle) => handle,
                Err(err) => {
                    log::error!("Failed to create 3D tileset of layer {id}: {err}");
                    return;
                }
            };

            let requested = if state.destroyed {
                None
            } else {
                state.requested.get(&id).copied()
            };

            match requested {
                Some(visible) => {
                    state.tilesets.insert(id, handle);
                    state.invalidate_index();
                    drop(state);

                    backend.set_primitive_shown(handle, visible);
                    backend.request_render();
                }
                None => {
                    log::debug!("Layer {id} was removed while its tileset was loading");
                    drop(state);
                    backend.remove_primitive(handle);
                }
            }
        })));
    }
}

/// Ids and visibility flags of the list, in order.
fn list_signature(list: &[LayerDescriptor]) -> String {
    let mut signature = String::new();
    for layer in list {
        signature.push_str(&layer.id);
        signature.push(SIGNATURE_SEPARATOR);
        signature.push(if layer.visible { '1' } else { '0' });
        signature.push(SIGNATURE_SEPARATOR);
    }

    signature
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::error::GeoViewerError;
    use crate::scheduler::tests::ManualScheduler;
    use crate::tests::{MockSceneBackend, SceneCall};

    fn tileset(id: &str, visible: bool) -> LayerDescriptor {
        LayerDescriptor::new(
            id,
            LayerKind::Tileset3d {
                url: format!("https://example.com/{id}/tileset.json"),
            },
        )
        .with_visible(visible)
    }

    fn terrain(id: &str, visible: bool) -> LayerDescriptor {
        LayerDescriptor::new(
            id,
            LayerKind::Terrain {
                url: format!("https://example.com/{id}"),
            },
        )
        .with_visible(visible)
    }

    fn synchronizer() -> (SceneSynchronizer, MockSceneBackend, ManualScheduler) {
        let backend = MockSceneBackend::default();
        let scheduler = ManualScheduler::default();
        let synchronizer =
            SceneSynchronizer::new(Arc::new(backend.clone()), Arc::new(scheduler.clone()));
        (synchronizer, backend, scheduler)
    }

    #[test]
    fn unchanged_list_only_requests_render() {
        let (synchronizer, backend, scheduler) = synchronizer();
        let list = vec![tileset("city", true), terrain("relief", true)];

        synchronizer.add_layers(&list);
        scheduler.run_all();
        let constructions = backend.construction_count();
        assert_eq!(constructions, 2);

        backend.clear_calls();
        synchronizer.add_layers(&list);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(backend.construction_count(), constructions);
        assert_eq!(backend.calls(), vec![SceneCall::RequestRender]);
    }

    #[test]
    fn tileset_is_constructed_once_while_in_flight() {
        let (synchronizer, backend, scheduler) = synchronizer();

        synchronizer.add_layers(&[tileset("city", true)]);
        synchronizer.add_layers(&[tileset("city", false)]);
        synchronizer.add_layers(&[tileset("city", true)]);
        assert_eq!(scheduler.pending(), 1);

        scheduler.run_all();
        assert_eq!(backend.construction_count(), 1);
        assert!(backend.is_shown(PrimitiveHandle(1)));
    }

    #[test]
    fn finished_tileset_applies_latest_visibility() {
        let (synchronizer, backend, scheduler) = synchronizer();

        synchronizer.add_layers(&[tileset("city", true)]);
        synchronizer.add_layers(&[tileset("city", false)]);
        scheduler.run_all();

        assert!(!backend.is_shown(PrimitiveHandle(1)));
        assert_eq!(synchronizer.layer_id(0).as_deref(), Some("city"));
    }

    #[test]
    fn hidden_tileset_is_not_destroyed() {
        let (synchronizer, backend, scheduler) = synchronizer();

        synchronizer.add_layers(&[tileset("city", true)]);
        scheduler.run_all();
        synchronizer.add_layers(&[tileset("city", false)]);
        synchronizer.add_layers(&[]);
        synchronizer.add_layers(&[tileset("city", true)]);
        scheduler.run_all();

        assert_eq!(backend.construction_count(), 1);
        assert!(backend.is_shown(PrimitiveHandle(1)));
        assert!(!backend
            .calls()
            .contains(&SceneCall::RemovePrimitive(PrimitiveHandle(1))));
    }

    #[test]
    fn unlisted_tileset_is_hidden() {
        let (synchronizer, backend, scheduler) = synchronizer();

        synchronizer.add_layers(&[tileset("city", true), tileset("trees", true)]);
        scheduler.run_all();
        synchronizer.add_layers(&[tileset("trees", true)]);

        let city = backend.handle_of("city").expect("city tileset");
        assert!(!backend.is_shown(city));
    }

    #[test]
    fn invisible_tileset_is_not_constructed() {
        let (synchronizer, backend, scheduler) = synchronizer();
        synchronizer.add_layers(&[tileset("city", false)]);
        scheduler.run_all();
        assert_eq!(backend.construction_count(), 0);
    }

    #[test]
    fn failed_tileset_is_left_absent() {
        crate::tests::init_logger();
        let (synchronizer, backend, scheduler) = synchronizer();
        backend.fail_url("https://example.com/broken/tileset.json");

        synchronizer.add_layers(&[tileset("broken", true), tileset("city", true)]);
        scheduler.run_all();

        assert_eq!(synchronizer.layer_id(0).as_deref(), Some("city"));
        assert_eq!(synchronizer.layer_id(1), None);

        // Failed construction can be retried after the list changes.
        synchronizer.add_layers(&[tileset("broken", true)]);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn terrain_falls_back_to_ellipsoid() {
        let (synchronizer, backend, scheduler) = synchronizer();

        synchronizer.add_layers(&[terrain("relief", true)]);
        scheduler.run_all();
        assert_matches!(backend.active_terrain(), Some(Some(_)));

        synchronizer.add_layers(&[terrain("relief", false)]);
        assert_eq!(backend.active_terrain(), Some(None));

        backend.clear_calls();
        synchronizer.add_layers(&[]);
        assert!(!backend
            .calls()
            .iter()
            .any(|call| matches!(call, SceneCall::SetTerrain(_))));
    }

    #[test]
    fn old_terrain_stays_until_new_one_resolves() {
        let (synchronizer, backend, scheduler) = synchronizer();

        synchronizer.add_layers(&[terrain("relief", true)]);
        scheduler.run_all();
        let first = backend.active_terrain();

        synchronizer.add_layers(&[terrain("relief", false), terrain("bathymetry", true)]);
        assert_eq!(backend.active_terrain(), first);

        scheduler.run_all();
        assert_ne!(backend.active_terrain(), first);
    }

    #[test]
    fn superseded_terrain_is_not_applied() {
        let (synchronizer, backend, scheduler) = synchronizer();

        synchronizer.add_layers(&[terrain("first", true)]);
        synchronizer.add_layers(&[terrain("second", true)]);
        assert_eq!(scheduler.pending(), 2);

        scheduler.run_one(1);
        scheduler.run_one(0);

        let second = backend.terrain_of("https://example.com/second");
        assert_eq!(backend.active_terrain(), Some(Some(second)));
    }

    #[test]
    fn terrain_hidden_while_loading_is_not_applied() {
        let (synchronizer, backend, scheduler) = synchronizer();

        synchronizer.add_layers(&[terrain("relief", true)]);
        synchronizer.add_layers(&[terrain("relief", false)]);
        assert_eq!(backend.active_terrain(), Some(None));

        scheduler.run_all();
        assert_eq!(backend.active_terrain(), Some(None));
        assert!(!backend
            .calls()
            .iter()
            .any(|call| matches!(call, SceneCall::SetTerrain(Some(_)))));

        // Showing it again starts a new construction that is applied.
        synchronizer.add_layers(&[terrain("relief", true)]);
        scheduler.run_all();
        assert_matches!(backend.active_terrain(), Some(Some(_)));
    }

    #[test]
    fn signature_distinguishes_concatenated_ids() {
        let (synchronizer, backend, scheduler) = synchronizer();

        synchronizer.add_layers(&[tileset("x", true), tileset("false", true)]);
        scheduler.run_all();
        assert_eq!(backend.construction_count(), 2);

        synchronizer.add_layers(&[tileset("xtruefalse", true)]);
        assert_eq!(scheduler.pending(), 1);
        scheduler.run_all();
        assert!(backend
            .handle_of("xtruefalse")
            .is_some_and(|handle| backend.is_shown(handle)));
        assert_eq!(list_signature(&[tileset("ab", true)]), "ab\u{1f}1\u{1f}");
    }

    #[test]
    fn backend_is_called_without_holding_the_state_lock() {
        let scheduler = ManualScheduler::default();
        let state = Arc::new(Mutex::new(SceneState::default()));
        let backend = Arc::new(LockCheckingBackend {
            inner: MockSceneBackend::default(),
            scene_state: state.clone(),
            locked_calls: Mutex::new(vec![]),
        });
        let synchronizer = SceneSynchronizer {
            backend: backend.clone(),
            scheduler: Arc::new(scheduler.clone()),
            state,
        };

        synchronizer.add_layers(&[tileset("city", true), terrain("relief", true)]);
        scheduler.run_all();
        assert_eq!(synchronizer.layer_id(0).as_deref(), Some("city"));

        synchronizer.add_layers(&[tileset("city", false), terrain("relief", false)]);
        synchronizer.add_layers(&[tileset("city", true), terrain("relief", true)]);
        synchronizer.add_layers(&[]);
        scheduler.run_all();
        synchronizer.remove_layer("relief");
        synchronizer.remove_layer("city");
        synchronizer.destroy();
        scheduler.run_all();

        assert_eq!(*backend.locked_calls.lock(), Vec::<&str>::new());
        assert!(backend.inner.calls().len() > 5);
    }

    /// Records the synchronous backend calls made while the scene state is locked.
    struct LockCheckingBackend {
        inner: MockSceneBackend,
        scene_state: Arc<Mutex<SceneState>>,
        locked_calls: Mutex<Vec<&'static str>>,
    }

    impl LockCheckingBackend {
        fn check(&self, call: &'static str) {
            if self.scene_state.try_lock().is_none() {
                self.locked_calls.lock().push(call);
            }
        }
    }

    #[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
    #[cfg_attr(not(target_arch = "wasm32"), async_trait)]
    impl SceneBackend for LockCheckingBackend {
        async fn create_tileset(&self, url: &str) -> Result<PrimitiveHandle, GeoViewerError> {
            self.inner.create_tileset(url).await
        }

        async fn create_terrain(&self, url: &str) -> Result<TerrainHandle, GeoViewerError> {
            self.inner.create_terrain(url).await
        }

        fn set_primitive_shown(&self, handle: PrimitiveHandle, shown: bool) {
            self.check("set_primitive_shown");
            self.inner.set_primitive_shown(handle, shown);
        }

        fn remove_primitive(&self, handle: PrimitiveHandle) {
            self.check("remove_primitive");
            self.inner.remove_primitive(handle);
        }

        fn primitive_index(&self, handle: PrimitiveHandle) -> Option<usize> {
            self.check("primitive_index");
            self.inner.primitive_index(handle)
        }

        fn set_terrain(&self, terrain: Option<TerrainHandle>) {
            self.check("set_terrain");
            self.inner.set_terrain(terrain);
        }

        fn request_render(&self) {
            self.check("request_render");
            self.inner.request_render();
        }
    }

    #[test]
    fn reverse_index_follows_removals() {
        let (synchronizer, backend, scheduler) = synchronizer();

        synchronizer.add_layers(&[tileset("a", true), tileset("b", true)]);
        scheduler.run_all();
        let a = synchronizer.layer_id(0);
        let b = synchronizer.layer_id(1);
        assert_ne!(a, b);

        let first = a.expect("first primitive");
        synchronizer.remove_layer(&first);
        scheduler.run_all();

        assert_eq!(backend.primitive_count(), 1);
        assert!(synchronizer.layer_id(0).is_some());
        assert_ne!(synchronizer.layer_id(0), Some(first));
        assert_eq!(synchronizer.layer_id(1), None);
    }

    #[test]
    fn tileset_removed_while_loading_is_discarded() {
        let (synchronizer, backend, scheduler) = synchronizer();

        synchronizer.add_layers(&[tileset("city", true)]);
        synchronizer.remove_layer("city");
        scheduler.run_all();

        assert_eq!(backend.primitive_count(), 0);
        assert_eq!(synchronizer.layer_id(0), None);
    }

    #[test]
    fn destroy_removes_primitives() {
        let (synchronizer, backend, scheduler) = synchronizer();

        synchronizer.add_layers(&[tileset("city", true), terrain("relief", true)]);
        scheduler.run_all();
        assert_eq!(backend.primitive_count(), 1);

        synchronizer.destroy();
        scheduler.run_all();
        assert_eq!(backend.primitive_count(), 0);
        assert_eq!(backend.active_terrain(), Some(None));
    }

    #[test]
    fn other_layers_are_ignored() {
        let (synchronizer, backend, scheduler) = synchronizer();
        let wms = LayerDescriptor::new(
            "roads",
            LayerKind::Wms(crate::layer::WmsLayerParams::new(
                "https://example.com/wms",
                "roads",
            )),
        );

        synchronizer.add_layers(&[wms]);
        scheduler.run_all();
        assert_eq!(backend.construction_count(), 0);
    }
}
