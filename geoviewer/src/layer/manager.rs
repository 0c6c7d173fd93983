use std::collections::HashSet;
use std::sync::Arc;

use geoviewer_types::Geom;
use indexmap::IndexMap;

use crate::layer::backend::{LayerBackend, LayerHandle, LayerRequest, RenderedFeature};
use crate::layer::descriptor::{opacity_fraction, LayerDescriptor};
use crate::layer::source::{LayerSource, SourceContext};
use crate::style::{StyleDescriptor, StyleEngine};

/// Name of the request parameter used to bypass caches on refresh.
pub const CACHE_BUST_PARAM: &str = "_cb";

/// Feature of a vector layer supplied by the application.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorFeature {
    /// Id of the feature.
    pub id: String,
    /// Geometry in map coordinates.
    pub geometry: Geom,
    /// Style of the feature.
    pub style: StyleDescriptor,
}

#[derive(Debug)]
struct LayerEntry {
    descriptor: LayerDescriptor,
    handle: LayerHandle,
    source: LayerSource,
    z_index: i32,
    // Set by `add_layer` with an explicit z-index. Kept until the layer is listed again or
    // reordered.
    pinned_z_index: Option<i32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Group {
    Background,
    Main,
}

/// Keeps the layers of a [`LayerBackend`] in sync with the declarative layer lists of the
/// application.
///
/// Layers are kept in two groups: background layers and the main layers. Both lists are ordered
/// from the top layer to the bottom one. The z-index of a layer is its position in the reversed
/// list; main layers are offset by the number of background layers so that the background is
/// always drawn beneath. A layer added with an explicit z-index keeps it until it is listed or
/// reordered again. An id belongs to one group at a time.
pub struct LayerManager {
    backend: Box<dyn LayerBackend>,
    context: SourceContext,
    style_engine: Arc<StyleEngine>,
    background: IndexMap<String, LayerEntry>,
    layers: IndexMap<String, LayerEntry>,
    cache_bust: u64,
}

impl LayerManager {
    /// Creates a manager without layers.
    pub fn new(
        backend: Box<dyn LayerBackend>,
        context: SourceContext,
        style_engine: Arc<StyleEngine>,
    ) -> Self {
        Self {
            backend,
            context,
            style_engine,
            background: IndexMap::new(),
            layers: IndexMap::new(),
            cache_bust: 0,
        }
    }

    /// Replaces the background layers.
    pub fn set_background_layers(&mut self, list: &[LayerDescriptor]) {
        self.apply(Group::Background, list);
    }

    /// Replaces the main layers.
    ///
    /// Layers with ids not in the list are destroyed. Layers with the same id and source are
    /// updated in place; a changed source recreates the layer. New ids are created.
    pub fn set_layers(&mut self, list: &[LayerDescriptor]) {
        self.apply(Group::Main, list);
    }

    /// Creates one layer on top of the main layers, or at the given z-index. An existing layer
    /// with the same id is replaced.
    ///
    /// Returns `None` if the backend does not support the layer or fails to create it.
    pub fn add_layer(
        &mut self,
        descriptor: &LayerDescriptor,
        z_index: Option<i32>,
    ) -> Option<LayerHandle> {
        self.remove_layer(&descriptor.id);

        let top = (self.background.len() + self.layers.len()) as i32;
        let mut entry = self.create(descriptor, z_index.unwrap_or(top))?;
        entry.pinned_z_index = z_index;
        let handle = entry.handle;
        self.layers.shift_insert(0, descriptor.id.clone(), entry);
        self.update_z_indices();

        Some(handle)
    }

    /// Destroys the layer. Does nothing if there is no layer with the id.
    pub fn remove_layer(&mut self, id: &str) {
        let entry = match self.layers.shift_remove(id) {
            Some(entry) => entry,
            None => match self.background.shift_remove(id) {
                Some(entry) => entry,
                None => return,
            },
        };

        self.destroy(entry);
        self.update_z_indices();
    }

    /// Destroys all layers with the given ids.
    pub fn remove_layers<S: AsRef<str>>(&mut self, ids: &[S]) {
        for id in ids {
            self.remove_layer(id.as_ref());
        }
    }

    /// Shows or hides the layer.
    pub fn set_layer_visibility(&mut self, id: &str, visible: bool) {
        let Some(entry) = self.entry_mut(id) else {
            return;
        };

        if entry.descriptor.visible != visible {
            entry.descriptor.visible = visible;
            let handle = entry.handle;
            self.backend.set_visible(handle, visible);
        }
    }

    /// Sets opacity of the layer in percent.
    pub fn set_layer_opacity(&mut self, id: &str, percent: u8) {
        let Some(entry) = self.entry_mut(id) else {
            return;
        };

        if entry.descriptor.opacity != Some(percent) {
            entry.descriptor.opacity = Some(percent);
            let handle = entry.handle;
            self.backend.set_opacity(handle, opacity_fraction(percent));
        }
    }

    /// Reorders the main layers. Listed layers go first (on top) in the given order, the rest
    /// keep their relative order below them. Unknown ids are ignored.
    pub fn set_layer_order<S: AsRef<str>>(&mut self, ids: &[S]) {
        let mut previous = std::mem::take(&mut self.layers);
        for id in ids {
            if let Some(mut entry) = previous.shift_remove(id.as_ref()) {
                entry.pinned_z_index = None;
                self.layers.insert(id.as_ref().to_string(), entry);
            }
        }
        self.layers.extend(previous);

        self.update_z_indices();
    }

    /// Reloads all images of a tile layer, bypassing caches. Does nothing for vector layers and
    /// unknown ids.
    pub fn refresh_layer(&mut self, id: &str) {
        let cache_bust = self.cache_bust + 1;
        let Some(entry) = self.entry_mut(id) else {
            return;
        };
        let LayerSource::Tile(source) = &mut entry.source else {
            return;
        };

        source.set_param(CACHE_BUST_PARAM, cache_bust.to_string());
        let handle = entry.handle;
        let source = entry.source.clone();

        self.cache_bust = cache_bust;
        self.backend.replace_source(handle, source);
    }

    /// Resolves styles of the features and displays them in the vector layer. Does nothing if the
    /// layer is not a vector layer.
    pub fn set_vector_features(&mut self, id: &str, features: Vec<VectorFeature>) {
        let Some(entry) = self.entry(id) else {
            return;
        };
        if entry.source != LayerSource::Vector {
            log::debug!("Layer {id} is not a vector layer, features are ignored");
            return;
        }

        let handle = entry.handle;
        let rendered = features
            .into_iter()
            .map(|feature| RenderedFeature {
                primitives: self
                    .style_engine
                    .resolve(&feature.style, Some(&feature.geometry)),
                id: feature.id,
                geometry: feature.geometry,
            })
            .collect();

        self.backend.set_features(handle, rendered);
    }

    /// Ids of the main layers from the top one.
    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.keys().map(String::as_str).collect()
    }

    /// Ids of the background layers from the top one.
    pub fn background_ids(&self) -> Vec<&str> {
        self.background.keys().map(String::as_str).collect()
    }

    /// Descriptor of the layer.
    pub fn layer(&self, id: &str) -> Option<&LayerDescriptor> {
        self.entry(id).map(|entry| &entry.descriptor)
    }

    /// Current z-index of the layer.
    pub fn z_index(&self, id: &str) -> Option<i32> {
        self.entry(id).map(|entry| entry.z_index)
    }

    /// Backend handle of the layer.
    pub fn handle(&self, id: &str) -> Option<LayerHandle> {
        self.entry(id).map(|entry| entry.handle)
    }

    /// Source the layer was created with.
    pub fn source(&self, id: &str) -> Option<&LayerSource> {
        self.entry(id).map(|entry| &entry.source)
    }

    /// Destroys all layers.
    pub fn clear(&mut self) {
        let entries: Vec<LayerEntry> = self
            .layers
            .drain(..)
            .chain(self.background.drain(..))
            .map(|(_, entry)| entry)
            .collect();
        for entry in entries {
            self.destroy(entry);
        }
    }

    fn apply(&mut self, group: Group, list: &[LayerDescriptor]) {
        let other = match group {
            Group::Background => &self.layers,
            Group::Main => &self.background,
        };
        let mut seen = HashSet::new();
        let list: Vec<&LayerDescriptor> = list
            .iter()
            .filter(|descriptor| {
                if other.contains_key(&descriptor.id) {
                    log::warn!(
                        "Layer id {} is used by the other layer group, ignoring",
                        descriptor.id
                    );
                    return false;
                }

                let unique = seen.insert(descriptor.id.as_str());
                if !unique {
                    log::warn!("Duplicate layer id {}, ignoring", descriptor.id);
                }
                unique
            })
            .collect();

        let mut previous = std::mem::take(self.group_mut(group));
        let retained: HashSet<&str> = list.iter().map(|d| d.id.as_str()).collect();
        let removed: Vec<String> = previous
            .keys()
            .filter(|id| !retained.contains(id.as_str()))
            .cloned()
            .collect();
        for id in removed {
            if let Some(entry) = previous.shift_remove(&id) {
                self.destroy(entry);
            }
        }

        let offset = match group {
            Group::Background => 0,
            Group::Main => self.background.len() as i32,
        };
        let count = list.len() as i32;

        let mut next = IndexMap::new();
        for (position, descriptor) in list.into_iter().enumerate() {
            let z_index = offset + count - 1 - position as i32;
            let entry = match previous.shift_remove(&descriptor.id) {
                Some(mut entry) if entry.descriptor.kind == descriptor.kind => {
                    self.update(&mut entry, descriptor);
                    entry.pinned_z_index = None;
                    Some(entry)
                }
                Some(entry) => {
                    log::debug!("Source of layer {} changed, recreating", descriptor.id);
                    self.destroy(entry);
                    self.create(descriptor, z_index)
                }
                None => self.create(descriptor, z_index),
            };

            if let Some(entry) = entry {
                next.insert(descriptor.id.clone(), entry);
            }
        }

        *self.group_mut(group) = next;
        self.update_z_indices();
    }

    fn create(&mut self, descriptor: &LayerDescriptor, z_index: i32) -> Option<LayerEntry> {
        if !self.backend.supports(&descriptor.kind) {
            log::debug!(
                "Layer {} of type {} is not supported by the backend",
                descriptor.id,
                descriptor.kind.type_name()
            );
            return None;
        }

        let source = match LayerSource::from_kind(&descriptor.kind, &self.context) {
            Ok(Some(source)) => source,
            Ok(None) => {
                log::debug!(
                    "Layer {} of type {} is not displayed in 2D",
                    descriptor.id,
                    descriptor.kind.type_name()
                );
                return None;
            }
            Err(err) => {
                log::warn!("Failed to create source of layer {}: {err}", descriptor.id);
                return None;
            }
        };

        let request = LayerRequest {
            id: descriptor.id.clone(),
            source: source.clone(),
            z_index,
            visible: descriptor.visible,
            opacity: descriptor.opacity_fraction(),
        };

        match self.backend.create_layer(request) {
            Ok(handle) => Some(LayerEntry {
                descriptor: descriptor.clone(),
                handle,
                source,
                z_index,
                pinned_z_index: None,
            }),
            Err(err) => {
                log::warn!("Failed to create layer {}: {err}", descriptor.id);
                None
            }
        }
    }

    fn update(&mut self, entry: &mut LayerEntry, descriptor: &LayerDescriptor) {
        if entry.descriptor.visible != descriptor.visible {
            self.backend.set_visible(entry.handle, descriptor.visible);
        }
        if entry.descriptor.opacity_fraction() != descriptor.opacity_fraction() {
            self.backend
                .set_opacity(entry.handle, descriptor.opacity_fraction());
        }

        entry.descriptor = descriptor.clone();
    }

    fn destroy(&mut self, entry: LayerEntry) {
        if entry.source == LayerSource::Vector {
            self.backend.clear_features(entry.handle);
        }
        self.backend.remove_layer(entry.handle);
    }

    fn update_z_indices(&mut self) {
        let background_count = self.background.len() as i32;
        let layer_count = self.layers.len() as i32;

        let background = self
            .background
            .values_mut()
            .enumerate()
            .map(|(position, entry)| (entry, background_count - 1 - position as i32));
        let layers = self
            .layers
            .values_mut()
            .enumerate()
            .map(|(position, entry)| {
                (entry, background_count + layer_count - 1 - position as i32)
            });

        for (entry, z_index) in background.chain(layers) {
            let z_index = entry.pinned_z_index.unwrap_or(z_index);
            if entry.z_index != z_index {
                entry.z_index = z_index;
                self.backend.set_z_index(entry.handle, z_index);
            }
        }
    }

    fn group_mut(&mut self, group: Group) -> &mut IndexMap<String, LayerEntry> {
        match group {
            Group::Background => &mut self.background,
            Group::Main => &mut self.layers,
        }
    }

    fn entry(&self, id: &str) -> Option<&LayerEntry> {
        self.layers.get(id).or_else(|| self.background.get(id))
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut LayerEntry> {
        match self.layers.get_mut(id) {
            Some(entry) => Some(entry),
            None => self.background.get_mut(id),
        }
    }
}
