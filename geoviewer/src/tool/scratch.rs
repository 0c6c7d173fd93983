use crate::layer::RenderedFeature;
use crate::tool::backend::{InteractionBackend, ScratchLayerHandle};

/// Vector layer owned by a tool. The backend layer is created on first use and then reused until
/// the tool is destroyed.
#[derive(Debug, Default)]
pub(crate) struct ScratchLayer {
    handle: Option<ScratchLayerHandle>,
}

impl ScratchLayer {
    pub(crate) fn handle(&self) -> Option<ScratchLayerHandle> {
        self.handle
    }

    /// Clears the layer and fills it with the features. Returns `None` if the layer cannot be
    /// created.
    pub(crate) fn replace(
        &mut self,
        backend: &mut dyn InteractionBackend,
        features: Vec<RenderedFeature>,
    ) -> Option<ScratchLayerHandle> {
        let handle = match self.handle {
            Some(handle) => handle,
            None => match backend.create_scratch_layer() {
                Ok(handle) => {
                    self.handle = Some(handle);
                    handle
                }
                Err(err) => {
                    log::warn!("Failed to create scratch layer: {err}");
                    return None;
                }
            },
        };

        backend.clear_scratch_layer(handle);
        if !features.is_empty() {
            backend.set_scratch_features(handle, features);
        }

        Some(handle)
    }

    pub(crate) fn clear(&self, backend: &mut dyn InteractionBackend) {
        if let Some(handle) = self.handle {
            backend.clear_scratch_layer(handle);
        }
    }

    pub(crate) fn dispose(&mut self, backend: &mut dyn InteractionBackend) {
        if let Some(handle) = self.handle.take() {
            backend.clear_scratch_layer(handle);
            backend.dispose_scratch_layer(handle);
        }
    }
}
