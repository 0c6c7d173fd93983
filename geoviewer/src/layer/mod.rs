//! 2D layer management: declarative [`LayerDescriptor`]s are turned into backend layers by the
//! [`LayerManager`].

mod backend;
mod descriptor;
mod hidpi;
mod manager;
mod source;
mod wms;

pub use backend::{LayerBackend, LayerHandle, LayerRequest, RenderedFeature};
pub use descriptor::{
    HidpiSubstitute, LayerDescriptor, LayerKind, ServerType, ServiceParams, WmsLayerParams,
    WmtsLayerParams, WmtsTileGrid, XyzLayerParams,
};
pub use hidpi::{HidpiMode, HidpiPolicy};
pub use manager::{LayerManager, VectorFeature, CACHE_BUST_PARAM};
pub use source::{LayerSource, SourceContext, TileSource, WmtsSource, XyzSource};
pub use wms::{
    WmsDelivery, WmsRequest, WmsSource, FORM_CONTENT_TYPE, MAX_GET_URL_LENGTH, WMS_GRID_LEVELS,
    WMS_TILE_SIZE,
};
