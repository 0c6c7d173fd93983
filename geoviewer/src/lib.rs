//! Geoviewer is the coordination core of an interactive map viewer. It does not draw anything by
//! itself: rendering is done by backends, and the engine keeps them in sync with a declarative
//! description of the map given by the application.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! # use geoviewer::layer::{LayerBackend, LayerHandle, LayerRequest, LayerSource, RenderedFeature};
//! # use geoviewer::tool::*;
//! # use geoviewer::error::GeoViewerError;
//! use geoviewer::layer::{LayerDescriptor, LayerKind, XyzLayerParams};
//! use geoviewer::viewer::{MapViewerBuilder, ViewerConfig};
//!
//! # fn run(layers: impl LayerBackend + 'static, interactions: impl InteractionBackend + 'static) -> Result<(), GeoViewerError> {
//! let config = ViewerConfig::from_json(r#"{"projection": {"code": "EPSG:3857"}}"#)?;
//! let mut viewer = MapViewerBuilder::new(config)
//!     .with_layer_backend(layers)
//!     .with_interaction_backend(interactions)
//!     .build()?;
//!
//! viewer.set_layers(&[LayerDescriptor::new("features", LayerKind::Vector)]);
//! # Ok(())
//! # }
//! ```
//!
//! # Main components
//!
//! * [`MapViewer`](viewer::MapViewer) owns everything below and applies a single layer list to
//!   both the 2D map and the 3D scene.
//! * [`LayerManager`](layer::LayerManager) creates, updates and orders 2D layers through a
//!   [`LayerBackend`](layer::LayerBackend).
//! * [`SceneSynchronizer`](scene::SceneSynchronizer) keeps 3D tilesets and terrain of a
//!   [`SceneBackend`](scene::SceneBackend) in sync, constructing them asynchronously.
//! * [`ToolManager`](tool::ToolManager) runs the interactive tools (drawing, selection, editing and
//!   others) and delivers their events to the application.
//! * [`StyleEngine`](style::StyleEngine) converts style descriptors into draw primitives shared by
//!   all of the above.
//!
//! Geometry types, WKT and coordinate systems live in the [`geoviewer_types`] crate.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod color;
pub mod error;
pub mod layer;
mod messenger;
pub mod scene;
pub mod scheduler;
pub mod style;
pub mod tile_schema;
pub mod tool;
pub mod viewer;

pub use color::Color;
pub use messenger::{DummyMessenger, Messenger};
pub use tile_schema::TileSchema;
pub use viewer::{MapViewer, MapViewerBuilder, ViewerConfig};

// Reexport geoviewer_types
pub use geoviewer_types;

#[cfg(test)]
mod tests;
