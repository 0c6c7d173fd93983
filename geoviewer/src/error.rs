//! Error types used by the crate.

use geoviewer_types::error::GeoTypesError;
use thiserror::Error;

/// Geoviewer error type.
#[derive(Debug, Error)]
pub enum GeoViewerError {
    /// The backend cannot display the requested kind of object.
    #[error("unsupported by the backend: {0}")]
    Unsupported(String),
    /// The backend failed to construct an object.
    #[error("failed to construct {0}")]
    Construction(String),
    /// Invalid geometry or projection.
    #[error(transparent)]
    Geometry(#[from] GeoTypesError),
    /// Invalid viewer configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Service url cannot be parsed.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    /// Item not found.
    #[error("item not found")]
    NotFound,
    /// Generic error - details are inside.
    #[error("{0}")]
    Generic(String),
}

impl From<serde_json::Error> for GeoViewerError {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value.to_string())
    }
}
