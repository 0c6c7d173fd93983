//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeoTypesError {
    /// Geometry conversion error.
    #[error("invalid input geometry: {0}")]
    Conversion(String),
    /// The WKT text could not be parsed.
    #[error("invalid WKT at position {position}: {message}")]
    Wkt {
        /// Byte offset in the input where parsing failed.
        position: usize,
        /// Description of the problem.
        message: String,
    },
    /// The coordinate system cannot be used for the requested operation.
    #[error("unsupported projection: {0}")]
    Projection(String),
}
