use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::GeoTypesError;
use crate::geo::projection::{IdentityProjection, Projection};
use crate::geo::web_mercator::WebMercator;

/// Coordinate reference system identified by its code, e.g. `EPSG:3857`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    code: Cow<'static, str>,
    projection_type: ProjectionType,
}

/// The way coordinates of a [`Crs`] relate to geographic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectionType {
    /// Longitude and latitude in degrees.
    Geographic,
    /// Spherical Web Mercator.
    WebMercator,
    /// Projection given by an operator definition.
    Custom(String),
}

impl Crs {
    /// WGS84 geographic coordinates.
    pub const EPSG4326: Crs = Crs {
        code: Cow::Borrowed("EPSG:4326"),
        projection_type: ProjectionType::Geographic,
    };

    /// Web Mercator.
    pub const EPSG3857: Crs = Crs {
        code: Cow::Borrowed("EPSG:3857"),
        projection_type: ProjectionType::WebMercator,
    };

    /// Returns one of the well known coordinate systems by its code. The code is matched case
    /// insensitively, common aliases of the codes are recognized.
    pub fn from_code(code: &str) -> Result<Self, GeoTypesError> {
        match code.to_ascii_uppercase().as_str() {
            "EPSG:4326" | "CRS:84" | "OGC:CRS84" => Ok(Self::EPSG4326),
            "EPSG:3857" | "EPSG:900913" | "EPSG:102100" => Ok(Self::EPSG3857),
            _ => Err(GeoTypesError::Projection(format!(
                "unknown coordinate system {code}, a projection definition is required"
            ))),
        }
    }

    /// Coordinate system with a custom projection definition.
    pub fn custom(code: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            code: Cow::Owned(code.into()),
                projection_type: ProjectionType::Custom(definition.into()),
        }
    }

    /// Code of the coordinate system.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Projection type.
    pub fn projection_type(&self) -> &ProjectionType {
        &self.projection_type
    }

    /// Returns `true` if the coordinates are longitude and latitude.
    pub fn is_geographic(&self) -> bool {
        self.projection_type == ProjectionType::Geographic
    }

    /// Projection converting geographic coordinates into this coordinate system.
    pub fn get_projection(&self) -> Option<Box<dyn Projection>> {
        match &self.projection_type {
            ProjectionType::Geographic => Some(Box::new(IdentityProjection)),
            ProjectionType::WebMercator => Some(Box::new(WebMercator)),
            #[cfg(feature = "geodesy")]
            ProjectionType::Custom(definition) => {
                match crate::geo::GeodesyProjection::new(definition) {
                    Ok(projection) => Some(Box::new(projection)),
                    Err(err) => {
                        log::warn!("Failed to create projection for {}: {err}", self.code);
                        None
                    }
                }
            }
            #[cfg(not(feature = "geodesy"))]
            ProjectionType::Custom(_) => None,
        }
    }
}
