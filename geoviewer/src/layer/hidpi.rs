use serde::{Deserialize, Serialize};

use crate::layer::descriptor::ServiceParams;
use crate::tile_schema::TileSchema;

/// Strategy for displaying tile layers on high density screens.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HidpiMode {
    /// Request images with the device pixel ratio.
    #[default]
    TilePixelRatioOnly,
    /// Request the next zoom level for every nominal tile.
    ShowNextZoomLevel,
    /// Same as [`HidpiMode::ShowNextZoomLevel`] but from an alternative source.
    SubstituteLayerShowNextZoomLevel,
}

/// HiDPI policy resolved for one layer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HidpiPolicy {
    /// Pixel ratio of the screen or the one configured for the service.
    pub pixel_ratio: f64,
    /// Resolved mode.
    pub mode: HidpiMode,
}

impl HidpiPolicy {
    /// Resolves the policy for the service. Returns `None` if high density images should not be
    /// requested: the pixel ratio is not above 1 or HiDPI is disabled for the viewer or the
    /// service.
    ///
    /// The substitute mode falls back to [`HidpiMode::ShowNextZoomLevel`] if the service has no
    /// substitute source.
    pub fn resolve(
        service: &ServiceParams,
        device_pixel_ratio: f64,
        viewer_hidpi_disabled: bool,
    ) -> Option<Self> {
        let pixel_ratio = service.pixel_ratio.unwrap_or(device_pixel_ratio);
        if pixel_ratio <= 1.0 || viewer_hidpi_disabled || service.hidpi_disabled {
            return None;
        }

        let mode = match service.hidpi_mode.unwrap_or_default() {
            HidpiMode::SubstituteLayerShowNextZoomLevel if service.hidpi_substitute.is_none() => {
                log::warn!(
                    "No substitute source for {}, showing next zoom level instead",
                    service.url
                );
                HidpiMode::ShowNextZoomLevel
            }
            mode => mode,
        };

        Some(Self { pixel_ratio, mode })
    }

    /// Pixel ratio of the requested images.
    pub fn tile_pixel_ratio(&self) -> f64 {
        match self.mode {
            HidpiMode::TilePixelRatioOnly => self.pixel_ratio,
            _ => 1.0,
        }
    }

    /// Returns true if the tile grid is shifted to the next zoom level.
    pub fn shows_next_zoom_level(&self) -> bool {
        self.mode != HidpiMode::TilePixelRatioOnly
    }

    /// Returns true if the layer is requested from the substitute source.
    pub fn substitutes_source(&self) -> bool {
        self.mode == HidpiMode::SubstituteLayerShowNextZoomLevel
    }

    /// Applies the policy to the nominal tile grid of the layer.
    pub fn apply(&self, schema: TileSchema) -> TileSchema {
        if self.shows_next_zoom_level() {
            schema.with_next_zoom_level()
        } else {
            schema
        }
    }
}
