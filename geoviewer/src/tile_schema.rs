//! [`TileSchema`] describes the grid of tiles a tile source is requested on.

use std::collections::BTreeSet;

use geoviewer_types::geo::Crs;
use geoviewer_types::{Point2d, Rect};

/// Direction of the Y index of tiles.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VerticalDirection {
    /// Tiles with `Y == 0` are at the top of the grid.
    TopToBottom,
    /// Tiles with `Y == 0` are at the bottom of the grid.
    BottomToTop,
}

/// Tile index.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct TileIndex {
    /// X index.
    pub x: i32,
    /// Y index.
    pub y: i32,
    /// Z index.
    pub z: u32,
}

impl TileIndex {
    /// Create a new index instance.
    pub fn new(x: i32, y: i32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// Level of detail of a tile grid: the resolution (map units per pixel) of the given z-level.
#[derive(Debug, Clone, Copy)]
pub struct Lod {
    resolution: f64,
    z_index: u32,
}

impl Lod {
    /// Creates new level of detail. Returns `None` for zero or not finite resolution.
    pub fn new(resolution: f64, z_index: u32) -> Option<Lod> {
        (resolution.is_finite() && resolution != 0.0).then_some(Self {
            resolution,
            z_index,
        })
    }

    /// Z-index associated with this LOD.
    pub fn z_index(&self) -> u32 {
        self.z_index
    }

    /// Resolution of the LOD.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }
}

impl PartialEq for Lod {
    fn eq(&self, other: &Self) -> bool {
        self.z_index == other.z_index
    }
}

impl Eq for Lod {}

impl PartialOrd for Lod {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Lod {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.z_index.cmp(&other.z_index)
    }
}

/// Tile grid: origin, extent, levels of detail and tile size.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSchema {
    /// Position where all tiles have `X == 0, Y == 0` indices.
    pub origin: Point2d,
    /// Rectangle that contains all tiles of the tile scheme.
    pub bounds: Rect,
    /// Levels of detail ordered by z-index.
    pub lods: BTreeSet<Lod>,
    /// Width of a single tile in pixels.
    pub tile_width: u32,
    /// Height of a single tile in pixels.
    pub tile_height: u32,
    /// Direction of the Y-axis.
    pub y_direction: VerticalDirection,
    /// Crs of the scheme.
    pub crs: Crs,
}

impl TileSchema {
    /// Standard Web Mercator based tile scheme (used, for example, by OSM and Google maps).
    pub fn web(lods_count: u32) -> Self {
        const HALF_WIDTH: f64 = 20037508.342787;

        Self::for_extent(
            Rect::new(-HALF_WIDTH, -HALF_WIDTH, HALF_WIDTH, HALF_WIDTH),
            256,
            lods_count,
            Crs::EPSG3857,
        )
    }

    /// Grid covering `extent` with the top-left origin. The top level fits the larger side of the
    /// extent into one tile, every next level halves the resolution.
    pub fn for_extent(extent: Rect, tile_size: u32, lods_count: u32, crs: Crs) -> Self {
        let top_resolution = extent.width().max(extent.height()) / tile_size.max(1) as f64;
        let lods = (0..lods_count)
            .filter_map(|z| Lod::new(top_resolution / 2f64.powi(z as i32), z))
            .collect();

        Self {
            origin: Point2d::new(extent.x_min(), extent.y_max()),
            bounds: extent,
            lods,
            tile_width: tile_size,
            tile_height: tile_size,
            y_direction: VerticalDirection::TopToBottom,
            crs,
        }
    }

    /// Grid with explicitly given resolutions (ordered from the top level down), e.g. as read
    /// from WMTS capabilities.
    pub fn with_resolutions(
        origin: Point2d,
        bounds: Rect,
        resolutions: &[f64],
        tile_size: u32,
        crs: Crs,
    ) -> Self {
        Self {
            origin,
            bounds,
            lods: resolutions
                .iter()
                .zip(0..)
                .filter_map(|(resolution, z)| Lod::new(*resolution, z))
                .collect(),
            tile_width: tile_size,
            tile_height: tile_size,
            y_direction: VerticalDirection::TopToBottom,
            crs,
        }
    }

    /// Makes the backend request tiles of the next zoom level for every nominal tile: the tile
    /// size is halved, then every resolution is doubled.
    pub fn with_next_zoom_level(mut self) -> Self {
        self.tile_width /= 2;
        self.tile_height /= 2;
        self.lods = self
            .lods
            .iter()
            .filter_map(|lod| Lod::new(lod.resolution() * 2.0, lod.z_index()))
            .collect();
        self
    }

    /// Resolution of the given z-level, if exists.
    pub fn lod_resolution(&self, z: u32) -> Option<f64> {
        self.lods
            .iter()
            .find(|lod| lod.z_index() == z)
            .map(Lod::resolution)
    }

    /// Resolutions of all levels ordered by z-index.
    pub fn resolutions(&self) -> Vec<f64> {
        self.lods.iter().map(Lod::resolution).collect()
    }

    /// Width of a single tile.
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Height of a single tile.
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Select the most detailed level whose resolution is not finer than the given one.
    pub fn select_lod(&self, resolution: f64) -> Option<Lod> {
        if !resolution.is_finite() {
            return None;
        }

        let mut selected = *self.lods.iter().next()?;
        for lod in self.lods.iter().skip(1) {
            if lod.resolution() < resolution * (1.0 - RESOLUTION_TOLERANCE) {
                break;
            }

            selected = *lod;
        }

        Some(selected)
    }

    /// Indices of the tiles of the level selected for `resolution` that intersect `bbox`.
    pub fn iter_tiles(&self, resolution: f64, bbox: Rect) -> Option<impl Iterator<Item = TileIndex>> {
        let lod = self.select_lod(resolution)?;
        let tile_w = lod.resolution() * self.tile_width as f64;
        let tile_h = lod.resolution() * self.tile_height as f64;

        let clipped = Rect::new(
            bbox.x_min().max(self.bounds.x_min()),
            bbox.y_min().max(self.bounds.y_min()),
            bbox.x_max().min(self.bounds.x_max()),
            bbox.y_max().min(self.bounds.y_max()),
        );
        let empty = bbox.x_max() <= self.bounds.x_min()
            || bbox.x_min() >= self.bounds.x_max()
            || bbox.y_max() <= self.bounds.y_min()
            || bbox.y_min() >= self.bounds.y_max();

        let x_min = ((clipped.x_min() - self.origin.x) / tile_w).floor() as i32;
        let x_max = ((clipped.x_max() - self.origin.x) / tile_w).ceil() as i32 - 1;
        let (y_from, y_to) = match self.y_direction {
            VerticalDirection::TopToBottom => (
                self.origin.y - clipped.y_max(),
                self.origin.y - clipped.y_min(),
            ),
            VerticalDirection::BottomToTop => (
                clipped.y_min() - self.origin.y,
                clipped.y_max() - self.origin.y,
            ),
        };
        let y_min = (y_from / tile_h).floor() as i32;
        let y_max = (y_to / tile_h).ceil() as i32 - 1;

        let (x_max, y_max) = if empty { (x_min - 1, y_min - 1) } else { (x_max, y_max) };
        let z = lod.z_index();

        Some(
            (x_min..=x_max)
                .flat_map(move |x| (y_min..=y_max).map(move |y| TileIndex::new(x, y, z))),
        )
    }

    /// Bounding box of the tile.
    pub fn tile_bbox(&self, index: TileIndex) -> Option<Rect> {
        let resolution = self.lod_resolution(index.z)?;
        let width = self.tile_width as f64 * resolution;
        let height = self.tile_height as f64 * resolution;

        let x_min = self.origin.x + index.x as f64 * width;
        let y_min = match self.y_direction {
            VerticalDirection::TopToBottom => self.origin.y - (index.y + 1) as f64 * height,
            VerticalDirection::BottomToTop => self.origin.y + index.y as f64 * height,
        };

        Some(Rect::new(x_min, y_min, x_min + width, y_min + height))
    }
}

const RESOLUTION_TOLERANCE: f64 = 0.01;

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn simple_schema() -> TileSchema {
        TileSchema {
            origin: Point2d::new(0.0, 0.0),
            bounds: Rect::new(0.0, 0.0, 2048.0, 2048.0),
            lods: [
                Lod::new(8.0, 0).unwrap(),
                Lod::new(4.0, 1).unwrap(),
                Lod::new(2.0, 2).unwrap(),
            ]
            .into(),
            tile_width: 256,
            tile_height: 256,
            y_direction: VerticalDirection::BottomToTop,
            crs: Crs::EPSG3857,
        }
    }

    #[test]
    fn next_zoom_level_halves_tiles_and_doubles_resolutions() {
        let schema = TileSchema::with_resolutions(
            Point2d::new(0.0, 0.0),
            Rect::new(0.0, 0.0, 1.0, 1.0),
            &[1000.0, 500.0],
            256,
            Crs::EPSG3857,
        )
        .with_next_zoom_level();

        assert_eq!(schema.tile_width(), 128);
        assert_eq!(schema.tile_height(), 128);
        assert_eq!(schema.resolutions(), vec![2000.0, 1000.0]);
    }

    #[test]
    fn select_lod() {
        let schema = simple_schema();
        assert_eq!(schema.select_lod(8.0).unwrap().z_index(), 0);
        assert_eq!(schema.select_lod(16.0).unwrap().z_index(), 0);
        assert_eq!(schema.select_lod(7.5).unwrap().z_index(), 0);
        assert_eq!(schema.select_lod(4.0).unwrap().z_index(), 1);
        assert_eq!(schema.select_lod(1.0).unwrap().z_index(), 2);
        assert!(schema.select_lod(f64::NAN).is_none());
    }

    #[test]
    fn iter_tiles_over_full_bbox() {
        let schema = simple_schema();
        let bbox = Rect::new(0.0, 0.0, 2048.0, 2048.0);
        assert_eq!(schema.iter_tiles(8.0, bbox).unwrap().count(), 1);
        assert_eq!(schema.iter_tiles(4.0, bbox).unwrap().count(), 4);
        assert_eq!(schema.iter_tiles(2.0, bbox).unwrap().count(), 16);
    }

    #[test]
    fn iter_tiles_outside_of_bounds() {
        let schema = simple_schema();
        let bbox = Rect::new(-100.0, -100.0, -50.0, -50.0);
        assert_eq!(schema.iter_tiles(2.0, bbox).unwrap().count(), 0);
    }

    #[test]
    fn web_schema_tile_bbox() {
        let schema = TileSchema::web(18);
        let bbox = schema.tile_bbox(TileIndex::new(0, 0, 0)).unwrap();
        assert_relative_eq!(bbox.x_min(), -20037508.342787, epsilon = 1e-6);
        assert_relative_eq!(bbox.y_max(), 20037508.342787, epsilon = 1e-6);
        assert_relative_eq!(
            schema.lod_resolution(0).unwrap(),
            156543.03392800014,
            epsilon = 1e-6
        );
    }
}
