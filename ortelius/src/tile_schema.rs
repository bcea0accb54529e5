//! [`TileSchema`] maps between projected map coordinates and [tile indices](TileIndex).

use ortelius_types::cartesian::{Point2d, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::view::MapView;

/// Tile index.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileIndex {
    /// X index.
    pub x: i32,
    /// Y index.
    pub y: i32,
    /// Z index (zoom level).
    pub z: u32,
}

impl TileIndex {
    /// Creates a new index instance.
    pub fn new(x: i32, y: i32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// Tile schema specifies how tile indices are calculated from projected map coordinates.
///
/// Tiles are indexed top to bottom: the tile with `y == 0` touches the top edge of the schema
/// bounds, matching the standard Web Mercator tile pyramid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileSchema {
    origin: Point2d,
    bounds: Rect,
    top_resolution: f64,
    z_levels: u32,
    tile_size: u32,
}

impl TileSchema {
    const BOUNDARY_TOLERANCE: f64 = 1e-6;

    /// Standard Web Mercator based tile schema (used, for example, by OSM and Google maps).
    pub fn web(z_levels: u32) -> Self {
        const HALF_WORLD: f64 = 20037508.342787;
        const TOP_RESOLUTION: f64 = 156543.03392800014;

        Self {
            origin: Point2d::new(-HALF_WORLD, HALF_WORLD),
            bounds: Rect::new(-HALF_WORLD, -HALF_WORLD, HALF_WORLD, HALF_WORLD),
            top_resolution: TOP_RESOLUTION,
            z_levels,
            tile_size: 256,
        }
    }

    /// Creates a schema with the given parameters.
    pub fn new(
        origin: Point2d,
        bounds: Rect,
        top_resolution: f64,
        z_levels: u32,
        tile_size: u32,
    ) -> Self {
        Self {
            origin,
            bounds,
            top_resolution,
            z_levels,
            tile_size,
        }
    }

    /// Width and height of a single tile in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Bounding rectangle of the whole schema in projected coordinates.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Resolution (map units per pixel) of the given z-level, if it exists in the schema.
    pub fn lod_resolution(&self, z: u32) -> Option<f64> {
        if z >= self.z_levels {
            return None;
        }

        Some(self.top_resolution / (1u64 << z) as f64)
    }

    /// Selects the z-level with the resolution closest to the given one.
    pub fn select_z(&self, resolution: f64) -> Option<u32> {
        if !resolution.is_finite() || resolution <= 0.0 || self.z_levels == 0 {
            return None;
        }

        let z = (self.top_resolution / resolution).log2().round();
        Some((z.max(0.0) as u32).min(self.z_levels - 1))
    }

    /// Bounding rectangle of the given tile in projected coordinates.
    pub fn tile_bbox(&self, index: TileIndex) -> Option<Rect> {
        let resolution = self.lod_resolution(index.z)?;
        let span = resolution * self.tile_size as f64;

        let x_min = self.origin.x + index.x as f64 * span;
        let y_max = self.origin.y - index.y as f64 * span;

        Some(Rect::new(x_min, y_max - span, x_min + span, y_max))
    }

    /// Iterates over indices of tiles at the given z-level that intersect the given rectangle.
    pub fn iter_tiles_in_rect(
        &self,
        z: u32,
        rect: Rect,
    ) -> Option<impl Iterator<Item = TileIndex>> {
        let resolution = self.lod_resolution(z)?;
        if rect.is_degenerate() || !rect.intersects(&self.bounds) {
            return None;
        }

        let span = resolution * self.tile_size as f64;
        let max_index = ((1u64 << z) - 1).min(i32::MAX as u64) as i32;

        let x_min = self.first_index(rect.x_min() - self.origin.x, span).max(0);
        let x_max = self
            .last_index(rect.x_max() - self.origin.x, span)
            .min(max_index);
        let y_min = self.first_index(self.origin.y - rect.y_max(), span).max(0);
        let y_max = self
            .last_index(self.origin.y - rect.y_min(), span)
            .min(max_index);

        Some((x_min..=x_max).flat_map(move |x| (y_min..=y_max).map(move |y| TileIndex::new(x, y, z))))
    }

    /// Iterates over indices of tiles that should be displayed for the given map view.
    pub fn iter_tiles(&self, view: &MapView) -> Option<impl Iterator<Item = TileIndex>> {
        let z = self.select_z(view.resolution())?;
        self.iter_tiles_in_rect(z, view.bbox()?)
    }

    fn first_index(&self, offset: f64, span: f64) -> i32 {
        (offset / span).floor() as i32
    }

    fn last_index(&self, offset: f64, span: f64) -> i32 {
        let index = (offset / span).floor();
        // A coordinate lying exactly on a tile edge belongs to the previous tile only.
        if offset / span - index < Self::BOUNDARY_TOLERANCE {
            index as i32 - 1
        } else {
            index as i32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_schema() -> TileSchema {
        TileSchema::new(
            Point2d::new(0.0, 2048.0),
            Rect::new(0.0, 0.0, 2048.0, 2048.0),
            8.0,
            3,
            256,
        )
    }

    #[test]
    fn lod_resolution() {
        let schema = simple_schema();
        assert_eq!(schema.lod_resolution(0), Some(8.0));
        assert_eq!(schema.lod_resolution(1), Some(4.0));
        assert_eq!(schema.lod_resolution(2), Some(2.0));
        assert_eq!(schema.lod_resolution(3), None);
    }

    #[test]
    fn select_z() {
        let schema = simple_schema();
        assert_eq!(schema.select_z(8.0), Some(0));
        assert_eq!(schema.select_z(16.0), Some(0));
        assert_eq!(schema.select_z(4.0), Some(1));
        assert_eq!(schema.select_z(2.0), Some(2));
        assert_eq!(schema.select_z(0.5), Some(2));
        assert_eq!(schema.select_z(0.0), None);
    }

    #[test]
    fn tile_bbox() {
        let schema = simple_schema();
        assert_eq!(
            schema.tile_bbox(TileIndex::new(0, 0, 0)),
            Some(Rect::new(0.0, 0.0, 2048.0, 2048.0))
        );
        assert_eq!(
            schema.tile_bbox(TileIndex::new(1, 0, 1)),
            Some(Rect::new(1024.0, 1024.0, 2048.0, 2048.0))
        );
        assert_eq!(
            schema.tile_bbox(TileIndex::new(0, 1, 1)),
            Some(Rect::new(0.0, 0.0, 1024.0, 1024.0))
        );
    }

    #[test]
    fn tiles_in_rect() {
        let schema = simple_schema();
        let all: Vec<_> = schema
            .iter_tiles_in_rect(1, Rect::new(0.0, 0.0, 2048.0, 2048.0))
            .expect("rect is within schema bounds")
            .collect();
        assert_eq!(all.len(), 4);

        let partial: Vec<_> = schema
            .iter_tiles_in_rect(2, Rect::new(200.0, 700.0, 1200.0, 1100.0))
            .expect("rect is within schema bounds")
            .collect();
        assert_eq!(partial.len(), 6);
        for index in &partial {
            assert!(index.x >= 0 && index.x <= 2);
            assert!(index.y >= 1 && index.y <= 2);
        }

        assert!(schema
            .iter_tiles_in_rect(0, Rect::new(-100.0, -100.0, -50.0, -50.0))
            .is_none());
    }

    #[test]
    fn tiles_in_rect_boundary() {
        let schema = simple_schema();
        // Rect touching a tile edge exactly must not include the next tile column.
        let tiles: Vec<_> = schema
            .iter_tiles_in_rect(1, Rect::new(0.0, 0.0, 1024.0, 1024.0))
            .expect("rect is within schema bounds")
            .collect();
        assert_eq!(tiles, vec![TileIndex::new(0, 1, 1)]);
    }

    #[test]
    fn web_schema_covers_world() {
        let schema = TileSchema::web(18);
        let tiles: Vec<_> = schema
            .iter_tiles_in_rect(0, schema.bounds())
            .expect("schema bounds intersect themselves")
            .collect();
        assert_eq!(tiles, vec![TileIndex::new(0, 0, 0)]);
    }
}
