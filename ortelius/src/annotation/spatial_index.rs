//! Screen-space index of rendered annotations for hit-testing.

use std::collections::HashSet;

use ortelius_types::cartesian::{Point2d, Rect};
use ortelius_types::{Contour, Polygon};

use crate::annotation::{AnnotationId, AnnotationTile, TileGeometry, TilePrimitive};
use crate::style::{LayerPaint, Style};
use crate::tile_schema::TileSchema;
use crate::view::MapView;

/// Half-width used for hit-testing delegated lines whose style layer cannot be resolved.
const DEFAULT_DELEGATE_HALF_WIDTH: f64 = 2.0;

/// Index of rendered annotation geometry in screen coordinates.
///
/// The index is built as a byproduct of tile regeneration and reflects the most recent completed
/// render pass, not uncommitted store mutations: callers must render before querying to observe
/// their latest changes. It is fully replaced on every pass and never patched incrementally.
#[derive(Debug, Default)]
pub struct SpatialQueryIndex {
    features: Vec<ScreenFeature>,
}

#[derive(Debug)]
struct ScreenFeature {
    id: AnnotationId,
    // Markers are painted above shapes; higher class is on top.
    class: u8,
    z_order: f32,
    bbox: Rect,
    shape: ScreenShape,
}

#[derive(Debug)]
enum ScreenShape {
    Marker {
        position: Point2d,
        half_width: f64,
        half_height: f64,
    },
    Stroke {
        line: Contour<Point2d>,
        half_width: f64,
    },
    Shape {
        polygon: Polygon<Point2d>,
    },
}

impl SpatialQueryIndex {
    /// Tolerance in pixels applied to point queries.
    pub const POINT_TOLERANCE_PX: f64 = 2.0;

    /// Builds the index from the tiles consumed by the current render pass.
    pub fn build<'a>(
        tiles: impl IntoIterator<Item = &'a AnnotationTile>,
        schema: &TileSchema,
        view: &MapView,
        style: &Style,
    ) -> Self {
        let mut features = Vec::new();

        for tile in tiles {
            let Some(bbox) = schema.tile_bbox(tile.index) else {
                continue;
            };
            let Some(resolution) = schema.lod_resolution(tile.index.z) else {
                continue;
            };

            let to_screen = |p: &Point2d| {
                let map_point = Point2d::new(
                    bbox.x_min() + p.x * resolution,
                    bbox.y_max() - p.y * resolution,
                );
                view.map_to_screen(&map_point)
            };
            // Tile geometry is in tile pixels, screen geometry in screen pixels.
            let pixel_scale = resolution / view.resolution();

            for entry in &tile.entries {
                let Some(feature) = Self::index_entry(entry.id, &entry.primitive, &to_screen, pixel_scale, style)
                else {
                    continue;
                };
                features.push(feature);
            }
        }

        Self { features }
    }

    fn index_entry(
        id: AnnotationId,
        primitive: &TilePrimitive,
        to_screen: &impl Fn(&Point2d) -> Point2d,
        pixel_scale: f64,
        style: &Style,
    ) -> Option<ScreenFeature> {
        match primitive {
            TilePrimitive::Marker {
                position,
                glyph,
                z_order,
                ..
            } => {
                let position = to_screen(position);
                // Icon footprints are defined in screen pixels, not tile pixels, so they are not
                // scaled together with the tile geometry.
                let (half_width, half_height) = match glyph {
                    Some(glyph) => (f64::from(glyph.width) / 2.0, f64::from(glyph.height) / 2.0),
                    None => (0.0, 0.0),
                };
                Some(ScreenFeature {
                    id,
                    class: 1,
                    z_order: *z_order,
                    bbox: Rect::new(
                        position.x - half_width,
                        position.y - half_height,
                        position.x + half_width,
                        position.y + half_height,
                    ),
                    shape: ScreenShape::Marker {
                        position,
                        half_width,
                        half_height,
                    },
                })
            }
            TilePrimitive::Stroke { line, width, .. } => {
                Self::index_stroke(id, line, width / 2.0 * pixel_scale, to_screen)
            }
            TilePrimitive::Shape { polygon, .. } => Self::index_polygon(id, polygon, to_screen),
            TilePrimitive::Delegate { geometry, layer_id } => match geometry {
                TileGeometry::Line(line) => {
                    let half_width = match style.layer(layer_id).map(|l| l.paint()) {
                        Some(LayerPaint::Line { width, .. }) => width / 2.0 * pixel_scale,
                        _ => DEFAULT_DELEGATE_HALF_WIDTH,
                    };
                    Self::index_stroke(id, line, half_width, to_screen)
                }
                TileGeometry::Polygon(polygon) => Self::index_polygon(id, polygon, to_screen),
            },
        }
    }

    fn index_stroke(
        id: AnnotationId,
        line: &Contour<Point2d>,
        half_width: f64,
        to_screen: &impl Fn(&Point2d) -> Point2d,
    ) -> Option<ScreenFeature> {
        let line = line.try_map_points(|p| Some(to_screen(p)))?;
        let bbox = line.bounding_rect()?.expand(half_width);
        Some(ScreenFeature {
            id,
            class: 0,
            z_order: 0.0,
            bbox,
            shape: ScreenShape::Stroke { line, half_width },
        })
    }

    fn index_polygon(
        id: AnnotationId,
        polygon: &Polygon<Point2d>,
        to_screen: &impl Fn(&Point2d) -> Point2d,
    ) -> Option<ScreenFeature> {
        let polygon = polygon.try_map_points(|p| Some(to_screen(p)))?;
        let bbox = polygon.bounding_rect()?;
        Some(ScreenFeature {
            id,
            class: 0,
            z_order: 0.0,
            bbox,
            shape: ScreenShape::Shape { polygon },
        })
    }

    /// Ids of annotations rendered at the given screen point.
    ///
    /// The result is deduplicated (an annotation spanning several tiles is reported once) and
    /// ordered topmost first, matching the paint order of the latest render pass.
    pub fn query_point(&self, point: &Point2d) -> Vec<AnnotationId> {
        let tolerance = Self::POINT_TOLERANCE_PX;
        self.collect_hits(|feature| match &feature.shape {
            ScreenShape::Marker {
                position,
                half_width,
                half_height,
            } => {
                (point.x - position.x).abs() <= half_width + tolerance
                    && (point.y - position.y).abs() <= half_height + tolerance
            }
            ScreenShape::Stroke { line, half_width } => line
                .distance_to_point_sq(point)
                .is_some_and(|d| d <= (half_width + tolerance) * (half_width + tolerance)),
            ScreenShape::Shape { polygon } => polygon.contains_point(point),
        })
    }

    /// Ids of annotations whose rendered extent intersects the given screen rectangle.
    ///
    /// The test is performed against feature bounding boxes, which is the usual precision for
    /// box selection. Ordering and deduplication are the same as for [`Self::query_point`].
    pub fn query_box(&self, rect: &Rect) -> Vec<AnnotationId> {
        self.collect_hits(|feature| feature.bbox.intersects(rect))
    }

    /// Returns true if the index contains no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    fn collect_hits(&self, hit: impl Fn(&ScreenFeature) -> bool) -> Vec<AnnotationId> {
        let mut hits: Vec<&ScreenFeature> = self.features.iter().filter(|f| hit(f)).collect();
        hits.sort_by(|a, b| {
            b.class
                .cmp(&a.class)
                .then(b.z_order.total_cmp(&a.z_order))
                .then(b.id.cmp(&a.id))
        });

        let mut seen = HashSet::new();
        hits.into_iter()
            .filter(|f| seen.insert(f.id))
            .map(|f| f.id)
            .collect()
    }
}
