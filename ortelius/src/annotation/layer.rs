//! Map layer that owns the annotation state and binds it into the style document.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ortelius_types::cartesian::{Point2d, Rect};
use ortelius_types::geo::WebMercator;

use crate::annotation::{
    Annotation, AnnotationId, AnnotationStore, AnnotationTile, Icon, IconRegistry,
    SpatialQueryIndex, TileAnnotationIndex, UpdateScheduler,
};
use crate::decoded_image::DecodedImage;
use crate::error::OrteliusError;
use crate::messenger::Messenger;
use crate::style::{LayerPaint, Style, StyleLayer};
use crate::tile_schema::{TileIndex, TileSchema};
use crate::view::MapView;

/// Id of the synthetic style source all annotation layers draw from.
pub const ANNOTATION_SOURCE_ID: &str = "ortelius-annotations";

/// Id of the synthetic style layer that paints all marker annotations.
pub const POINT_LAYER_ID: &str = "ortelius-annotations-points";

const SHAPE_LAYER_PREFIX: &str = "ortelius-annotations-shape-";

/// How far outside a tile, in tile pixels, annotation geometry can still affect the rendered
/// image. Covers the largest marker footprint that can bleed across a tile edge.
const REGION_BUFFER_PX: f64 = 32.0;

/// Id of the synthetic style layer that paints the shape annotation with the given id.
pub fn shape_layer_id(id: AnnotationId) -> String {
    format!("{SHAPE_LAYER_PREFIX}{}", id.as_u64())
}

/// Counters describing what one render pass did with the annotation tile cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// Generation of the annotation state the pass rendered.
    pub generation: u64,
    /// Number of tiles regenerated during the pass.
    pub tiles_regenerated: usize,
    /// Number of cached tiles reused without regeneration.
    pub tiles_reused: usize,
    /// Number of cached tiles dropped because they left the viewport.
    pub tiles_evicted: usize,
}

/// Layer that renders user annotations on top of the map.
///
/// The layer owns the [`AnnotationStore`], the [`IconRegistry`] and a cache of generated
/// [`AnnotationTile`]s. Mutations only record what changed; the actual tile regeneration is
/// deferred to [`AnnotationLayer::render`], so any number of mutations between two passes costs
/// at most one regeneration per affected tile.
///
/// The layer is not a style layer itself. Instead it injects a synthetic source and synthetic
/// layers into the [`Style`] it is rendered with, one layer per shape annotation plus a shared
/// layer for all markers. Switching to a new style document therefore does not lose annotations:
/// the next pass injects them into the new document.
pub struct AnnotationLayer {
    store: AnnotationStore,
    icons: IconRegistry,
    scheduler: UpdateScheduler,
    tiles: HashMap<TileIndex, AnnotationTile, ahash::RandomState>,
    spatial_index: SpatialQueryIndex,
    schema: TileSchema,
    messenger: Option<Arc<dyn Messenger>>,
}

impl std::fmt::Debug for AnnotationLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationLayer")
            .field("annotations", &self.store.len())
            .field("tiles", &self.tiles.len())
            .field("generation", &self.scheduler.generation())
            .finish()
    }
}

impl AnnotationLayer {
    /// Creates an empty layer over the given tile schema.
    pub fn new(schema: TileSchema) -> Self {
        Self {
            store: AnnotationStore::new(),
            icons: IconRegistry::new(),
            scheduler: UpdateScheduler::new(),
            tiles: HashMap::default(),
            spatial_index: SpatialQueryIndex::default(),
            schema,
            messenger: None,
        }
    }

    /// Sets the messenger used to notify the application about changes to the rendered image.
    pub fn set_messenger(&mut self, messenger: Arc<dyn Messenger>) {
        self.messenger = Some(messenger);
    }

    /// Adds an annotation and returns the id allocated for it.
    ///
    /// The annotation does not appear in rendered output or query results until the next render
    /// pass.
    pub fn add_annotation(&mut self, annotation: Annotation) -> AnnotationId {
        if let Some(icon) = annotation.icon_name() {
            self.icons.retain_name(icon);
        }
        mark_bounds(&mut self.scheduler, &annotation);
        let id = self.store.add(annotation);
        self.notify();
        id
    }

    /// Replaces the annotation stored under the given id.
    ///
    /// The replacement may change the annotation variant. Both the previous and the new extent of
    /// the annotation are scheduled for regeneration.
    pub fn update_annotation(
        &mut self,
        id: AnnotationId,
        annotation: Annotation,
    ) -> Result<(), OrteliusError> {
        let new_icon = annotation.icon_name().map(String::from);
        let previous = self.store.update(id, annotation)?;

        if let Some(icon) = previous.icon_name() {
            self.icons.release_name(icon);
        }
        if let Some(icon) = &new_icon {
            self.icons.retain_name(icon);
        }

        mark_bounds(&mut self.scheduler, &previous);
        if let Some(current) = self.store.get(id) {
            if let Some(bounds) = current.projected_bounds(&WebMercator) {
                self.scheduler.mark_region(bounds);
            }
        }

        self.notify();
        Ok(())
    }

    /// Removes the annotation with the given id. Removing an unknown id is a no-op.
    pub fn remove_annotation(&mut self, id: AnnotationId) {
        let Some(previous) = self.store.remove(id) else {
            return;
        };

        if let Some(icon) = previous.icon_name() {
            self.icons.release_name(icon);
        }
        mark_bounds(&mut self.scheduler, &previous);
        self.notify();
    }

    /// Returns the annotation stored under the given id.
    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.store.get(id)
    }

    /// Number of annotations in the layer.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if the layer contains no annotations.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Registers an icon under the given name, replacing any previous icon with that name.
    ///
    /// If the name is referenced by existing annotations, their tiles are scheduled for
    /// regeneration, so replacing an icon re-renders its markers without touching the
    /// annotations themselves.
    pub fn add_icon(&mut self, name: &str, image: DecodedImage, pixel_ratio: f32) {
        let replaced = self.icons.add_icon(name, image, pixel_ratio);
        if replaced || self.store.references_icon(name) {
            self.scheduler.mark_icon(name);
            self.notify();
        }
    }

    /// Removes the icon with the given name.
    ///
    /// Annotations referencing the name stay in the layer and render without a glyph until an
    /// icon with the same name is registered again.
    pub fn remove_icon(&mut self, name: &str) {
        if self.icons.remove_icon(name) && self.store.references_icon(name) {
            self.scheduler.mark_icon(name);
            self.notify();
        }
    }

    /// Returns the icon registered under the given name.
    pub fn icon(&self, name: &str) -> Option<&Icon> {
        self.icons.get(name)
    }

    /// Schedules regeneration of all annotation tiles.
    ///
    /// Normal mutations schedule their own regeneration, so this is only needed when the host
    /// changed something the layer cannot observe, such as replacing the style document.
    pub fn request_update(&mut self) {
        self.scheduler.mark_all();
        self.notify();
    }

    /// Runs one render pass: regenerates affected tiles, injects annotation layers into the
    /// style and rebuilds the screen-space query index.
    pub fn render(&mut self, view: &MapView, style: &mut Style) -> PassSummary {
        let visible: Vec<TileIndex> = match self.schema.iter_tiles(view) {
            Some(iter) => iter.collect(),
            None => Vec::new(),
        };

        let visible_set: HashSet<TileIndex, ahash::RandomState> =
            visible.iter().copied().collect();
        let gone: Vec<TileIndex> = self
            .tiles
            .keys()
            .filter(|index| !visible_set.contains(index))
            .copied()
            .collect();
        for index in &gone {
            self.tiles.remove(index);
            self.scheduler.forget_tile(index);
        }
        let evicted = gone.len();

        self.resolve_pending();

        let generation = self.scheduler.generation();
        let tiler = TileAnnotationIndex::new(&self.store, &self.icons, &self.schema);

        let mut regenerated = 0;
        let mut reused = 0;
        for index in &visible {
            if self.tiles.contains_key(index) && !self.scheduler.is_tile_dirty(index) {
                reused += 1;
                continue;
            }

            let Some(entries) = tiler.generate(*index) else {
                continue;
            };
            if self.scheduler.commit_tile(*index, generation) {
                self.tiles.insert(
                    *index,
                    AnnotationTile {
                        index: *index,
                        generation,
                        entries,
                    },
                );
                regenerated += 1;
            }
        }

        self.sync_style(style);
        self.spatial_index = SpatialQueryIndex::build(self.tiles.values(), &self.schema, view, style);

        PassSummary {
            generation,
            tiles_regenerated: regenerated,
            tiles_reused: reused,
            tiles_evicted: evicted,
        }
    }

    /// Ids of annotations rendered at the given screen point during the latest render pass.
    pub fn query_screen_point(&self, point: &Point2d) -> Vec<AnnotationId> {
        self.spatial_index.query_point(point)
    }

    /// Ids of annotations whose rendered extent intersects the given screen rectangle.
    pub fn query_screen_box(&self, rect: &Rect) -> Vec<AnnotationId> {
        self.spatial_index.query_box(rect)
    }

    /// Iterates over the cached annotation tiles of the latest render pass.
    pub fn tiles(&self) -> impl Iterator<Item = &AnnotationTile> {
        self.tiles.values()
    }

    /// Returns the cached tile with the given index, if it was generated by the latest passes.
    pub fn tile(&self, index: TileIndex) -> Option<&AnnotationTile> {
        self.tiles.get(&index)
    }

    /// Converts pending mutation events into per-tile dirty flags.
    fn resolve_pending(&mut self) {
        let pending = self.scheduler.take_pending();
        if pending.is_empty() {
            return;
        }

        let cached: Vec<TileIndex> = self.tiles.keys().copied().collect();

        if pending.rebuild_all {
            for index in cached {
                self.scheduler.mark_tile_dirty(index);
            }
            return;
        }

        let mut regions = pending.regions;
        for name in &pending.icons {
            for (_, annotation) in self.store.iter_referencing_icon(name) {
                if let Some(bounds) = annotation.projected_bounds(&WebMercator) {
                    regions.push(bounds);
                }
            }
        }

        for index in cached {
            let Some(bbox) = self.schema.tile_bbox(index) else {
                continue;
            };
            let Some(resolution) = self.schema.lod_resolution(index.z) else {
                continue;
            };

            let buffered = bbox.expand(REGION_BUFFER_PX * resolution);
            if regions.iter().any(|region| region.intersects(&buffered)) {
                self.scheduler.mark_tile_dirty(index);
            }
        }
    }

    /// Brings the synthetic annotation source and layers of the style in sync with the store.
    fn sync_style(&self, style: &mut Style) {
        style.ensure_source(ANNOTATION_SOURCE_ID);

        let orphaned: Vec<String> = style
            .layers()
            .iter()
            .filter_map(|layer| {
                let suffix = layer.id().strip_prefix(SHAPE_LAYER_PREFIX)?;
                let id = suffix.parse::<u64>().ok()?;
                match self.store.get(AnnotationId::new(id)) {
                    Some(Annotation::Line(_) | Annotation::Fill(_)) => None,
                    _ => Some(layer.id().to_string()),
                }
            })
            .collect();
        for id in orphaned {
            style.remove_layer(&id);
        }

        // Markers are painted above all shapes, so the point layer must stay on top of every
        // shape layer. It is re-appended after the shape layers are synced.
        let had_point_layer = style.remove_layer(POINT_LAYER_ID).is_some();

        let mut has_symbols = false;
        for id in self.store.ordered_ids() {
            let Some(annotation) = self.store.get(id) else {
                continue;
            };

            let paint = match annotation {
                Annotation::Symbol(_) => {
                    has_symbols = true;
                    continue;
                }
                Annotation::Line(line) => LayerPaint::Line {
                    color: line.color,
                    width: line.width,
                    opacity: line.opacity,
                },
                Annotation::Fill(fill) => LayerPaint::Fill {
                    color: fill.color,
                    opacity: fill.opacity,
                    outline_color: fill.outline_color,
                },
                // Style-sourced shapes are painted by the layer they reference, which is owned
                // by the style document itself.
                Annotation::StyleSourced(_) => continue,
            };

            let layer_id = shape_layer_id(id);
            match style.layer(&layer_id) {
                Some(layer) if *layer.paint() == paint => {}
                Some(_) => {
                    style.remove_layer(&layer_id);
                    style.add_layer(
                        StyleLayer::new(layer_id.as_str(), paint)
                            .with_source(ANNOTATION_SOURCE_ID),
                    );
                }
                None => style.add_layer(
                    StyleLayer::new(layer_id.as_str(), paint).with_source(ANNOTATION_SOURCE_ID),
                ),
            }
        }

        if has_symbols || had_point_layer {
            style.add_layer(
                StyleLayer::new(POINT_LAYER_ID, LayerPaint::Symbol)
                    .with_source(ANNOTATION_SOURCE_ID),
            );
        }
    }

    fn notify(&self) {
        if let Some(messenger) = &self.messenger {
            messenger.request_redraw();
        }
    }
}

fn mark_bounds(scheduler: &mut UpdateScheduler, annotation: &Annotation) {
    if let Some(bounds) = annotation.projected_bounds(&WebMercator) {
        scheduler.mark_region(bounds);
    }
}
