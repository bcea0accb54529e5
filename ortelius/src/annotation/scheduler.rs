//! Dirty tracking and regeneration scheduling for annotation tiles.

use std::collections::HashSet;

use ortelius_types::cartesian::Rect;

use crate::tile_schema::TileIndex;

/// Tracks which annotation tiles must be regenerated before the next render pass.
///
/// Mutations do not regenerate anything by themselves. They only record what was affected:
/// a projected bounding region, an icon name, or everything at once. The pending events are
/// consumed once per render pass, so any number of mutations between two passes collapses into
/// at most one regeneration per affected tile.
///
/// The scheduler also owns the global generation counter. Every recorded event bumps it, and a
/// regenerated tile is committed only if the generation it was built from is still current, so a
/// result that raced with a later mutation is discarded and the tile stays dirty.
#[derive(Debug, Default)]
pub struct UpdateScheduler {
    generation: u64,
    rebuild_all: bool,
    regions: Vec<Rect>,
    icons: Vec<String>,
    dirty_tiles: HashSet<TileIndex, ahash::RandomState>,
}

/// Mutation events accumulated since the previous render pass.
#[derive(Debug, Default)]
pub struct PendingUpdates {
    /// All tile content must be discarded and rebuilt (style switch or explicit update request).
    pub rebuild_all: bool,
    /// Projected regions whose tiles must be regenerated.
    pub regions: Vec<Rect>,
    /// Icon names whose referencing annotations must be regenerated.
    pub icons: Vec<String>,
}

impl PendingUpdates {
    /// Returns true if nothing was recorded since the previous pass.
    pub fn is_empty(&self) -> bool {
        !self.rebuild_all && self.regions.is_empty() && self.icons.is_empty()
    }
}

impl UpdateScheduler {
    /// Creates a scheduler with no pending events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation. Incremented by every recorded mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Records that annotation content within the given projected region changed.
    pub fn mark_region(&mut self, region: Rect) {
        self.generation += 1;
        if !self.rebuild_all {
            self.regions.push(region);
        }
    }

    /// Records that the icon with the given name changed.
    pub fn mark_icon(&mut self, name: &str) {
        self.generation += 1;
        if !self.rebuild_all && !self.icons.iter().any(|n| n == name) {
            self.icons.push(name.to_string());
        }
    }

    /// Records that all annotation tile content must be rebuilt.
    pub fn mark_all(&mut self) {
        self.generation += 1;
        self.rebuild_all = true;
        self.regions.clear();
        self.icons.clear();
    }

    /// Takes all events accumulated since the previous pass, leaving the scheduler clean.
    pub fn take_pending(&mut self) -> PendingUpdates {
        PendingUpdates {
            rebuild_all: std::mem::take(&mut self.rebuild_all),
            regions: std::mem::take(&mut self.regions),
            icons: std::mem::take(&mut self.icons),
        }
    }

    /// Marks a single tile as needing regeneration.
    pub fn mark_tile_dirty(&mut self, index: TileIndex) {
        self.dirty_tiles.insert(index);
    }

    /// Returns true if the given tile was marked dirty and not committed since.
    pub fn is_tile_dirty(&self, index: &TileIndex) -> bool {
        self.dirty_tiles.contains(index)
    }

    /// Forgets the dirty flag of a single tile. Used when the tile is dropped from the cache, so
    /// flags of evicted tiles do not linger.
    pub fn forget_tile(&mut self, index: &TileIndex) {
        self.dirty_tiles.remove(index);
    }

    /// Commits a regenerated tile built from the given generation.
    ///
    /// Returns false if the generation is stale, in which case the result must be discarded and
    /// the tile stays dirty so it is retried on the next pass.
    pub fn commit_tile(&mut self, index: TileIndex, generation: u64) -> bool {
        if generation != self.generation {
            log::trace!(
                "discarding stale tile {index:?}: built from generation {generation}, current is {}",
                self.generation
            );
            return false;
        }

        self.dirty_tiles.remove(&index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mutation_bumps_generation() {
        let mut scheduler = UpdateScheduler::new();
        scheduler.mark_region(Rect::new(0.0, 0.0, 1.0, 1.0));
        scheduler.mark_icon("marker");
        scheduler.mark_all();
        assert_eq!(scheduler.generation(), 3);
    }

    #[test]
    fn mutations_coalesce_into_one_pending_set() {
        let mut scheduler = UpdateScheduler::new();
        scheduler.mark_region(Rect::new(0.0, 0.0, 1.0, 1.0));
        scheduler.mark_region(Rect::new(2.0, 2.0, 3.0, 3.0));
        scheduler.mark_icon("marker");
        scheduler.mark_icon("marker");

        let pending = scheduler.take_pending();
        assert_eq!(pending.regions.len(), 2);
        assert_eq!(pending.icons.len(), 1);
        assert!(!pending.rebuild_all);

        assert!(scheduler.take_pending().is_empty());
    }

    #[test]
    fn mark_all_subsumes_finer_events() {
        let mut scheduler = UpdateScheduler::new();
        scheduler.mark_region(Rect::new(0.0, 0.0, 1.0, 1.0));
        scheduler.mark_all();
        scheduler.mark_region(Rect::new(2.0, 2.0, 3.0, 3.0));

        let pending = scheduler.take_pending();
        assert!(pending.rebuild_all);
        assert!(pending.regions.is_empty());
    }

    #[test]
    fn stale_commit_is_rejected() {
        let mut scheduler = UpdateScheduler::new();
        let tile = TileIndex::new(0, 0, 0);
        scheduler.mark_tile_dirty(tile);

        let generation = scheduler.generation();
        scheduler.mark_region(Rect::new(0.0, 0.0, 1.0, 1.0));

        assert!(!scheduler.commit_tile(tile, generation));
        assert!(scheduler.is_tile_dirty(&tile));

        assert!(scheduler.commit_tile(tile, scheduler.generation()));
        assert!(!scheduler.is_tile_dirty(&tile));
    }

    #[test]
    fn forgotten_tile_is_no_longer_dirty() {
        let mut scheduler = UpdateScheduler::new();
        let tile = TileIndex::new(1, 1, 1);
        scheduler.mark_tile_dirty(tile);
        assert!(scheduler.is_tile_dirty(&tile));

        scheduler.forget_tile(&tile);
        assert!(!scheduler.is_tile_dirty(&tile));
    }
}
