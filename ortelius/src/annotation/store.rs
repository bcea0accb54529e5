//! Authoritative table of annotation entities.

use std::collections::HashMap;

use crate::annotation::{Annotation, AnnotationId};
use crate::error::OrteliusError;

/// Owning store of all annotations added to a map.
///
/// The store is the single source of truth for annotation values. Derived state (tile geometry,
/// spatial indices) is always regenerated from the store, never the other way around.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    annotations: HashMap<AnnotationId, Annotation, ahash::RandomState>,
    next_id: u64,
}

impl AnnotationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an annotation and returns the id allocated for it.
    ///
    /// Ids are allocated monotonically and never reused, so removing an annotation does not make
    /// its id available again.
    pub fn add(&mut self, annotation: Annotation) -> AnnotationId {
        let id = AnnotationId::new(self.next_id);
        self.next_id += 1;
        self.annotations.insert(id, annotation);
        id
    }

    /// Replaces the annotation stored under the given id, returning the previous value.
    ///
    /// The replacement may change the annotation variant. Fails with
    /// [`OrteliusError::NotFound`] if no annotation is stored under the id, including ids that
    /// were never allocated or were already removed.
    pub fn update(
        &mut self,
        id: AnnotationId,
        annotation: Annotation,
    ) -> Result<Annotation, OrteliusError> {
        match self.annotations.get_mut(&id) {
            Some(slot) => Ok(std::mem::replace(slot, annotation)),
            None => Err(OrteliusError::NotFound),
        }
    }

    /// Removes the annotation with the given id, returning it if it was present.
    ///
    /// Removing an unknown or already removed id is a no-op.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        self.annotations.remove(&id)
    }

    /// Returns the annotation stored under the given id.
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    /// Iterates over all stored annotations in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (AnnotationId, &Annotation)> {
        self.annotations.iter().map(|(id, a)| (*id, a))
    }

    /// Ids of all stored annotations in ascending (insertion) order.
    pub fn ordered_ids(&self) -> Vec<AnnotationId> {
        let mut ids: Vec<_> = self.annotations.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of stored annotations.
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Returns true if the store contains no annotations.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Returns true if any stored annotation references the given icon name.
    pub fn references_icon(&self, name: &str) -> bool {
        self.annotations
            .values()
            .any(|a| a.icon_name() == Some(name))
    }

    /// Iterates over annotations that reference the given icon name.
    pub fn iter_referencing_icon<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (AnnotationId, &'a Annotation)> {
        self.iter().filter(move |(_, a)| a.icon_name() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use ortelius_types::latlon;

    use super::*;
    use crate::annotation::{LineAnnotation, SymbolAnnotation};
    use ortelius_types::Contour;

    fn symbol(lat: f64, lon: f64) -> Annotation {
        SymbolAnnotation::new(latlon!(lat, lon), "marker").into()
    }

    #[test]
    fn ids_are_never_reused() {
        let mut store = AnnotationStore::new();
        let first = store.add(symbol(0.0, 0.0));
        store.remove(first);
        let second = store.add(symbol(1.0, 1.0));

        assert_ne!(first, second);
        assert!(second > first);
    }

    #[test]
    fn update_unknown_id_fails() {
        let mut store = AnnotationStore::new();
        let id = store.add(symbol(0.0, 0.0));
        store.remove(id);

        assert_matches!(
            store.update(id, symbol(1.0, 1.0)),
            Err(OrteliusError::NotFound)
        );
        assert_matches!(
            store.update(AnnotationId::new(100), symbol(1.0, 1.0)),
            Err(OrteliusError::NotFound)
        );
    }

    #[test]
    fn update_preserves_id_across_variant_change() {
        let mut store = AnnotationStore::new();
        let id = store.add(symbol(0.0, 0.0));

        let line = LineAnnotation::new(Contour::new(vec![latlon!(0.0, 0.0), latlon!(1.0, 1.0)]));
        let previous = store.update(id, line.into()).expect("id is present");
        assert_matches!(previous, Annotation::Symbol(_));
        assert_matches!(store.get(id), Some(Annotation::Line(_)));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = AnnotationStore::new();
        let id = store.add(symbol(0.0, 0.0));

        assert!(store.remove(id).is_some());
        assert!(store.remove(id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn references_icon() {
        let mut store = AnnotationStore::new();
        store.add(symbol(0.0, 0.0));

        assert!(store.references_icon("marker"));
        assert!(!store.references_icon("other"));
        assert_eq!(store.iter_referencing_icon("marker").count(), 1);
    }
}
