//! The map itself: view state, style document and the annotation layer.

use std::sync::Arc;

use ortelius_types::cartesian::{Point2d, Rect};

use crate::annotation::{Annotation, AnnotationId, AnnotationLayer, PassSummary};
use crate::decoded_image::DecodedImage;
use crate::error::OrteliusError;
use crate::messenger::Messenger;
use crate::style::Style;
use crate::tile_schema::TileSchema;
use crate::view::MapView;

/// The map engine facade.
///
/// Owns the current [`MapView`], the active [`Style`] and the [`AnnotationLayer`]. The map never
/// renders on its own: the application drives it by calling [`Map::render`] once per frame, after
/// being notified through the [`Messenger`] that the image changed.
pub struct Map {
    view: MapView,
    style: Style,
    annotations: AnnotationLayer,
    messenger: Option<Arc<dyn Messenger>>,
}

impl Map {
    /// Creates a new map with an empty style and no annotations.
    pub fn new(view: MapView, schema: TileSchema) -> Self {
        Self {
            view,
            style: Style::new(),
            annotations: AnnotationLayer::new(schema),
            messenger: None,
        }
    }

    /// Sets the messenger used to notify the application that the map must be redrawn.
    pub fn set_messenger(&mut self, messenger: Arc<dyn Messenger>) {
        self.annotations.set_messenger(messenger.clone());
        self.messenger = Some(messenger);
    }

    /// Current view of the map.
    pub fn view(&self) -> &MapView {
        &self.view
    }

    /// Changes the view of the map.
    pub fn set_view(&mut self, view: MapView) {
        self.view = view;
        self.redraw();
    }

    /// Currently active style document.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Replaces the active style document.
    ///
    /// Annotations are not part of the style and survive the switch: the next render pass injects
    /// the annotation source and layers into the new document and rebuilds all annotation tiles.
    pub fn set_style(&mut self, style: Style) {
        self.style = style;
        self.annotations.request_update();
    }

    /// Annotation layer of the map.
    pub fn annotations(&self) -> &AnnotationLayer {
        &self.annotations
    }

    /// Adds an annotation and returns the id allocated for it.
    pub fn add_annotation(&mut self, annotation: Annotation) -> AnnotationId {
        self.annotations.add_annotation(annotation)
    }

    /// Replaces the annotation stored under the given id.
    pub fn update_annotation(
        &mut self,
        id: AnnotationId,
        annotation: Annotation,
    ) -> Result<(), OrteliusError> {
        self.annotations.update_annotation(id, annotation)
    }

    /// Removes the annotation with the given id. Removing an unknown id is a no-op.
    pub fn remove_annotation(&mut self, id: AnnotationId) {
        self.annotations.remove_annotation(id);
    }

    /// Returns the annotation stored under the given id.
    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.annotation(id)
    }

    /// Registers a marker icon under the given name.
    pub fn add_annotation_icon(&mut self, name: &str, image: DecodedImage, pixel_ratio: f32) {
        self.annotations.add_icon(name, image, pixel_ratio);
    }

    /// Removes the marker icon with the given name.
    pub fn remove_annotation_icon(&mut self, name: &str) {
        self.annotations.remove_icon(name);
    }

    /// Schedules regeneration of all annotation tiles on the next render pass.
    ///
    /// Normal mutations schedule their own regeneration; this is the forced path for changes the
    /// engine cannot observe itself.
    pub fn request_update(&mut self) {
        self.annotations.request_update();
    }

    /// Runs one render pass with the current view and style.
    pub fn render(&mut self) -> PassSummary {
        self.annotations.render(&self.view, &mut self.style)
    }

    /// Ids of annotations rendered at the given screen point during the latest render pass.
    pub fn query_annotations_at(&self, point: &Point2d) -> Vec<AnnotationId> {
        self.annotations.query_screen_point(point)
    }

    /// Ids of annotations whose rendered extent intersects the given screen rectangle.
    pub fn query_annotations_in(&self, rect: &Rect) -> Vec<AnnotationId> {
        self.annotations.query_screen_box(rect)
    }

    fn redraw(&self) {
        if let Some(messenger) = &self.messenger {
            messenger.request_redraw();
        }
    }
}
