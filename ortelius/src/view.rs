//! Current position of the map viewport and coordinate transforms derived from it.

use ortelius_types::cartesian::{Point2d, Rect, Size};

/// Map view specifies the area of the map that is currently displayed.
///
/// The view also provides the transform between projected map coordinates and screen pixel
/// coordinates. Screen coordinates have their origin in the top-left corner of the viewport with
/// the Y axis pointing down.
#[derive(Debug, Clone, Copy)]
pub struct MapView {
    position: Point2d,
    resolution: f64,
    size: Size,
}

impl MapView {
    /// Creates a new view centered at the given projected position with the given resolution
    /// (map units per pixel).
    pub fn new(position: Point2d, resolution: f64) -> Self {
        Self {
            position,
            resolution,
            size: Size::default(),
        }
    }

    /// Returns a copy of the view with the given viewport size in pixels.
    pub fn with_size(&self, size: Size) -> Self {
        Self { size, ..*self }
    }

    /// Returns a copy of the view with the given resolution.
    pub fn with_resolution(&self, resolution: f64) -> Self {
        Self {
            resolution,
            ..*self
        }
    }

    /// Projected coordinates of the center of the viewport.
    pub fn position(&self) -> Point2d {
        self.position
    }

    /// Resolution of the view in map units per pixel.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Size of the viewport in pixels.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Bounding rectangle of the visible map area in projected coordinates.
    ///
    /// Returns `None` if the viewport has no valid size.
    pub fn bbox(&self) -> Option<Rect> {
        if self.size.is_zero() || !self.resolution.is_finite() {
            return None;
        }

        let half_width = self.size.half_width() * self.resolution;
        let half_height = self.size.half_height() * self.resolution;
        Some(Rect::new(
            self.position.x - half_width,
            self.position.y - half_height,
            self.position.x + half_width,
            self.position.y + half_height,
        ))
    }

    /// Converts a point in projected map coordinates into screen pixel coordinates.
    pub fn map_to_screen(&self, point: &Point2d) -> Point2d {
        Point2d::new(
            (point.x - self.position.x) / self.resolution + self.size.half_width(),
            self.size.half_height() - (point.y - self.position.y) / self.resolution,
        )
    }

    /// Converts a point in screen pixel coordinates into projected map coordinates.
    pub fn screen_to_map(&self, point: &Point2d) -> Point2d {
        Point2d::new(
            (point.x - self.size.half_width()) * self.resolution + self.position.x,
            (self.size.half_height() - point.y) * self.resolution + self.position.y,
        )
    }
}
