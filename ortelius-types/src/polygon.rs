#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cartesian::{CartesianPoint2d, Rect};
use crate::contour::ClosedContour;

/// Polygon with one outer ring and any number of holes.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon<P> {
    /// Outer ring of the polygon.
    pub outer_contour: ClosedContour<P>,
    /// Holes of the polygon.
    pub inner_contours: Vec<ClosedContour<P>>,
}

impl<P> Polygon<P> {
    /// Creates a new polygon.
    pub fn new(outer_contour: ClosedContour<P>, inner_contours: Vec<ClosedContour<P>>) -> Self {
        Self {
            outer_contour,
            inner_contours,
        }
    }

    /// Iterates over all rings of the polygon, outer ring first.
    pub fn iter_contours(&self) -> impl Iterator<Item = &ClosedContour<P>> {
        std::iter::once(&self.outer_contour).chain(self.inner_contours.iter())
    }

    /// Converts every point of the polygon with the given function.
    ///
    /// Returns `None` if the conversion fails for any point.
    pub fn try_map_points<T>(&self, mut f: impl FnMut(&P) -> Option<T>) -> Option<Polygon<T>> {
        Some(Polygon {
            outer_contour: self.outer_contour.try_map_points(&mut f)?,
            inner_contours: self
                .inner_contours
                .iter()
                .map(|c| c.try_map_points(&mut f))
                .collect::<Option<Vec<_>>>()?,
        })
    }
}

impl<P> From<ClosedContour<P>> for Polygon<P> {
    fn from(value: ClosedContour<P>) -> Self {
        Self {
            outer_contour: value,
            inner_contours: vec![],
        }
    }
}

impl<P: CartesianPoint2d<Num = f64>> Polygon<P> {
    /// Bounding rectangle of the outer ring.
    pub fn bounding_rect(&self) -> Option<Rect> {
        self.outer_contour.bounding_rect()
    }

    /// Returns true if the given point is inside the polygon and not inside any of its holes.
    ///
    /// Uses the even-odd rule, so the orientation of the rings does not matter.
    pub fn contains_point(&self, point: &impl CartesianPoint2d<Num = f64>) -> bool {
        if !ring_contains(&self.outer_contour, point) {
            return false;
        }

        !self
            .inner_contours
            .iter()
            .any(|hole| ring_contains(hole, point))
    }
}

fn ring_contains<P: CartesianPoint2d<Num = f64>>(
    ring: &ClosedContour<P>,
    point: &impl CartesianPoint2d<Num = f64>,
) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let (px, py) = (point.x(), point.y());
    let mut inside = false;
    for (a, b) in ring.iter_segments() {
        let (ax, ay) = (a.x(), a.y());
        let (bx, by) = (b.x(), b.y());
        if (ay > py) != (by > py) {
            let intersect_x = ax + (py - ay) / (by - ay) * (bx - ax);
            if px < intersect_x {
                inside = !inside;
            }
        }
    }

    inside
}

#[cfg(test)]
mod tests {
    use nalgebra::Point2;

    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> ClosedContour<Point2<f64>> {
        ClosedContour::new(vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ])
    }

    #[test]
    fn contains_point() {
        let polygon: Polygon<_> = square(0.0, 0.0, 10.0, 10.0).into();
        assert!(polygon.contains_point(&Point2::new(5.0, 5.0)));
        assert!(!polygon.contains_point(&Point2::new(15.0, 5.0)));
        assert!(!polygon.contains_point(&Point2::new(-1.0, -1.0)));
    }

    #[test]
    fn contains_point_with_hole() {
        let polygon = Polygon::new(square(0.0, 0.0, 10.0, 10.0), vec![square(4.0, 4.0, 6.0, 6.0)]);
        assert!(polygon.contains_point(&Point2::new(2.0, 2.0)));
        assert!(!polygon.contains_point(&Point2::new(5.0, 5.0)));
    }

    #[test]
    fn degenerate_ring_contains_nothing() {
        let polygon: Polygon<Point2<f64>> =
            Polygon::from(ClosedContour::new(vec![Point2::new(0.0, 0.0)]));
        assert!(!polygon.contains_point(&Point2::new(0.0, 0.0)));
    }
}
