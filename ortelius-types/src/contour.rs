#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cartesian::{CartesianPoint2d, Rect};

/// Open polyline defined by an ordered sequence of points.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contour<P> {
    points: Vec<P>,
}

impl<P> Contour<P> {
    /// Creates a new contour from the given points.
    pub fn new(points: Vec<P>) -> Self {
        Self { points }
    }

    /// Points of the contour.
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Number of points in the contour.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the contour has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Converts every point of the contour with the given function.
    ///
    /// Returns `None` if the conversion fails for any point.
    pub fn try_map_points<T>(&self, mut f: impl FnMut(&P) -> Option<T>) -> Option<Contour<T>> {
        let points = self
            .points
            .iter()
            .map(|p| f(p))
            .collect::<Option<Vec<T>>>()?;
        Some(Contour { points })
    }
}

impl<P: CartesianPoint2d<Num = f64>> Contour<P> {
    /// Bounding rectangle of the contour, if it has at least one point.
    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::from_points(self.points.iter())
    }

    /// Squared distance from the given point to the closest segment of the contour.
    ///
    /// A single-point contour is treated as that point. Returns `None` for an empty contour.
    pub fn distance_to_point_sq(&self, point: &impl CartesianPoint2d<Num = f64>) -> Option<f64> {
        match self.points.len() {
            0 => None,
            1 => Some(self.points[0].distance_sq(point)),
            _ => self
                .points
                .windows(2)
                .map(|pair| segment_distance_sq(&pair[0], &pair[1], point))
                .min_by(|a, b| a.total_cmp(b)),
        }
    }
}

/// Closed ring of points. The edge between the last and the first point is implied.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClosedContour<P> {
    points: Vec<P>,
}

impl<P> ClosedContour<P> {
    /// Creates a new closed contour.
    pub fn new(points: Vec<P>) -> Self {
        Self { points }
    }

    /// Points of the ring, without the closing point repeated.
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Number of points in the ring.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the ring has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Converts every point of the ring with the given function.
    ///
    /// Returns `None` if the conversion fails for any point.
    pub fn try_map_points<T>(
        &self,
        mut f: impl FnMut(&P) -> Option<T>,
    ) -> Option<ClosedContour<T>> {
        let points = self
            .points
            .iter()
            .map(|p| f(p))
            .collect::<Option<Vec<T>>>()?;
        Some(ClosedContour { points })
    }

    /// Iterates over the edges of the ring, including the closing edge.
    pub fn iter_segments(&self) -> impl Iterator<Item = (&P, &P)> {
        self.points
            .iter()
            .zip(self.points.iter().cycle().skip(1))
            .take(self.points.len())
    }
}

impl<P: CartesianPoint2d<Num = f64>> ClosedContour<P> {
    /// Bounding rectangle of the ring, if it has at least one point.
    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::from_points(self.points.iter())
    }
}

fn segment_distance_sq(
    a: &impl CartesianPoint2d<Num = f64>,
    b: &impl CartesianPoint2d<Num = f64>,
    p: &impl CartesianPoint2d<Num = f64>,
) -> f64 {
    let (ax, ay) = (a.x(), a.y());
    let (bx, by) = (b.x(), b.y());
    let (px, py) = (p.x(), p.y());

    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return a.distance_sq(p);
    }

    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    let cx = ax + t * dx;
    let cy = ay + t * dy;
    (px - cx) * (px - cx) + (py - cy) * (py - cy)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use nalgebra::Point2;

    use super::*;

    #[test]
    fn distance_to_point() {
        let contour = Contour::new(vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)]);
        let d = contour
            .distance_to_point_sq(&Point2::new(5.0, 3.0))
            .expect("non-empty contour");
        assert_abs_diff_eq!(d, 9.0);

        let d = contour
            .distance_to_point_sq(&Point2::new(-4.0, 3.0))
            .expect("non-empty contour");
        assert_abs_diff_eq!(d, 25.0);

        let empty: Contour<Point2<f64>> = Contour::default();
        assert!(empty.distance_to_point_sq(&Point2::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn closed_contour_segments() {
        let ring = ClosedContour::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
        ]);
        let segments: Vec<_> = ring.iter_segments().collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(*segments[2].0, Point2::new(1.0, 1.0));
        assert_eq!(*segments[2].1, Point2::new(0.0, 0.0));
    }
}
