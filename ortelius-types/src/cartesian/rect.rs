use nalgebra::Scalar;
use num_traits::{Bounded, FromPrimitive, Num};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cartesian::point::CartesianPoint2d;

/// Axis-aligned rectangle.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect<N = f64> {
    x_min: N,
    y_min: N,
    x_max: N,
    y_max: N,
}

impl<N: Num + Copy + PartialOrd + Bounded + Scalar + FromPrimitive> Rect<N> {
    /// Creates a new rectangle.
    pub fn new(x_min: N, y_min: N, x_max: N, y_max: N) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Smallest rectangle containing all the given points. Returns `None` for an empty input.
    pub fn from_points<'a, P: CartesianPoint2d<Num = N> + 'a>(
        points: impl IntoIterator<Item = &'a P>,
    ) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Self::new(first.x(), first.y(), first.x(), first.y());
        for p in iter {
            if p.x() < rect.x_min {
                rect.x_min = p.x();
            }
            if p.x() > rect.x_max {
                rect.x_max = p.x();
            }
            if p.y() < rect.y_min {
                rect.y_min = p.y();
            }
            if p.y() > rect.y_max {
                rect.y_max = p.y();
            }
        }

        Some(rect)
    }

    /// Minimum X coordinate.
    pub fn x_min(&self) -> N {
        self.x_min
    }

    /// Minimum Y coordinate.
    pub fn y_min(&self) -> N {
        self.y_min
    }

    /// Maximum X coordinate.
    pub fn x_max(&self) -> N {
        self.x_max
    }

    /// Maximum Y coordinate.
    pub fn y_max(&self) -> N {
        self.y_max
    }

    /// Width of the rectangle.
    pub fn width(&self) -> N {
        self.x_max - self.x_min
    }

    /// Height of the rectangle.
    pub fn height(&self) -> N {
        self.y_max - self.y_min
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn merge(&self, other: Self) -> Self {
        Self {
            x_min: if self.x_min < other.x_min {
                self.x_min
            } else {
                other.x_min
            },
            y_min: if self.y_min < other.y_min {
                self.y_min
            } else {
                other.y_min
            },
            x_max: if self.x_max > other.x_max {
                self.x_max
            } else {
                other.x_max
            },
            y_max: if self.y_max > other.y_max {
                self.y_max
            } else {
                other.y_max
            },
        }
    }

    /// Grows the rectangle by the given `amount` in every direction. Negative amounts shrink it.
    pub fn expand(&self, amount: N) -> Self {
        Self {
            x_min: self.x_min - amount,
            y_min: self.y_min - amount,
            x_max: self.x_max + amount,
            y_max: self.y_max + amount,
        }
    }

    /// Returns true if the given point lies inside or on the boundary of the rectangle.
    pub fn contains(&self, point: &impl CartesianPoint2d<Num = N>) -> bool {
        point.x() >= self.x_min
            && point.x() <= self.x_max
            && point.y() >= self.y_min
            && point.y() <= self.y_max
    }

    /// Returns true if the two rectangles have at least one common point.
    pub fn intersects(&self, other: &Self) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }
}

impl Rect<f64> {
    /// Center of the rectangle.
    pub fn center(&self) -> nalgebra::Point2<f64> {
        nalgebra::Point2::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Returns true if any of the corner values is not a finite number.
    pub fn is_degenerate(&self) -> bool {
        !(self.x_min.is_finite()
            && self.y_min.is_finite()
            && self.x_max.is_finite()
            && self.y_max.is_finite())
            || self.x_min > self.x_max
            || self.y_min > self.y_max
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point2;

    use super::*;

    #[test]
    fn from_points() {
        let points = [
            Point2::new(1.0, 5.0),
            Point2::new(-2.0, 3.0),
            Point2::new(4.0, -1.0),
        ];
        let rect = Rect::from_points(points.iter()).expect("non-empty input");
        assert_eq!(rect, Rect::new(-2.0, -1.0, 4.0, 5.0));

        let empty: [Point2<f64>; 0] = [];
        assert!(Rect::from_points(empty.iter()).is_none());
    }

    #[test]
    fn intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(a.intersects(&Rect::new(10.0, 10.0, 15.0, 15.0)));
        assert!(!a.intersects(&Rect::new(10.1, 0.0, 15.0, 10.0)));
        assert!(a.intersects(&Rect::new(2.0, 2.0, 3.0, 3.0)));
    }

    #[test]
    fn merge_and_expand() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let b = Rect::new(2.0, -1.0, 3.0, 0.5);
        assert_eq!(a.merge(b), Rect::new(0.0, -1.0, 3.0, 1.0));
        assert_eq!(a.expand(1.0), Rect::new(-1.0, -1.0, 2.0, 2.0));
    }
}
