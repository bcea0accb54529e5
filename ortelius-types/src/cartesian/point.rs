use nalgebra::Scalar;
use num_traits::{Bounded, FromPrimitive, Num};

/// 2d point in projected map coordinates or screen pixels.
pub type Point2d = nalgebra::Point2<f64>;

/// Generic access to coordinates of a 2d point on a cartesian plane.
pub trait CartesianPoint2d {
    /// Numeric type used to represent coordinates.
    type Num: Num + Copy + PartialOrd + Bounded + Scalar + FromPrimitive;

    /// X coordinate.
    fn x(&self) -> Self::Num;
    /// Y coordinate.
    fn y(&self) -> Self::Num;

    /// Squared euclidean distance to the `other` point.
    fn distance_sq(&self, other: &impl CartesianPoint2d<Num = Self::Num>) -> Self::Num {
        let dx = if self.x() > other.x() {
            self.x() - other.x()
        } else {
            other.x() - self.x()
        };
        let dy = if self.y() > other.y() {
            self.y() - other.y()
        } else {
            other.y() - self.y()
        };

        dx * dx + dy * dy
    }
}

impl<Num: num_traits::Num + Copy + PartialOrd + Bounded + Scalar + FromPrimitive> CartesianPoint2d
    for nalgebra::Point2<Num>
{
    type Num = Num;

    fn x(&self) -> Num {
        self.x
    }

    fn y(&self) -> Num {
        self.y
    }
}
