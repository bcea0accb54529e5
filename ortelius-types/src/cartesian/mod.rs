//! Planar geometry: points, sizes and rectangles in projected or screen coordinates.

mod point;
mod rect;
mod size;

pub use point::{CartesianPoint2d, Point2d};
pub use rect::Rect;
pub use size::Size;
