//! Geographic coordinates and projections between them and the cartesian plane.

mod point;
mod projection;

pub use point::GeoPoint2d;
pub use projection::{Projection, WebMercator};
