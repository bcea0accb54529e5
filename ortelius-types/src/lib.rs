//! Geometry and coordinate primitives shared by the Ortelius annotation engine.
//!
//! The crate separates two coordinate worlds:
//!
//! * [`geo`]: geographic coordinates (latitude/longitude on the WGS84 ellipsoid) in which
//!   application data, such as map annotations, is expressed;
//! * [`cartesian`]: projected planar coordinates (map units, tile-local units or screen pixels)
//!   in which everything is measured once a [`geo::Projection`] has been applied.
//!
//! Composite geometries ([`Contour`], [`Polygon`]) are generic over their point type so the same
//! shape representation can be used before and after projection.

pub mod cartesian;
mod contour;
pub mod geo;
mod polygon;

pub use contour::{ClosedContour, Contour};
pub use polygon::Polygon;
