use crate::cartesian::Point2d;
use crate::geo::GeoPoint2d;

/// Conversion between geographic and projected coordinates.
///
/// Projections are treated as pure functions: the same input always produces the same output.
pub trait Projection {
    /// Input (geographic) point type.
    type InPoint;
    /// Output (projected) point type.
    type OutPoint;

    /// Projects the point into cartesian coordinates.
    ///
    /// Returns `None` if the point cannot be represented in the target coordinate system.
    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint>;

    /// Converts a projected point back into geographic coordinates.
    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint>;
}

/// Spherical Web Mercator projection (EPSG:3857), as used by most tile services.
#[derive(Debug, Default, Copy, Clone)]
pub struct WebMercator;

impl WebMercator {
    /// Radius of the projection sphere in meters.
    pub const EQUATOR_RADIUS: f64 = 6_378_137.0;

    /// Maximum latitude (in degrees) representable by the projection.
    pub const MAX_LATITUDE: f64 = 85.06;
}

impl Projection for WebMercator {
    type InPoint = GeoPoint2d;
    type OutPoint = Point2d;

    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint> {
        if input.lat().abs() > Self::MAX_LATITUDE {
            return None;
        }

        let x = Self::EQUATOR_RADIUS * input.lon_rad();
        let y = Self::EQUATOR_RADIUS
            * (std::f64::consts::FRAC_PI_4 + input.lat_rad() / 2.0).tan().ln();

        if x.is_finite() && y.is_finite() {
            Some(Point2d::new(x, y))
        } else {
            None
        }
    }

    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint> {
        let lat = (2.0 * (input.y / Self::EQUATOR_RADIUS).exp().atan()
            - std::f64::consts::FRAC_PI_2)
            .to_degrees();
        let lon = (input.x / Self::EQUATOR_RADIUS).to_degrees();

        if lat.is_finite() && lon.is_finite() {
            Some(GeoPoint2d::latlon(lat, lon))
        } else {
            None
        }
    }
}
