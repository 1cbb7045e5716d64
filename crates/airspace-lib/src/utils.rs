//! Utility functions for spherical geometry and extent bookkeeping

use geo::{Coord, Point, Rect};

/// Earth's mean radius in meters
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// Maximum absolute latitude of a decoded coordinate
pub const MAX_LATITUDE: f64 = 90.0;

/// Maximum absolute longitude of a decoded coordinate; rings may run past ±180
pub const MAX_LONGITUDE: f64 = 360.0;

/// Compute the point reached from `origin` after travelling `distance_m` meters
/// along the initial `bearing_deg` (clockwise from north) on a sphere
///
/// # Arguments
/// * `origin` - Start point with x = longitude, y = latitude in degrees
/// * `bearing_deg` - Initial bearing in degrees
/// * `distance_m` - Great-circle distance in meters
///
/// # Returns
/// A `Point<f64>` whose longitude stays within 180 degrees of `origin`'s, without wrapping
/// into [-180, 180]. Rings built from successive destinations are therefore continuous
/// across the antimeridian.
#[inline]
pub fn destination_point(origin: Point<f64>, bearing_deg: f64, distance_m: f64) -> Point<f64> {
    let lat1 = origin.y().to_radians();
    let bearing = bearing_deg.to_radians();
    let delta = distance_m / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing.cos()).asin();
    let dlon =
        (bearing.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    Point::new(origin.x() + dlon.to_degrees(), lat2.to_degrees())
}

/// Check that both components of a coordinate are finite
#[inline(always)]
pub fn is_finite_coord(coord: &Coord<f64>) -> bool {
    coord.x.is_finite() && coord.y.is_finite()
}

/// Check that a coordinate lies within the accepted longitude/latitude range
#[inline(always)]
pub fn is_geographic_coord(coord: &Coord<f64>) -> bool {
    coord.x.abs() <= MAX_LONGITUDE && coord.y.abs() <= MAX_LATITUDE
}

/// Grow `extent` so that it also covers `other`
#[inline]
pub fn expand_extent(extent: &mut Option<Rect<f64>>, other: Rect<f64>) {
    match extent {
        Some(bbox) => {
            *bbox = Rect::new(
                Coord {
                    x: bbox.min().x.min(other.min().x),
                    y: bbox.min().y.min(other.min().y),
                },
                Coord {
                    x: bbox.max().x.max(other.max().x),
                    y: bbox.max().y.max(other.max().y),
                },
            );
        }
        None => *extent = Some(other),
    }
}

/// Flatten a rectangle into `[min_x, min_y, max_x, max_y]`
#[inline]
pub fn rect_to_bbox(rect: &Rect<f64>) -> [f64; 4] {
    [rect.min().x, rect.min().y, rect.max().x, rect.max().y]
}
