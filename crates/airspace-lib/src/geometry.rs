//! Typed geometry produced by the decoder
//!
//! Circles are kept as a first-class variant and only expanded to a geodesic ring when a
//! boolean operation or the final output needs an areal shape.

use geo::orient::{Direction, Orient};
use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use serde_json::{Map, Value};
use std::fmt;

use crate::utils;

/// A circle given by a center and a radius in meters
#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    /// Center with x = longitude, y = latitude
    pub center: Point<f64>,
    /// Radius in meters, always positive and finite
    pub radius_m: f64,
    /// Any extra keys found next to `center` and `radius` in the literal
    pub options: Map<String, Value>,
}

impl Circle {
    /// Approximate the circle by a counter-clockwise ring of `segments` vertices
    ///
    /// Longitudes are not wrapped: a circle straddling the antimeridian yields a ring that
    /// runs past ±180 instead of jumping to the other side of the world.
    pub fn to_polygon(&self, segments: usize) -> Polygon<f64> {
        let step = 360.0 / segments as f64;
        // Decreasing bearings walk north -> west -> south -> east, i.e. counter-clockwise
        let mut coords: Vec<Coord<f64>> = (0..segments)
            .map(|i| utils::destination_point(self.center, -(i as f64) * step, self.radius_m).0)
            .collect();
        if let Some(first) = coords.first().copied() {
            coords.push(first);
        }
        Polygon::new(LineString::new(coords), vec![]).orient(Direction::Default)
    }
}

/// Discriminant of [`Geometry`], used in diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    Circle,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryKind::Point => "point",
            GeometryKind::LineString => "line string",
            GeometryKind::Polygon => "polygon",
            GeometryKind::Circle => "circle",
        };
        f.write_str(name)
    }
}

/// A decoded geometry literal
///
/// Polygons are always oriented with a counter-clockwise exterior and clockwise holes.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
    Polygon(Polygon<f64>),
    Circle(Circle),
}

impl Geometry {
    /// Build a polygon variant, normalizing its winding
    pub fn polygon(polygon: Polygon<f64>) -> Self {
        Geometry::Polygon(polygon.orient(Direction::Default))
    }

    #[inline]
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::Circle(_) => GeometryKind::Circle,
        }
    }

    /// Convert an areal geometry into a multi-polygon suitable for boolean operations
    ///
    /// Returns `None` for points and line strings.
    pub fn to_multi_polygon(&self, circle_segments: usize) -> Option<MultiPolygon<f64>> {
        match self {
            Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon.clone()])),
            Geometry::Circle(circle) => {
                Some(MultiPolygon::new(vec![circle.to_polygon(circle_segments)]))
            }
            Geometry::Point(_) | Geometry::LineString(_) => None,
        }
    }
}
