//! Geometry literal decoding
//!
//! A literal is either JSON text (a string value) or an already structured JSON value.
//! Untyped literals are resolved with a fixed precedence:
//!
//! 1. object with `center` and `radius` -> circle
//! 2. array of exactly two numeric components -> point
//! 3. array of at least two coordinate pairs, first equal to last -> polygon
//! 4. any other array of at least two coordinate pairs -> line string
//!
//! Objects carrying a GeoJSON `type` and `coordinates` are decoded as typed GeoJSON.
//! Decoding never panics; every failure is a [`DecodeError`].

use geo::{Coord, LineString, Point, Polygon};
use serde_json::{Map, Value};

use crate::config::AxisOrder;
use crate::geometry::{Circle, Geometry};
use crate::{DecodeError, utils};

/// Number of times a string literal may contain another JSON-encoded string
const MAX_STRING_NESTING: usize = 2;

/// Minimum number of coordinates in a closed ring (three distinct vertices plus closure)
const MIN_RING_COORDS: usize = 4;

/// Decode a literal whose bare pairs are `[lon, lat]`
pub fn decode(literal: &Value) -> Result<Geometry, DecodeError> {
    decode_with(literal, AxisOrder::LonLat)
}

/// Decode a literal using the given axis order for bare coordinate pairs
pub fn decode_with(literal: &Value, axis: AxisOrder) -> Result<Geometry, DecodeError> {
    decode_value(literal, axis, 0)
}

/// Decode JSON text
pub fn decode_str(text: &str, axis: AxisOrder) -> Result<Geometry, DecodeError> {
    decode_text(text, axis, 0)
}

fn decode_text(text: &str, axis: AxisOrder, depth: usize) -> Result<Geometry, DecodeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }
    if depth >= MAX_STRING_NESTING {
        return Err(DecodeError::NestedString);
    }
    let value: Value =
        serde_json::from_str(text).map_err(|e| DecodeError::MalformedJson(e.to_string()))?;
    decode_value(&value, axis, depth + 1)
}

fn decode_value(value: &Value, axis: AxisOrder, depth: usize) -> Result<Geometry, DecodeError> {
    match value {
        Value::Null => Err(DecodeError::Empty),
        Value::String(text) => decode_text(text, axis, depth),
        Value::Object(map) => decode_object(map, axis),
        Value::Array(items) => decode_array(items, axis),
        Value::Bool(_) | Value::Number(_) => {
            Err(DecodeError::Unrecognized(format!("scalar literal {value}")))
        }
    }
}

fn decode_object(map: &Map<String, Value>, axis: AxisOrder) -> Result<Geometry, DecodeError> {
    if map.contains_key("center") && map.contains_key("radius") {
        return decode_circle(map, axis);
    }
    if map.contains_key("type") && map.contains_key("coordinates") {
        return decode_geojson(map);
    }
    Err(DecodeError::Unrecognized(
        "object without center/radius or type/coordinates".to_string(),
    ))
}

fn decode_circle(map: &Map<String, Value>, axis: AxisOrder) -> Result<Geometry, DecodeError> {
    let center = match map.get("center") {
        Some(Value::Object(center)) => decode_lat_lng_object(center)?,
        Some(Value::Array(pair)) => {
            let pair = unwrap_nested(pair);
            if pair.len() != 2 || pair.iter().any(Value::is_array) {
                return Err(DecodeError::Unrecognized(
                    "circle center is not a coordinate pair".to_string(),
                ));
            }
            coord_from_components(&pair[0], &pair[1], axis)?
        }
        Some(Value::String(text)) => match decode_str(text, axis)? {
            Geometry::Point(point) => point.0,
            other => {
                return Err(DecodeError::Unrecognized(format!(
                    "circle center decoded as {}",
                    other.kind()
                )));
            }
        },
        _ => {
            return Err(DecodeError::Unrecognized(
                "circle center is not a coordinate".to_string(),
            ));
        }
    };

    let radius_value = map.get("radius").unwrap_or(&Value::Null);
    let radius_m = coerce_number(radius_value)
        .map_err(|_| DecodeError::InvalidRadius(radius_value.to_string()))?;
    if radius_m <= 0.0 {
        return Err(DecodeError::InvalidRadius(radius_value.to_string()));
    }

    let options = map
        .iter()
        .filter(|(key, _)| key.as_str() != "center" && key.as_str() != "radius")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(Geometry::Circle(Circle {
        center: Point(center),
        radius_m,
        options,
    }))
}

/// Decode `{lat, lng}` / `{lat, lon}` objects, whose keys make the axis order explicit
fn decode_lat_lng_object(center: &Map<String, Value>) -> Result<Coord<f64>, DecodeError> {
    let lat = center
        .get("lat")
        .ok_or_else(|| DecodeError::Unrecognized("circle center without lat".to_string()))?;
    let lon = center
        .get("lng")
        .or_else(|| center.get("lon"))
        .ok_or_else(|| DecodeError::Unrecognized("circle center without lng/lon".to_string()))?;
    coord_from_components(lon, lat, AxisOrder::LonLat)
}

fn decode_geojson(map: &Map<String, Value>) -> Result<Geometry, DecodeError> {
    let geometry = geojson::Geometry::from_json_value(Value::Object(map.clone()))
        .map_err(|e| DecodeError::GeoJson(e.to_string()))?;

    match geometry.value {
        geojson::Value::Point(position) => Ok(Geometry::Point(Point(position_to_coord(&position)?))),
        geojson::Value::LineString(positions) => {
            let coords = positions
                .iter()
                .map(|p| position_to_coord(p))
                .collect::<Result<Vec<_>, _>>()?;
            if coords.len() < 2 {
                return Err(DecodeError::TooFewCoordinates {
                    expected: 2,
                    found: coords.len(),
                });
            }
            Ok(Geometry::LineString(LineString::new(coords)))
        }
        geojson::Value::Polygon(rings) => {
            let rings = rings
                .iter()
                .map(|ring| {
                    let coords = ring
                        .iter()
                        .map(|p| position_to_coord(p))
                        .collect::<Result<Vec<_>, _>>()?;
                    closed_ring(coords)
                })
                .collect::<Result<Vec<_>, _>>()?;
            polygon_from_rings(rings)
        }
        geojson::Value::MultiPoint(_) => Err(DecodeError::UnsupportedType("MultiPoint".into())),
        geojson::Value::MultiLineString(_) => {
            Err(DecodeError::UnsupportedType("MultiLineString".into()))
        }
        geojson::Value::MultiPolygon(_) => {
            Err(DecodeError::UnsupportedType("MultiPolygon".into()))
        }
        geojson::Value::GeometryCollection(_) => {
            Err(DecodeError::UnsupportedType("GeometryCollection".into()))
        }
    }
}

fn position_to_coord(position: &[f64]) -> Result<Coord<f64>, DecodeError> {
    match position {
        [x, y, ..] => finite_coord(*x, *y),
        _ => Err(DecodeError::TooFewCoordinates {
            expected: 2,
            found: position.len(),
        }),
    }
}

fn decode_array(items: &[Value], axis: AxisOrder) -> Result<Geometry, DecodeError> {
    let items = unwrap_nested(items);
    if items.is_empty() {
        return Err(DecodeError::Empty);
    }

    // Two scalar components: a single point
    if items.len() == 2 && !items.iter().any(|v| v.is_array()) {
        let coord = coord_from_components(&items[0], &items[1], axis)?;
        return Ok(Geometry::Point(Point(coord)));
    }

    if !items.iter().all(Value::is_array) {
        return Err(DecodeError::Unrecognized(
            "array mixes coordinates and scalars".to_string(),
        ));
    }

    // Every element is itself a list of pairs: exterior ring followed by holes
    if items.iter().all(is_ring_array) {
        let rings = items
            .iter()
            .map(|ring| {
                let pairs = ring.as_array().map(Vec::as_slice).unwrap_or_default();
                closed_ring(coords_from_pairs(pairs, axis)?)
            })
            .collect::<Result<Vec<_>, _>>()?;
        return polygon_from_rings(rings);
    }

    let coords = coords_from_pairs(items, axis)?;
    if coords.len() < 2 {
        return Err(DecodeError::TooFewCoordinates {
            expected: 2,
            found: coords.len(),
        });
    }

    if coords.first() == coords.last() {
        let ring = closed_ring(coords)?;
        return polygon_from_rings(vec![ring]);
    }

    Ok(Geometry::LineString(LineString::new(coords)))
}

/// Strip single-element wrappers around a list of coordinate lists (`[[ring]]`, `[[[ring]]]`)
///
/// A lone pair (`[[x, y]]`) is left wrapped: it is one coordinate, not a point literal.
fn unwrap_nested(mut items: &[Value]) -> &[Value] {
    while let [Value::Array(inner)] = items {
        if inner.first().is_some_and(Value::is_array) {
            items = inner;
        } else {
            break;
        }
    }
    items
}

/// An array whose elements are all arrays, i.e. a list of coordinate pairs
fn is_ring_array(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|pairs| !pairs.is_empty() && pairs.iter().all(Value::is_array))
}

fn coords_from_pairs(pairs: &[Value], axis: AxisOrder) -> Result<Vec<Coord<f64>>, DecodeError> {
    pairs
        .iter()
        .map(|pair| match pair.as_array().map(Vec::as_slice) {
            Some([a, b]) | Some([a, b, _]) => coord_from_components(a, b, axis),
            Some(other) => Err(DecodeError::Unrecognized(format!(
                "coordinate with {} components",
                other.len()
            ))),
            None => Err(DecodeError::Unrecognized(format!(
                "coordinate is not an array: {pair}"
            ))),
        })
        .collect()
}

fn coord_from_components(
    first: &Value,
    second: &Value,
    axis: AxisOrder,
) -> Result<Coord<f64>, DecodeError> {
    let a = coerce_number(first)?;
    let b = coerce_number(second)?;
    match axis {
        AxisOrder::LonLat => finite_coord(a, b),
        AxisOrder::LatLon => finite_coord(b, a),
    }
}

/// Coerce a JSON number or numeric string to `f64`
fn coerce_number(value: &Value) -> Result<f64, DecodeError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let number = number.ok_or_else(|| DecodeError::NonNumeric(value.to_string()))?;
    if number.is_finite() {
        Ok(number)
    } else {
        Err(DecodeError::NonFinite)
    }
}

fn finite_coord(x: f64, y: f64) -> Result<Coord<f64>, DecodeError> {
    let coord = Coord { x, y };
    if !utils::is_finite_coord(&coord) {
        return Err(DecodeError::NonFinite);
    }
    if !utils::is_geographic_coord(&coord) {
        return Err(DecodeError::OutOfRange { x, y });
    }
    Ok(coord)
}

fn closed_ring(coords: Vec<Coord<f64>>) -> Result<LineString<f64>, DecodeError> {
    if coords.first() != coords.last() {
        return Err(DecodeError::OpenRing);
    }
    if coords.len() < MIN_RING_COORDS {
        return Err(DecodeError::DegenerateRing(coords.len()));
    }
    Ok(LineString::new(coords))
}

fn polygon_from_rings(mut rings: Vec<LineString<f64>>) -> Result<Geometry, DecodeError> {
    if rings.is_empty() {
        return Err(DecodeError::Empty);
    }
    let exterior = rings.remove(0);
    Ok(Geometry::polygon(Polygon::new(exterior, rings)))
}
