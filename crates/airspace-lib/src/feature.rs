//! Catalog entries handed to the rendering layer

use geo::{BoundingRect, MultiPolygon, Point, Rect};
use serde_json::{Map, Value};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::style::{HeadingGlyph, HexColor};

/// A record whose quads composed into a non-empty area
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ComposedFeature {
    pub name: String,
    pub category: String,
    pub layer: String,
    /// Never empty; a single polygon is stored as a one-element multi-polygon
    pub geometry: MultiPolygon<f64>,
    pub color: HexColor,
    pub weight: f64,
    pub fill_opacity: f64,
    pub tooltip: String,
}

/// A record from a point category, rendered as a marker
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PointFeature {
    pub name: String,
    pub category: String,
    pub layer: String,
    /// x = longitude, y = latitude
    pub coordinate: Point<f64>,
    pub glyph: HeadingGlyph,
}

/// Any catalog entry
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Feature {
    Composed(ComposedFeature),
    Point(PointFeature),
}

impl Feature {
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Feature::Composed(f) => &f.name,
            Feature::Point(f) => &f.name,
        }
    }

    #[inline]
    pub fn category(&self) -> &str {
        match self {
            Feature::Composed(f) => &f.category,
            Feature::Point(f) => &f.category,
        }
    }

    #[inline]
    pub fn layer(&self) -> &str {
        match self {
            Feature::Composed(f) => &f.layer,
            Feature::Point(f) => &f.layer,
        }
    }

    /// Extent of the feature's geometry
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Feature::Composed(f) => f.geometry.bounding_rect(),
            Feature::Point(f) => Some(f.coordinate.bounding_rect()),
        }
    }

    /// Convert into a GeoJSON feature with style and grouping properties
    pub fn to_geojson(&self) -> geojson::Feature {
        let mut properties = Map::new();
        properties.insert("name".to_string(), Value::from(self.name()));
        properties.insert("category".to_string(), Value::from(self.category()));
        properties.insert("layer".to_string(), Value::from(self.layer()));

        let value = match self {
            Feature::Composed(f) => {
                properties.insert("color".to_string(), Value::from(f.color.as_str()));
                properties.insert("weight".to_string(), Value::from(f.weight));
                properties.insert("fillOpacity".to_string(), Value::from(f.fill_opacity));
                properties.insert("tooltip".to_string(), Value::from(f.tooltip.as_str()));
                areal_value(&f.geometry)
            }
            Feature::Point(f) => {
                properties.insert("color".to_string(), Value::from(f.glyph.color.as_str()));
                properties.insert("label".to_string(), Value::from(f.glyph.label.as_str()));
                if let Some(heading) = f.glyph.heading_deg {
                    properties.insert("heading".to_string(), Value::from(heading));
                }
                geojson::Value::Point(vec![f.coordinate.x(), f.coordinate.y()])
            }
        };

        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(value)),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Polygon for a single part, MultiPolygon otherwise
fn areal_value(shape: &MultiPolygon<f64>) -> geojson::Value {
    let mut polygons: Vec<Vec<Vec<Vec<f64>>>> = shape
        .0
        .iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| ring.coords().map(|c| vec![c.x, c.y]).collect())
                .collect()
        })
        .collect();

    if polygons.len() == 1 {
        geojson::Value::Polygon(polygons.remove(0))
    } else {
        geojson::Value::MultiPolygon(polygons)
    }
}
