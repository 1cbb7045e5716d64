//! Catalog build configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::style::{DEFAULT_COLOR, HexColor};

/// Axis order of bare coordinate pairs in geometry literals
///
/// Typed GeoJSON literals are always longitude first and ignore this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AxisOrder {
    /// `[lon, lat]`, as in GeoJSON
    #[default]
    LonLat,
    /// `[lat, lon]`, as in most web map widgets
    LatLon,
}

/// Configuration for building a catalog
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Color used when a record's color is missing or invalid
    pub default_color: HexColor,
    /// Layer assigned to records without one
    pub default_layer: String,
    /// Outline weight in pixels for composed features
    pub weight: f64,
    /// Fill opacity (0.0-1.0) for composed features
    pub fill_opacity: f64,
    /// Categories rendered as point markers instead of composed shapes.
    /// Matched case-insensitively after trimming.
    pub point_categories: Vec<String>,
    /// Whether marker coordinates extend the catalog bounding box
    pub bbox_includes_points: bool,
    /// Number of vertices used when a circle has to become a polygon
    pub circle_segments: usize,
    /// Axis order of bare coordinate pairs
    pub axis_order: AxisOrder,
    /// Classify records on the rayon thread pool
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_color: HexColor::from_static(DEFAULT_COLOR),
            default_layer: "Default".to_string(),
            weight: 2.0,
            fill_opacity: 0.2,
            point_categories: vec!["Navigation".to_string(), "Waypoint".to_string()],
            bbox_includes_points: false,
            circle_segments: 64,
            axis_order: AxisOrder::LonLat,
            parallel: true,
        }
    }
}

impl Config {
    /// Check whether a (trimmed) category is rendered as a point marker
    pub fn is_point_category(&self, category: &str) -> bool {
        let category = category.trim();
        self.point_categories
            .iter()
            .any(|c| c.trim().eq_ignore_ascii_case(category))
    }

    /// Circle vertex count, never below the minimum for a usable ring
    #[inline]
    pub fn effective_circle_segments(&self) -> usize {
        self.circle_segments.max(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_color.as_str(), DEFAULT_COLOR);
        assert_eq!(config.default_layer, "Default");
        assert_eq!(config.circle_segments, 64);
        assert_eq!(config.axis_order, AxisOrder::LonLat);
        assert!(!config.bbox_includes_points);
    }

    #[test]
    fn test_point_category_matching() {
        let config = Config::default();
        assert!(config.is_point_category("Navigation"));
        assert!(config.is_point_category("  waypoint "));
        assert!(!config.is_point_category("CTR"));
    }

    #[test]
    fn test_circle_segments_floor() {
        let config = Config {
            circle_segments: 3,
            ..Config::default()
        };
        assert_eq!(config.effective_circle_segments(), 8);
    }
}
