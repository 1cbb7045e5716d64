//! Styling helpers: color normalization, tooltip text and marker glyphs

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fallback fill/outline color
pub const DEFAULT_COLOR: &str = "#3388FF";

/// A validated `#RRGGBB` color, stored upper-case
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct HexColor(String);

impl HexColor {
    /// Normalize and validate a raw color cell
    ///
    /// Trims, strips one layer of surrounding quotes, prepends `#` when missing and checks
    /// for exactly six hex digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut text = raw.trim();
        for quote in ['"', '\''] {
            if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
                text = text[1..text.len() - 1].trim();
                break;
            }
        }
        let digits = text.strip_prefix('#').unwrap_or(text);
        if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(format!("#{}", digits.to_ascii_uppercase())))
        } else {
            None
        }
    }

    /// Build from a compile-time constant known to be valid
    pub(crate) fn from_static(color: &'static str) -> Self {
        Self::parse(color).unwrap_or_else(|| Self(DEFAULT_COLOR.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self(DEFAULT_COLOR.to_string())
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid color {value:?}"))
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

/// Normalize a raw color, falling back to `fallback`
///
/// The boolean is `true` when a non-empty raw value was rejected.
pub fn normalize_color(raw: Option<&str>, fallback: &HexColor) -> (HexColor, bool) {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        None => (fallback.clone(), false),
        Some(raw) => match HexColor::parse(raw) {
            Some(color) => (color, false),
            None => (fallback.clone(), true),
        },
    }
}

/// Tooltip shown on hover: the name, then the vertical limits when known
pub fn tooltip_text(name: &str, floor: Option<&str>, ceiling: Option<&str>) -> String {
    let floor = floor.map(str::trim).filter(|s| !s.is_empty());
    let ceiling = ceiling.map(str::trim).filter(|s| !s.is_empty());
    match (floor, ceiling) {
        (None, None) => name.to_string(),
        (floor, ceiling) => format!(
            "{name}\n{} / {}",
            floor.unwrap_or("?"),
            ceiling.unwrap_or("?")
        ),
    }
}

/// 16-wind compass rose, clockwise from north
const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Marker glyph for point features: a label in the record color, with an arrow when the
/// name ends in a heading (`"VOR 270°"`, `"Exit NW"`)
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct HeadingGlyph {
    pub label: String,
    pub color: HexColor,
    /// Heading in degrees clockwise from north
    pub heading_deg: Option<f64>,
}

impl HeadingGlyph {
    pub fn new(name: &str, color: HexColor) -> Self {
        Self {
            label: name.to_string(),
            color,
            heading_deg: parse_heading(name),
        }
    }
}

fn parse_heading(name: &str) -> Option<f64> {
    let token = name.split_whitespace().last()?;
    let upper = token.to_ascii_uppercase();
    if let Some(index) = COMPASS_POINTS.iter().position(|p| *p == upper) {
        return Some(index as f64 * 22.5);
    }
    let digits = token.trim_end_matches('°');
    if digits.len() == token.len() && digits.len() != 3 {
        // Bare numbers only count as headings in the usual three-digit form
        return None;
    }
    digits
        .parse::<f64>()
        .ok()
        .filter(|deg| (0.0..=360.0).contains(deg))
        .map(|deg| deg % 360.0)
}
