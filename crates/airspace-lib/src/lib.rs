//! Airspace Library - Quad Geometry Decoding and Composition
//!
//! This library turns loosely-typed airspace records into a styled, grouped feature catalog
//! ready for map rendering. Each record carries up to four independent "quads"; every quad
//! has a base shape that may be clipped by an intersect shape and carved by an exclude shape,
//! and the quad results are unioned into one geometry per record.
//!
//! # Architecture
//!
//! - **[`decode`]**: Geometry literal decoding with a deterministic decision table
//! - **[`compose_quads`]**: Sequential intersect/exclude/union fold over a record's quads
//! - **[`classify_record`]**: Name/category/color validation and feature construction
//! - **[`Catalog`]**: Grouped output with an aggregate bounding box
//!
//! # Failure policy
//!
//! No single malformed record aborts a batch. Decode, geometry and validation failures are
//! recovered at the smallest scope possible, logged through `tracing`, and returned as
//! [`Warning`]s next to the catalog. Only an unreadable payload is an error.

mod catalog;
mod classify;
mod compose;
mod config;
mod decode;
mod feature;
mod geometry;
mod ops;
mod record;
mod report;
mod style;
pub mod utils;

// Public API exports
pub use catalog::{Catalog, CatalogBuild};
pub use classify::{ClassifiedRecord, classify_record};
pub use compose::{Composition, QuadOutcome, QuadSpec, RecordContext, compose_quads};
pub use config::{AxisOrder, Config};
pub use decode::{decode, decode_str, decode_with};
pub use feature::{ComposedFeature, Feature, PointFeature};
pub use geometry::{Circle, Geometry, GeometryKind};
pub use ops::{BooleanOp, apply as apply_boolean_op, is_effectively_empty};
pub use record::{QUAD_COUNT, RawRecord, parse_payload};
pub use report::{BuildSummary, Effect, Operand, Warning, WarningKind};
pub use style::{DEFAULT_COLOR, HeadingGlyph, HexColor, normalize_color, tooltip_text};

/// Reasons a geometry literal could not be decoded
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("empty geometry literal")]
    Empty,

    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("non-numeric coordinate component: {0}")]
    NonNumeric(String),

    #[error("non-finite coordinate component")]
    NonFinite,

    #[error("coordinate ({x}, {y}) outside the longitude/latitude range")]
    OutOfRange { x: f64, y: f64 },

    #[error("expected at least {expected} coordinates, found {found}")]
    TooFewCoordinates { expected: usize, found: usize },

    #[error("closed ring with only {0} coordinates")]
    DegenerateRing(usize),

    #[error("ring is not closed")]
    OpenRing,

    #[error("invalid circle radius: {0}")]
    InvalidRadius(String),

    #[error("invalid GeoJSON geometry: {0}")]
    GeoJson(String),

    #[error("unsupported GeoJSON geometry type: {0}")]
    UnsupportedType(String),

    #[error("string literal nested too deeply")]
    NestedString,

    #[error("unrecognized geometry shape: {0}")]
    Unrecognized(String),
}

/// Failures of a boolean geometry operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryOpError {
    #[error("{op} operand contains non-finite coordinates")]
    NonFiniteInput { op: BooleanOp },

    #[error("{op} produced non-finite coordinates")]
    NonFiniteOutput { op: BooleanOp },

    #[error("{op} aborted inside the geometry kernel: {message}")]
    Kernel { op: BooleanOp, message: String },
}

/// Record-level validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing or blank name")]
    MissingName,

    #[error("missing or blank category")]
    MissingCategory,
}

/// Batch-level errors. These are the only failures surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON array of records")]
    NotAnArray,

    #[error("malformed JSONP wrapper: {0}")]
    Jsonp(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
