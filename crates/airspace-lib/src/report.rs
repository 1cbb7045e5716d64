//! Diagnostics collected while building a catalog
//!
//! Every recoverable failure becomes a [`Warning`]: it is logged when raised and returned to
//! the caller with the catalog, so data-quality issues can be traced back to the record,
//! quad and operation that caused them.

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::geometry::GeometryKind;
use crate::ops::BooleanOp;
use crate::{DecodeError, GeometryOpError, ValidationError};

/// Which literal of a record a warning is about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    Base,
    Intersect,
    Exclude,
    Marker,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operand::Base => "base",
            Operand::Intersect => "intersect",
            Operand::Exclude => "exclude",
            Operand::Marker => "marker",
        };
        f.write_str(name)
    }
}

/// What happened to the data as a consequence of a warning
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// The quad was never applied
    QuadSkipped,
    /// The quad was applied but contributes nothing
    QuadDropped,
    /// An intersect/exclude modifier was treated as absent
    ModifierIgnored,
    /// A failed exclude left the shape as it was before
    ShapeRetained,
    /// A failed union lost this quad's contribution
    ContributionLost,
    /// The whole record is missing from the catalog
    RecordDropped,
    /// A default value replaced an invalid one
    Defaulted,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Effect::QuadSkipped => "quad skipped",
            Effect::QuadDropped => "quad dropped",
            Effect::ModifierIgnored => "modifier ignored",
            Effect::ShapeRetained => "shape retained",
            Effect::ContributionLost => "contribution lost",
            Effect::RecordDropped => "record dropped",
            Effect::Defaulted => "default used",
        };
        f.write_str(text)
    }
}

/// Cause of a warning
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum WarningKind {
    #[error("{operand} literal could not be decoded: {error}")]
    Decode {
        operand: Operand,
        error: DecodeError,
    },

    #[error("{operand} literal is a {kind}, expected {expected}")]
    WrongKind {
        operand: Operand,
        kind: GeometryKind,
        expected: &'static str,
    },

    #[error("{operand} shape has no area")]
    ZeroArea { operand: Operand },

    #[error("{op} produced an empty shape")]
    EmptyResult { op: BooleanOp },

    #[error("{0}")]
    OpFailed(GeometryOpError),

    #[error("{0}")]
    Invalid(ValidationError),

    #[error("no quad contributed a shape")]
    NoContribution,

    #[error("invalid color {raw:?}")]
    InvalidColor { raw: String },
}

/// A recoverable failure attached to a record (and quad, when relevant)
#[derive(Clone, Debug, PartialEq)]
pub struct Warning {
    /// Position of the record in the input batch
    pub record_index: usize,
    /// Trimmed record name, if any
    pub record_name: Option<String>,
    /// Trimmed category, if any
    pub category: Option<String>,
    /// One-based quad number
    pub quad: Option<usize>,
    pub kind: WarningKind,
    pub effect: Effect,
}

impl Warning {
    /// Log the warning through `tracing`
    pub fn log(&self) {
        tracing::warn!(
            record_index = self.record_index,
            record = self.record_name.as_deref().unwrap_or("<unnamed>"),
            category = self.category.as_deref().unwrap_or("<none>"),
            quad = self.quad,
            effect = %self.effect,
            "{}",
            self.kind
        );
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record #{} ({})",
            self.record_index,
            self.record_name.as_deref().unwrap_or("<unnamed>")
        )?;
        if let Some(quad) = self.quad {
            write!(f, " quad {quad}")?;
        }
        write!(f, ": {} ({})", self.kind, self.effect)
    }
}

/// Counters describing one catalog build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BuildSummary {
    /// Records in the input batch
    pub records: usize,
    /// Composed-shape features emitted
    pub composed: usize,
    /// Point features emitted
    pub points: usize,
    /// Records dropped for any reason
    pub dropped: usize,
    /// Total number of warnings
    pub warnings: usize,
}
