//! Guarded boolean operations on multi-polygons
//!
//! The geometry kernel may abort on topologically invalid input. Every operation here
//! validates its operands, runs the kernel under `catch_unwind`, and validates the output,
//! so that a single bad shape degrades to a [`GeometryOpError`] instead of taking the
//! whole batch down.

use geo::{Area, BooleanOps, CoordsIter, MultiPolygon};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::{GeometryOpError, utils};

/// Area below which a boolean result is considered empty (squared degrees)
pub const AREA_EPSILON: f64 = 1e-12;

/// Boolean operation kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BooleanOp {
    Intersection,
    Difference,
    Union,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BooleanOp::Intersection => "intersection",
            BooleanOp::Difference => "difference",
            BooleanOp::Union => "union",
        };
        f.write_str(name)
    }
}

/// Run `op` on two multi-polygons
pub fn apply(
    op: BooleanOp,
    subject: &MultiPolygon<f64>,
    clip: &MultiPolygon<f64>,
) -> Result<MultiPolygon<f64>, GeometryOpError> {
    #[cfg(feature = "profiling")]
    profiling::scope!("ops::apply");

    guarded(op, subject, clip, |subject, clip| match op {
        BooleanOp::Intersection => subject.intersection(clip),
        BooleanOp::Difference => subject.difference(clip),
        BooleanOp::Union => subject.union(clip),
    })
}

/// Validate operands, run `kernel` under `catch_unwind` and validate its output
pub(crate) fn guarded<K>(
    op: BooleanOp,
    subject: &MultiPolygon<f64>,
    clip: &MultiPolygon<f64>,
    kernel: K,
) -> Result<MultiPolygon<f64>, GeometryOpError>
where
    K: FnOnce(&MultiPolygon<f64>, &MultiPolygon<f64>) -> MultiPolygon<f64>,
{
    if !all_finite(subject) || !all_finite(clip) {
        return Err(GeometryOpError::NonFiniteInput { op });
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| kernel(subject, clip)));

    let result = outcome.map_err(|payload| GeometryOpError::Kernel {
        op,
        message: panic_message(payload.as_ref()),
    })?;

    if !all_finite(&result) {
        return Err(GeometryOpError::NonFiniteOutput { op });
    }
    Ok(result)
}

/// Whether a multi-polygon has no polygons or only slivers of negligible area
///
/// A shape whose area does not come out finite is treated as empty too.
#[inline]
pub fn is_effectively_empty(shape: &MultiPolygon<f64>) -> bool {
    if shape.0.is_empty() {
        return true;
    }
    let area = shape.unsigned_area();
    !area.is_finite() || area <= AREA_EPSILON
}

fn all_finite(shape: &MultiPolygon<f64>) -> bool {
    shape.coords_iter().all(|c| utils::is_finite_coord(&c))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
