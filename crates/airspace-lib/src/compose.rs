//! Quad composition
//!
//! A record's quads are folded left to right. Each quad starts from its base shape, is
//! optionally clipped by its intersect shape and carved by its exclude shape, and the result
//! is unioned into the accumulated record shape. The fold is strictly sequential.

use geo::{Area, MultiPolygon};
use serde_json::Value;

use crate::config::Config;
use crate::decode::decode_with;
use crate::geometry::Geometry;
use crate::ops::{self, BooleanOp};
use crate::record::QUAD_COUNT;
use crate::report::{Effect, Operand, Warning, WarningKind};
use crate::GeometryOpError;

/// Raw literals of one quad; any of them may be absent
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuadSpec {
    pub base: Option<Value>,
    pub intersect: Option<Value>,
    pub exclude: Option<Value>,
}

impl QuadSpec {
    /// A quad with only a base literal
    pub fn base(base: Value) -> Self {
        Self {
            base: Some(base),
            ..Self::default()
        }
    }

    pub fn with_intersect(mut self, intersect: Value) -> Self {
        self.intersect = Some(intersect);
        self
    }

    pub fn with_exclude(mut self, exclude: Value) -> Self {
        self.exclude = Some(exclude);
        self
    }
}

/// Identity of the record being composed, attached to every warning
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordContext {
    pub index: usize,
    pub name: Option<String>,
    pub category: Option<String>,
}

impl RecordContext {
    pub(crate) fn warning(&self, quad: Option<usize>, kind: WarningKind, effect: Effect) -> Warning {
        Warning {
            record_index: self.index,
            record_name: self.name.clone(),
            category: self.category.clone(),
            quad,
            kind,
            effect,
        }
    }
}

/// Per-quad result of the fold
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QuadOutcome {
    /// No base literal
    Absent,
    /// The base could not be used
    Skipped,
    /// Clipping or carving left nothing
    Dropped,
    /// The quad shape could not be merged into the accumulator
    Lost,
    /// The quad added a shape of the given area (squared degrees)
    Contributed { area: f64 },
}

/// Result of composing one record
#[derive(Clone, Debug)]
pub struct Composition {
    /// Union of all contributing quads, `None` if nothing contributed
    pub geometry: Option<MultiPolygon<f64>>,
    pub outcomes: [QuadOutcome; QUAD_COUNT],
    pub warnings: Vec<Warning>,
}

impl Composition {
    /// Number of quads whose shape made it into the result
    pub fn contributing_quads(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, QuadOutcome::Contributed { .. }))
            .count()
    }
}

/// Modifier application result within one quad
enum Step {
    Continue(MultiPolygon<f64>),
    Drop,
}

struct QuadFold<'a, F> {
    config: &'a Config,
    context: &'a RecordContext,
    boolean_op: F,
    warnings: Vec<Warning>,
}

/// Compose a record's quads into a single shape
pub fn compose_quads(
    quads: &[QuadSpec; QUAD_COUNT],
    context: &RecordContext,
    config: &Config,
) -> Composition {
    #[cfg(feature = "profiling")]
    profiling::scope!("compose::compose_quads");

    compose_quads_with(quads, context, config, ops::apply)
}

/// Same fold as [`compose_quads`] with the boolean operation supplied by the caller
pub(crate) fn compose_quads_with<F>(
    quads: &[QuadSpec; QUAD_COUNT],
    context: &RecordContext,
    config: &Config,
    boolean_op: F,
) -> Composition
where
    F: Fn(
        BooleanOp,
        &MultiPolygon<f64>,
        &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, GeometryOpError>,
{
    let mut fold = QuadFold {
        config,
        context,
        boolean_op,
        warnings: Vec::new(),
    };
    let mut combined: Option<MultiPolygon<f64>> = None;
    let mut outcomes = [QuadOutcome::Absent; QUAD_COUNT];

    for (i, quad) in quads.iter().enumerate() {
        let number = i + 1;
        let Some(shape) = fold.quad_shape(number, quad, &mut outcomes[i]) else {
            continue;
        };
        let area = shape.unsigned_area();

        combined = match combined {
            None => Some(shape),
            Some(acc) => match (fold.boolean_op)(BooleanOp::Union, &acc, &shape) {
                Ok(merged) => Some(merged),
                Err(error) => {
                    fold.push(number, WarningKind::OpFailed(error), Effect::ContributionLost);
                    outcomes[i] = QuadOutcome::Lost;
                    Some(acc)
                }
            },
        };
        if outcomes[i] != QuadOutcome::Lost {
            outcomes[i] = QuadOutcome::Contributed { area };
        }
    }

    // Never hand out a shape without area
    let geometry = combined.filter(|shape| !ops::is_effectively_empty(shape));

    Composition {
        geometry,
        outcomes,
        warnings: fold.warnings,
    }
}

impl<F> QuadFold<'_, F>
where
    F: Fn(
        BooleanOp,
        &MultiPolygon<f64>,
        &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, GeometryOpError>,
{
    fn push(&mut self, quad: usize, kind: WarningKind, effect: Effect) {
        let warning = self.context.warning(Some(quad), kind, effect);
        warning.log();
        self.warnings.push(warning);
    }

    /// Decode a literal, reporting failures with `effect`
    fn decode(
        &mut self,
        quad: usize,
        operand: Operand,
        literal: &Value,
        effect: Effect,
    ) -> Option<Geometry> {
        match decode_with(literal, self.config.axis_order) {
            Ok(geometry) => Some(geometry),
            Err(error) => {
                self.push(quad, WarningKind::Decode { operand, error }, effect);
                None
            }
        }
    }

    /// Decode a literal that must enclose an area
    fn areal(
        &mut self,
        quad: usize,
        operand: Operand,
        literal: &Value,
        effect: Effect,
    ) -> Option<MultiPolygon<f64>> {
        let geometry = self.decode(quad, operand, literal, effect)?;
        match geometry.to_multi_polygon(self.config.effective_circle_segments()) {
            Some(shape) => Some(shape),
            None => {
                let kind = WarningKind::WrongKind {
                    operand,
                    kind: geometry.kind(),
                    expected: "polygon or circle",
                };
                self.push(quad, kind, effect);
                None
            }
        }
    }

    fn quad_shape(
        &mut self,
        quad: usize,
        spec: &QuadSpec,
        outcome: &mut QuadOutcome,
    ) -> Option<MultiPolygon<f64>> {
        let base = spec.base.as_ref()?;

        tracing::debug!(
            record = self.context.name.as_deref().unwrap_or("<unnamed>"),
            quad,
            "applying quad"
        );

        *outcome = QuadOutcome::Skipped;
        let mut shape = self.areal(quad, Operand::Base, base, Effect::QuadSkipped)?;
        if ops::is_effectively_empty(&shape) {
            let kind = WarningKind::ZeroArea {
                operand: Operand::Base,
            };
            self.push(quad, kind, Effect::QuadSkipped);
            return None;
        }

        if let Some(literal) = &spec.intersect {
            match self.clip(quad, shape, literal) {
                Step::Continue(clipped) => shape = clipped,
                Step::Drop => {
                    *outcome = QuadOutcome::Dropped;
                    return None;
                }
            }
        }

        if let Some(literal) = &spec.exclude {
            match self.carve(quad, shape, literal) {
                Step::Continue(carved) => shape = carved,
                Step::Drop => {
                    *outcome = QuadOutcome::Dropped;
                    return None;
                }
            }
        }

        Some(shape)
    }

    /// Restrict the shape to its overlap with the intersect literal
    fn clip(&mut self, quad: usize, shape: MultiPolygon<f64>, literal: &Value) -> Step {
        let Some(mask) = self.areal(quad, Operand::Intersect, literal, Effect::ModifierIgnored)
        else {
            return Step::Continue(shape);
        };
        match (self.boolean_op)(BooleanOp::Intersection, &shape, &mask) {
            Ok(clipped) if !ops::is_effectively_empty(&clipped) => Step::Continue(clipped),
            Ok(_) => {
                self.push(
                    quad,
                    WarningKind::EmptyResult {
                        op: BooleanOp::Intersection,
                    },
                    Effect::QuadDropped,
                );
                Step::Drop
            }
            Err(error) => {
                self.push(quad, WarningKind::OpFailed(error), Effect::QuadDropped);
                Step::Drop
            }
        }
    }

    /// Remove the exclude literal's area from the shape
    fn carve(&mut self, quad: usize, shape: MultiPolygon<f64>, literal: &Value) -> Step {
        let Some(hole) = self.areal(quad, Operand::Exclude, literal, Effect::ModifierIgnored)
        else {
            return Step::Continue(shape);
        };
        match (self.boolean_op)(BooleanOp::Difference, &shape, &hole) {
            Ok(carved) if !ops::is_effectively_empty(&carved) => Step::Continue(carved),
            Ok(_) => {
                self.push(
                    quad,
                    WarningKind::EmptyResult {
                        op: BooleanOp::Difference,
                    },
                    Effect::QuadDropped,
                );
                Step::Drop
            }
            Err(error) => {
                self.push(quad, WarningKind::OpFailed(error), Effect::ShapeRetained);
                Step::Continue(shape)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(x: f64, y: f64, size: f64) -> Value {
        json!([
            [x, y],
            [x + size, y],
            [x + size, y + size],
            [x, y + size],
            [x, y]
        ])
    }

    fn quads(list: Vec<QuadSpec>) -> [QuadSpec; QUAD_COUNT] {
        let mut out: [QuadSpec; QUAD_COUNT] = Default::default();
        for (slot, quad) in out.iter_mut().zip(list) {
            *slot = quad;
        }
        out
    }

    fn compose(list: Vec<QuadSpec>) -> Composition {
        compose_quads(&quads(list), &RecordContext::default(), &Config::default())
    }

    #[test]
    fn test_single_base_unchanged() {
        let result = compose(vec![QuadSpec::base(json!(
            "[[0,0],[2,0],[2,2],[0,2],[0,0]]"
        ))]);
        let shape = result.geometry.as_ref().unwrap();
        assert_eq!(shape.0.len(), 1);
        assert!((shape.unsigned_area() - 4.0).abs() < 1e-9);
        assert!(result.warnings.is_empty());
        assert_eq!(result.contributing_quads(), 1);
    }

    #[test]
    fn test_intersect_restricts() {
        let result = compose(vec![
            QuadSpec::base(square(0.0, 0.0, 2.0)).with_intersect(square(0.5, 0.5, 1.0)),
        ]);
        let shape = result.geometry.unwrap();
        assert!((shape.unsigned_area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_exclude_carves_annulus() {
        let result = compose(vec![
            QuadSpec::base(square(0.0, 0.0, 2.0)).with_exclude(square(0.5, 0.5, 1.0)),
        ]);
        let shape = result.geometry.unwrap();
        assert!((shape.unsigned_area() - 3.0).abs() < 1e-9);
        assert_eq!(shape.0.len(), 1);
        assert_eq!(shape.0[0].interiors().len(), 1);
    }

    #[test]
    fn test_disjoint_quads_union_order_independent() {
        let forward = compose(vec![
            QuadSpec::base(square(0.0, 0.0, 1.0)),
            QuadSpec::base(square(10.0, 10.0, 1.0)),
        ]);
        let swapped = compose(vec![
            QuadSpec::base(square(10.0, 10.0, 1.0)),
            QuadSpec::base(square(0.0, 0.0, 1.0)),
        ]);
        let forward = forward.geometry.unwrap();
        let swapped = swapped.geometry.unwrap();
        assert_eq!(forward.0.len(), 2);
        assert!((forward.unsigned_area() - 2.0).abs() < 1e-9);
        assert!((forward.unsigned_area() - swapped.unsigned_area()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_intersection_drops_only_that_quad() {
        let result = compose(vec![
            QuadSpec::base(square(0.0, 0.0, 1.0)).with_intersect(square(5.0, 5.0, 1.0)),
            QuadSpec::base(square(20.0, 20.0, 2.0)),
        ]);
        assert_eq!(result.outcomes[0], QuadOutcome::Dropped);
        assert!(matches!(result.outcomes[1], QuadOutcome::Contributed { .. }));
        let shape = result.geometry.unwrap();
        assert!((shape.unsigned_area() - 4.0).abs() < 1e-9);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].quad, Some(1));
        assert_eq!(result.warnings[0].effect, Effect::QuadDropped);
    }

    #[test]
    fn test_undecodable_intersect_is_ignored() {
        let result = compose(vec![
            QuadSpec::base(square(0.0, 0.0, 2.0)).with_intersect(json!("{broken")),
        ]);
        let shape = result.geometry.unwrap();
        assert!((shape.unsigned_area() - 4.0).abs() < 1e-9);
        assert_eq!(result.warnings[0].effect, Effect::ModifierIgnored);
    }

    #[test]
    fn test_exclude_covering_everything_drops_quad() {
        let result = compose(vec![
            QuadSpec::base(square(1.0, 1.0, 1.0)).with_exclude(square(0.0, 0.0, 5.0)),
        ]);
        assert!(result.geometry.is_none());
        assert_eq!(result.outcomes[0], QuadOutcome::Dropped);
    }

    #[test]
    fn test_bad_base_skips_quad() {
        let result = compose(vec![
            QuadSpec::base(json!("nope")),
            QuadSpec::base(json!([1.0, 2.0])),
            QuadSpec::base(square(0.0, 0.0, 1.0)),
        ]);
        assert_eq!(result.outcomes[0], QuadOutcome::Skipped);
        assert_eq!(result.outcomes[1], QuadOutcome::Skipped);
        assert_eq!(result.outcomes[3], QuadOutcome::Absent);
        assert_eq!(result.contributing_quads(), 1);
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_no_quads_yields_none() {
        let result = compose(vec![]);
        assert!(result.geometry.is_none());
        assert!(result.outcomes.iter().all(|o| *o == QuadOutcome::Absent));
    }

    /// Boolean op that fails for `failing` and defers to the real kernel otherwise
    fn failing_op(
        failing: BooleanOp,
    ) -> impl Fn(
        BooleanOp,
        &MultiPolygon<f64>,
        &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, GeometryOpError> {
        move |op, subject, clip| {
            if op == failing {
                ops::guarded(op, subject, clip, |_, _| panic!("kernel failure"))
            } else {
                ops::apply(op, subject, clip)
            }
        }
    }

    fn compose_failing(list: Vec<QuadSpec>, failing: BooleanOp) -> Composition {
        compose_quads_with(
            &quads(list),
            &RecordContext::default(),
            &Config::default(),
            failing_op(failing),
        )
    }

    #[test]
    fn test_failed_difference_keeps_shape() {
        let result = compose_failing(
            vec![QuadSpec::base(square(0.0, 0.0, 2.0)).with_exclude(square(0.5, 0.5, 1.0))],
            BooleanOp::Difference,
        );
        let shape = result.geometry.unwrap();
        assert!((shape.unsigned_area() - 4.0).abs() < 1e-9);
        assert!(shape.0[0].interiors().is_empty());
        assert!(matches!(result.outcomes[0], QuadOutcome::Contributed { .. }));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].effect, Effect::ShapeRetained);
        assert!(matches!(
            result.warnings[0].kind,
            WarningKind::OpFailed(GeometryOpError::Kernel {
                op: BooleanOp::Difference,
                ..
            })
        ));
    }

    #[test]
    fn test_failed_union_keeps_accumulator() {
        let result = compose_failing(
            vec![
                QuadSpec::base(square(0.0, 0.0, 1.0)),
                QuadSpec::base(square(10.0, 10.0, 2.0)),
                QuadSpec::base(square(20.0, 20.0, 3.0)),
            ],
            BooleanOp::Union,
        );
        assert!(matches!(result.outcomes[0], QuadOutcome::Contributed { .. }));
        assert_eq!(result.outcomes[1], QuadOutcome::Lost);
        assert_eq!(result.outcomes[2], QuadOutcome::Lost);
        assert_eq!(result.contributing_quads(), 1);

        let shape = result.geometry.unwrap();
        assert_eq!(shape.0.len(), 1);
        assert!((shape.unsigned_area() - 1.0).abs() < 1e-9);

        assert_eq!(result.warnings.len(), 2);
        assert!(
            result
                .warnings
                .iter()
                .all(|w| w.effect == Effect::ContributionLost)
        );
        assert_eq!(result.warnings[0].quad, Some(2));
        assert_eq!(result.warnings[1].quad, Some(3));
    }

    #[test]
    fn test_failed_intersection_drops_quad() {
        let result = compose_failing(
            vec![
                QuadSpec::base(square(0.0, 0.0, 2.0)).with_intersect(square(0.5, 0.5, 1.0)),
                QuadSpec::base(square(10.0, 10.0, 1.0)),
            ],
            BooleanOp::Intersection,
        );
        assert_eq!(result.outcomes[0], QuadOutcome::Dropped);
        let shape = result.geometry.unwrap();
        assert!((shape.unsigned_area() - 1.0).abs() < 1e-9);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].effect, Effect::QuadDropped);
        assert!(matches!(
            result.warnings[0].kind,
            WarningKind::OpFailed(GeometryOpError::Kernel { .. })
        ));
    }

    #[test]
    fn test_antimeridian_circle_keeps_its_size() {
        let circle = |lon: f64| {
            compose(vec![QuadSpec::base(json!({
                "center": [lon, 10.0],
                "radius": 20000
            }))])
            .geometry
            .unwrap()
        };
        let reference = circle(2.0);
        let crossing = circle(179.95);
        let ratio = crossing.unsigned_area() / reference.unsigned_area();
        assert!((ratio - 1.0).abs() < 1e-6, "area ratio {ratio}");

        let rect = geo::BoundingRect::bounding_rect(&crossing).unwrap();
        assert!(rect.min().x > 179.7);
        assert!(rect.max().x > 180.0 && rect.max().x < 180.2);
    }

    #[test]
    fn test_circle_base_is_polygonized() {
        let result = compose(vec![QuadSpec::base(json!({
            "center": [2.0, 45.0],
            "radius": 5000
        }))]);
        let shape = result.geometry.unwrap();
        assert_eq!(shape.0.len(), 1);
        assert!(shape.unsigned_area() > 0.0);
    }

    #[test]
    fn test_circle_excluded_from_square() {
        let result = compose(vec![QuadSpec::base(square(1.0, 44.0, 2.0)).with_exclude(json!({
            "center": [2.0, 45.0],
            "radius": 10000
        }))]);
        let shape = result.geometry.unwrap();
        assert!(shape.unsigned_area() < 4.0);
        assert_eq!(shape.0[0].interiors().len(), 1);
    }
}
