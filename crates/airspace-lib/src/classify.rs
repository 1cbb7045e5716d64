//! Record classification
//!
//! Validates a raw record, normalizes its styling and turns it into either a composed-shape
//! feature or, for point categories, a marker feature.

use crate::compose::{RecordContext, compose_quads};
use crate::config::Config;
use crate::decode::decode_with;
use crate::feature::{ComposedFeature, Feature, PointFeature};
use crate::geometry::Geometry;
use crate::record::RawRecord;
use crate::report::{Effect, Operand, Warning, WarningKind};
use crate::style::{HeadingGlyph, normalize_color, tooltip_text};
use crate::ValidationError;

/// Outcome of classifying one record
#[derive(Clone, Debug, Default)]
pub struct ClassifiedRecord {
    /// `None` when the record was dropped
    pub feature: Option<Feature>,
    pub warnings: Vec<Warning>,
}

impl ClassifiedRecord {
    fn dropped(warnings: Vec<Warning>) -> Self {
        Self {
            feature: None,
            warnings,
        }
    }
}

fn trimmed(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Classify the record at position `index` of the batch
pub fn classify_record(index: usize, record: &RawRecord, config: &Config) -> ClassifiedRecord {
    #[cfg(feature = "profiling")]
    profiling::scope!("classify::classify_record");

    let name = trimmed(record.name.as_ref());
    let category = trimmed(record.category.as_ref());
    let context = RecordContext {
        index,
        name: name.clone(),
        category: category.clone(),
    };

    let mut warnings = Vec::new();
    let mut report = |quad: Option<usize>, kind: WarningKind, effect: Effect| {
        let warning = context.warning(quad, kind, effect);
        warning.log();
        warnings.push(warning);
    };

    let (name, category) = match (name, category) {
        (Some(name), Some(category)) => (name, category),
        (None, _) => {
            let kind = WarningKind::Invalid(ValidationError::MissingName);
            report(None, kind, Effect::RecordDropped);
            return ClassifiedRecord::dropped(warnings);
        }
        (_, None) => {
            let kind = WarningKind::Invalid(ValidationError::MissingCategory);
            report(None, kind, Effect::RecordDropped);
            return ClassifiedRecord::dropped(warnings);
        }
    };
    let layer = trimmed(record.layer.as_ref()).unwrap_or_else(|| config.default_layer.clone());

    let (color, defaulted) = normalize_color(record.color.as_deref(), &config.default_color);
    if defaulted {
        let raw = record.color.clone().unwrap_or_default();
        report(None, WarningKind::InvalidColor { raw }, Effect::Defaulted);
    }

    if config.is_point_category(&category) {
        let literal = record.quads[0].base.as_ref();
        let decoded = match literal {
            Some(literal) => decode_with(literal, config.axis_order).map_err(|error| {
                WarningKind::Decode {
                    operand: Operand::Marker,
                    error,
                }
            }),
            None => Err(WarningKind::Decode {
                operand: Operand::Marker,
                error: crate::DecodeError::Empty,
            }),
        };
        let coordinate = match decoded {
            Ok(Geometry::Point(point)) => point,
            Ok(other) => {
                let kind = WarningKind::WrongKind {
                    operand: Operand::Marker,
                    kind: other.kind(),
                    expected: "point",
                };
                report(Some(1), kind, Effect::RecordDropped);
                return ClassifiedRecord::dropped(warnings);
            }
            Err(kind) => {
                report(Some(1), kind, Effect::RecordDropped);
                return ClassifiedRecord::dropped(warnings);
            }
        };

        let glyph = HeadingGlyph::new(&name, color);
        return ClassifiedRecord {
            feature: Some(Feature::Point(PointFeature {
                name,
                category,
                layer,
                coordinate,
                glyph,
            })),
            warnings,
        };
    }

    let composition = compose_quads(&record.quads, &context, config);
    warnings.extend(composition.warnings);

    let Some(geometry) = composition.geometry else {
        let warning = context.warning(None, WarningKind::NoContribution, Effect::RecordDropped);
        warning.log();
        warnings.push(warning);
        return ClassifiedRecord::dropped(warnings);
    };

    let tooltip = tooltip_text(&name, record.floor.as_deref(), record.ceiling.as_deref());
    ClassifiedRecord {
        feature: Some(Feature::Composed(ComposedFeature {
            name,
            category,
            layer,
            geometry,
            color,
            weight: config.weight,
            fill_opacity: config.fill_opacity,
            tooltip,
        })),
        warnings,
    }
}
