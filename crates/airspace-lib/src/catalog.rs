//! Catalog - Top-level output of a batch build
//!
//! Groups classified features by category and layer and tracks the aggregate bounding box
//! used for viewport fitting. A catalog is built in one pass from a complete batch and is
//! immutable afterwards; a refresh builds a new catalog and replaces the old one.

use geo::Rect;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::classify::{ClassifiedRecord, classify_record};
use crate::config::Config;
use crate::feature::Feature;
use crate::record::{RawRecord, parse_payload};
use crate::report::{BuildSummary, Effect, Warning, WarningKind};
use crate::{Result, utils};

type LayerMap = BTreeMap<String, Vec<Feature>>;

/// Features grouped by category, then layer, in input order within a layer
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Catalog {
    groups: BTreeMap<String, LayerMap>,
    /// Extent of all composed features (and markers when configured)
    bounding_box: Option<Rect<f64>>,
}

/// A catalog together with the diagnostics gathered while building it
#[derive(Clone, Debug, Default)]
pub struct CatalogBuild {
    pub catalog: Catalog,
    pub warnings: Vec<Warning>,
    pub summary: BuildSummary,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Catalog {
    /// Build a catalog from raw payload text (bare JSON array or JSONP)
    ///
    /// Fails only when the payload as a whole is unusable; individual records never abort
    /// the build.
    pub fn from_payload(text: &str, config: &Config) -> Result<CatalogBuild> {
        let items = parse_payload(text)?;
        Ok(Self::from_values(&items, config))
    }

    /// Build a catalog from the elements of the payload array
    pub fn from_values(items: &[Value], config: &Config) -> CatalogBuild {
        let mut warnings = Vec::new();
        let mut records = Vec::with_capacity(items.len());
        let mut indices = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            match RawRecord::from_json(item) {
                Ok(record) => {
                    records.push(record);
                    indices.push(index);
                }
                Err(error) => {
                    let warning = Warning {
                        record_index: index,
                        record_name: None,
                        category: None,
                        quad: None,
                        kind: WarningKind::Invalid(error),
                        effect: Effect::RecordDropped,
                    };
                    warning.log();
                    warnings.push(warning);
                }
            }
        }

        let classified = classify_all(&records, &indices, config);
        let mut build = Self::assemble(classified, items.len(), config);
        warnings.append(&mut build.warnings);
        warnings.sort_by_key(|w| w.record_index);
        build.summary.dropped += build.summary.records - records.len();
        build.summary.warnings = warnings.len();
        build.warnings = warnings;
        build
    }

    /// Build a catalog from already parsed records
    pub fn build(records: &[RawRecord], config: &Config) -> CatalogBuild {
        let indices: Vec<usize> = (0..records.len()).collect();
        let classified = classify_all(records, &indices, config);
        Self::assemble(classified, records.len(), config)
    }

    fn assemble(classified: Vec<ClassifiedRecord>, total: usize, config: &Config) -> CatalogBuild {
        let mut catalog = Catalog::default();
        let mut warnings = Vec::new();
        let mut summary = BuildSummary {
            records: total,
            ..BuildSummary::default()
        };

        for record in classified {
            warnings.extend(record.warnings);
            match record.feature {
                Some(feature) => {
                    match &feature {
                        Feature::Composed(_) => summary.composed += 1,
                        Feature::Point(_) => summary.points += 1,
                    }
                    catalog.insert(feature, config);
                }
                None => summary.dropped += 1,
            }
        }
        summary.warnings = warnings.len();

        tracing::info!(
            records = summary.records,
            composed = summary.composed,
            points = summary.points,
            dropped = summary.dropped,
            warnings = summary.warnings,
            "Built airspace catalog"
        );

        CatalogBuild {
            catalog,
            warnings,
            summary,
        }
    }

    fn insert(&mut self, feature: Feature, config: &Config) {
        let counts_for_extent = match &feature {
            Feature::Composed(_) => true,
            Feature::Point(_) => config.bbox_includes_points,
        };
        if counts_for_extent {
            if let Some(rect) = feature.bounding_rect() {
                utils::expand_extent(&mut self.bounding_box, rect);
            }
        }

        self.groups
            .entry(feature.category().to_string())
            .or_default()
            .entry(feature.layer().to_string())
            .or_default()
            .push(feature);
    }

    /// Category names, sorted
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Layer names of a category, sorted
    pub fn layers(&self, category: &str) -> impl Iterator<Item = &str> {
        self.groups
            .get(category)
            .into_iter()
            .flat_map(|layers| layers.keys().map(String::as_str))
    }

    /// Features of one `(category, layer)` group, in input order
    pub fn features(&self, category: &str, layer: &str) -> &[Feature] {
        self.groups
            .get(category)
            .and_then(|layers| layers.get(layer))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All features with their group keys
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Feature)> {
        self.groups.iter().flat_map(|(category, layers)| {
            layers.iter().flat_map(move |(layer, features)| {
                features
                    .iter()
                    .map(move |feature| (category.as_str(), layer.as_str(), feature))
            })
        })
    }

    /// Total number of features
    pub fn len(&self) -> usize {
        self.groups
            .values()
            .flat_map(|layers| layers.values())
            .map(Vec::len)
            .sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Aggregate extent as `[min_lon, min_lat, max_lon, max_lat]`
    ///
    /// Returns `None` when no feature contributes to the extent.
    pub fn bounding_box(&self) -> Option<[f64; 4]> {
        self.bounding_box.as_ref().map(utils::rect_to_bbox)
    }

    /// Center of the aggregate extent as `(lon, lat)`
    #[inline]
    pub fn center(&self) -> Option<(f64, f64)> {
        self.bounding_box()
            .map(|[min_lon, min_lat, max_lon, max_lat]| {
                ((min_lon + max_lon) / 2.0, (min_lat + max_lat) / 2.0)
            })
    }

    /// GeoJSON view of the whole catalog, carrying the aggregate bbox
    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        geojson::FeatureCollection {
            bbox: self.bounding_box().map(|bbox| bbox.to_vec()),
            features: self.iter().map(|(_, _, feature)| feature.to_geojson()).collect(),
            foreign_members: None,
        }
    }
}

/// Classify records, in parallel when configured; output order matches input order
fn classify_all(
    records: &[RawRecord],
    indices: &[usize],
    config: &Config,
) -> Vec<ClassifiedRecord> {
    if config.parallel {
        records
            .par_iter()
            .zip(indices.par_iter())
            .map(|(record, &index)| classify_record(index, record, config))
            .collect()
    } else {
        records
            .iter()
            .zip(indices)
            .map(|(record, &index)| classify_record(index, record, config))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(x: f64, y: f64, size: f64) -> String {
        format!(
            "[[{x},{y}],[{},{y}],[{},{}],[{x},{}],[{x},{y}]]",
            x + size,
            x + size,
            y + size,
            y + size
        )
    }

    fn sample_payload() -> Vec<Value> {
        vec![
            json!({"nom": "CTR A", "categorie": "CTR", "couleur": "ff0000", "p1": square(0.0, 0.0, 2.0)}),
            json!({"nom": "TMA B", "categorie": "TMA", "couche": "High", "p1": square(10.0, 10.0, 1.0)}),
            json!({"nom": "Ghost", "categorie": "  ", "p1": square(50.0, 50.0, 1.0)}),
            json!({"nom": "Exit N", "categorie": "Navigation", "p1": "[-5, -5]"}),
            json!("not a record"),
            json!({"nom": "Empty", "categorie": "CTR"}),
        ]
    }

    #[test]
    fn test_catalog_creation() {
        let catalog = Catalog::default();
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
        assert!(catalog.bounding_box().is_none());
    }

    #[test]
    fn test_from_values_groups_and_summary() {
        let build = Catalog::from_values(&sample_payload(), &Config::default());
        let catalog = &build.catalog;

        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.categories().collect::<Vec<_>>(),
            vec!["CTR", "Navigation", "TMA"]
        );
        assert_eq!(catalog.layers("TMA").collect::<Vec<_>>(), vec!["High"]);
        assert_eq!(catalog.features("CTR", "Default").len(), 1);
        assert!(catalog.features("CTR", "High").is_empty());
        assert!(catalog.iter().all(|(_, _, f)| !f.category().is_empty()));

        assert_eq!(build.summary.records, 6);
        assert_eq!(build.summary.composed, 2);
        assert_eq!(build.summary.points, 1);
        assert_eq!(build.summary.dropped, 3);
        assert_eq!(build.summary.warnings, build.warnings.len());
        assert!(
            build
                .warnings
                .windows(2)
                .all(|w| w[0].record_index <= w[1].record_index)
        );
    }

    #[test]
    fn test_bbox_excludes_points_by_default() {
        let build = Catalog::from_values(&sample_payload(), &Config::default());
        assert_eq!(build.catalog.bounding_box(), Some([0.0, 0.0, 11.0, 11.0]));
        assert_eq!(build.catalog.center(), Some((5.5, 5.5)));
    }

    #[test]
    fn test_bbox_includes_points_when_configured() {
        let config = Config {
            bbox_includes_points: true,
            ..Config::default()
        };
        let build = Catalog::from_values(&sample_payload(), &config);
        assert_eq!(build.catalog.bounding_box(), Some([-5.0, -5.0, 11.0, 11.0]));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let sequential = Config {
            parallel: false,
            ..Config::default()
        };
        let a = Catalog::from_values(&sample_payload(), &Config::default());
        let b = Catalog::from_values(&sample_payload(), &sequential);
        assert_eq!(a.catalog, b.catalog);
        assert_eq!(a.warnings, b.warnings);
    }

    #[test]
    fn test_from_payload_jsonp() {
        let text = format!(
            "handleData([{{\"nom\": \"X\", \"categorie\": \"R\", \"p1\": \"{}\"}}])",
            square(0.0, 0.0, 1.0)
        );
        let build = Catalog::from_payload(&text, &Config::default()).unwrap();
        assert_eq!(build.catalog.len(), 1);
    }

    #[test]
    fn test_from_payload_rejects_garbage() {
        assert!(Catalog::from_payload("{\"oops\": 1}", &Config::default()).is_err());
    }

    #[test]
    fn test_to_geojson() {
        let build = Catalog::from_values(&sample_payload(), &Config::default());
        let collection = build.catalog.to_geojson();
        assert_eq!(collection.features.len(), 3);
        assert_eq!(collection.bbox, Some(vec![0.0, 0.0, 11.0, 11.0]));
    }
}
