//! Boundary document handling for the map view.
//!
//! The boundary document is treated as an opaque GeoJSON feature
//! collection. The only thing read from a feature is the property used
//! as its join key; geometry is passed through untouched.

use crate::error::GeoDocumentError;
use crate::models::{ClusterPalette, MapView, RegionColor, RegionRecord};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A loaded boundary feature collection.
#[derive(Debug, Clone)]
pub struct BoundaryDocument {
    source: PathBuf,
    document: Value,
}

impl BoundaryDocument {
    /// Load and validate a boundary document from disk.
    pub fn load(path: &Path) -> Result<Self, GeoDocumentError> {
        if !path.exists() {
            return Err(GeoDocumentError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| GeoDocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let document: Value =
            serde_json::from_str(&content).map_err(|source| GeoDocumentError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let doc = Self::from_value(document, path)?;
        info!(
            "Loaded {} boundary features from {}",
            doc.features().len(),
            path.display()
        );
        Ok(doc)
    }

    /// Wrap an already parsed document, checking it is a feature collection.
    pub fn from_value(document: Value, source: &Path) -> Result<Self, GeoDocumentError> {
        let is_collection = document.get("type").and_then(Value::as_str)
            == Some("FeatureCollection")
            && document.get("features").map_or(false, Value::is_array);

        if !is_collection {
            return Err(GeoDocumentError::NotFeatureCollection {
                path: source.to_path_buf(),
            });
        }

        Ok(Self {
            source: source.to_path_buf(),
            document,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn features(&self) -> &[Value] {
        self.document
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Join key of every feature that has one, in document order.
    pub fn feature_keys(&self, key_path: &str) -> Vec<String> {
        self.features()
            .iter()
            .filter_map(|f| feature_key(f, key_path))
            .collect()
    }

    /// Copy of the document with a fill style on every feature filled by
    /// a matched region. Other features are left as they are.
    ///
    /// Each filled feature also carries the region's cluster and indicator
    /// values, rounded to `decimals`, for viewers that show properties on
    /// hover. Missing values become `null`.
    pub fn colorize(&self, key_path: &str, regions: &[RegionColor], decimals: usize) -> Value {
        let by_key: HashMap<&str, &RegionColor> = regions
            .iter()
            .filter(|r| r.matched)
            .map(|r| (r.map_key.as_str(), r))
            .collect();

        let mut document = self.document.clone();
        if let Some(features) = document.get_mut("features").and_then(Value::as_array_mut) {
            for feature in features.iter_mut() {
                let Some(key) = feature_key(feature, key_path) else {
                    continue;
                };
                let Some(region) = by_key.get(key.as_str()) else {
                    continue;
                };

                let mut style = json!({
                    "region_name": region.region_name,
                    "cluster": region.cluster_id,
                    "fill": region.color,
                    "fill-opacity": 0.8,
                    "stroke": "#555555",
                    "stroke-width": 0.5,
                });
                for indicator in &region.indicators {
                    style[indicator.name.as_str()] = json!(round_to(indicator.value, decimals));
                }

                if !feature.get("properties").map_or(false, Value::is_object) {
                    feature["properties"] = json!({});
                }
                if let (Some(props), Value::Object(style)) =
                    (feature["properties"].as_object_mut(), style)
                {
                    props.extend(style);
                }
            }
        }

        document
    }
}

fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals.min(10) as i32);
    (value * factor).round() / factor
}

/// Look up a dotted property path such as `properties.NAME_2`.
pub fn property_at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| current.get(segment))
}

/// The join key of a feature as a string. Numeric keys are stringified.
pub fn feature_key(feature: &Value, key_path: &str) -> Option<String> {
    match property_at(feature, key_path)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Join the drawn regions against the boundary document.
///
/// Regions whose key has no feature stay uncolored on the map, as do
/// regions whose key an earlier region already fills. Both are reported
/// rather than dropped silently; each key is listed once.
pub fn join_regions(
    records: &[&RegionRecord],
    document: &BoundaryDocument,
    key_path: &str,
    palette: &ClusterPalette,
) -> MapView {
    let mut feature_counts: HashMap<String, usize> = HashMap::new();
    for key in document.feature_keys(key_path) {
        *feature_counts.entry(key).or_default() += 1;
    }

    let mut region_counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *region_counts.entry(record.map_key.as_str()).or_default() += 1;
    }

    let mut regions = Vec::with_capacity(records.len());
    let mut unmatched_keys = Vec::new();
    let mut duplicate_keys = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for record in records {
        let key = record.map_key.as_str();
        let features = feature_counts.get(key).copied().unwrap_or(0);
        let first = seen.insert(key);

        if first && features == 0 {
            warn!(
                "No boundary feature for region {:?} (map key {:?})",
                record.region_name, key
            );
            unmatched_keys.push(key.to_string());
        }
        if first && (features > 1 || region_counts[key] > 1) {
            warn!(
                "Map key {:?} is ambiguous: {} regions, {} features",
                key, region_counts[key], features
            );
            duplicate_keys.push(key.to_string());
        }
        if !first && features > 0 {
            debug!(
                "Region {:?} not drawn: key {:?} is already filled",
                record.region_name, key
            );
        }

        regions.push(RegionColor {
            region_name: record.region_name.clone(),
            map_key: key.to_string(),
            cluster_id: record.cluster_id,
            color: palette.color(record.cluster_id).to_string(),
            matched: first && features > 0,
            indicators: record.indicators.clone(),
        });
    }

    let mut unused_features: Vec<String> = feature_counts
        .keys()
        .filter(|k| !region_counts.contains_key(k.as_str()))
        .cloned()
        .collect();
    unused_features.sort();

    let matched = regions.iter().filter(|r| r.matched).count();
    info!(
        "Map join: {} of {} regions matched, {} unmatched, {} ambiguous",
        matched,
        regions.len(),
        unmatched_keys.len(),
        duplicate_keys.len()
    );

    MapView {
        source: document.source().display().to_string(),
        feature_id_key: key_path.to_string(),
        matched,
        regions,
        unmatched_keys,
        duplicate_keys,
        unused_features,
        error: None,
    }
}
