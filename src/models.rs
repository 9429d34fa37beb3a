//! Data models for the dashboard.
//!
//! This module contains the loaded result table, the cluster selection,
//! the derived cluster profiles and the report structures handed to the
//! presenters.

use crate::error::SelectorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which part of the table the user wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClusterSelector {
    /// Every region, unfiltered.
    #[default]
    All,
    /// Only regions assigned to this cluster label.
    Cluster(u32),
}

impl ClusterSelector {
    /// Returns true if a record with `cluster_id` passes this selection.
    pub fn matches(&self, cluster_id: u32) -> bool {
        match self {
            ClusterSelector::All => true,
            ClusterSelector::Cluster(id) => *id == cluster_id,
        }
    }
}

impl fmt::Display for ClusterSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterSelector::All => write!(f, "All clusters"),
            ClusterSelector::Cluster(id) => write!(f, "Cluster {}", id),
        }
    }
}

impl FromStr for ClusterSelector {
    type Err = SelectorError;

    /// Accepts `all`, `semua`, `Semua Klaster`, `2`, `Cluster 2` or `Klaster 2`.
    /// The last whitespace-separated token carries the label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lowered = trimmed.to_lowercase();

        if matches!(
            lowered.as_str(),
            "all" | "all clusters" | "semua" | "semua klaster"
        ) {
            return Ok(ClusterSelector::All);
        }

        let mut tokens = lowered.split_whitespace();
        let last = tokens.next_back();
        let prefix_ok = match tokens.next() {
            None => true,
            Some(word) => matches!(word, "cluster" | "klaster") && tokens.next().is_none(),
        };

        match last.map(str::parse::<u32>) {
            Some(Ok(id)) if prefix_ok => Ok(ClusterSelector::Cluster(id)),
            _ => Err(SelectorError::Invalid(trimmed.to_string())),
        }
    }
}

impl Serialize for ClusterSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ClusterSelector::All => serializer.serialize_str("all"),
            ClusterSelector::Cluster(id) => serializer.serialize_u32(*id),
        }
    }
}

/// A named numeric indicator value. Missing values are NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicator {
    pub name: String,
    pub value: f64,
}

/// One regency or city from the result table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRecord {
    /// Official display name, possibly with an administrative prefix.
    pub region_name: String,
    /// Normalized name used to join against the boundary document.
    pub map_key: String,
    /// Cluster label assigned upstream.
    pub cluster_id: u32,
    /// Indicator values in configured order.
    pub indicators: Vec<Indicator>,
    /// Remaining source columns, kept verbatim for the table view.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<(String, String)>,
}

impl RegionRecord {
    /// Returns the value of an indicator by name.
    pub fn indicator(&self, name: &str) -> Option<f64> {
        self.indicators
            .iter()
            .find(|i| i.name == name)
            .map(|i| i.value)
    }

    /// Returns a passthrough column value by name.
    pub fn extra(&self, column: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// The full result table as loaded from disk. Immutable once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Path the table was loaded from.
    pub source: PathBuf,
    /// Source header in file order.
    pub columns: Vec<String>,
    /// Indicator column names in configured order.
    pub indicators: Vec<String>,
    /// Records in file order.
    pub records: Vec<RegionRecord>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct cluster labels across the whole table, ascending.
    pub fn cluster_ids(&self) -> Vec<u32> {
        let mut seen: Vec<u32> = self.records.iter().map(|r| r.cluster_id).collect();
        seen.sort_unstable();
        seen.dedup();
        seen
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_ids().len()
    }
}

/// Mean indicator values over the members of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterProfile {
    pub cluster_id: u32,
    /// Number of records in the group.
    pub members: usize,
    /// Per-indicator means in indicator order.
    pub means: Vec<Indicator>,
}

impl ClusterProfile {
    /// Returns the mean of an indicator by name.
    pub fn mean(&self, indicator: &str) -> Option<f64> {
        self.means
            .iter()
            .find(|m| m.name == indicator)
            .map(|m| m.value)
    }
}

/// Cluster profiles in first-appearance order of their cluster label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ClusterProfiles(pub Vec<ClusterProfile>);

impl ClusterProfiles {
    pub fn get(&self, cluster_id: u32) -> Option<&ClusterProfile> {
        self.0.iter().find(|p| p.cluster_id == cluster_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClusterProfile> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cluster labels in output order.
    pub fn cluster_ids(&self) -> Vec<u32> {
        self.0.iter().map(|p| p.cluster_id).collect()
    }
}

/// Display attributes of a cluster label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStyle {
    /// Cluster label.
    pub id: u32,
    /// Human-readable quality level.
    pub label: String,
    /// Fill color as a CSS hex string.
    pub color: String,
}

/// Discrete color map from cluster label to display style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterPalette {
    pub styles: Vec<ClusterStyle>,
    /// Color for labels without a style.
    pub fallback: String,
}

impl ClusterPalette {
    pub fn new(styles: Vec<ClusterStyle>, fallback: impl Into<String>) -> Self {
        Self {
            styles,
            fallback: fallback.into(),
        }
    }

    pub fn color(&self, cluster_id: u32) -> &str {
        self.styles
            .iter()
            .find(|s| s.id == cluster_id)
            .map(|s| s.color.as_str())
            .unwrap_or(&self.fallback)
    }

    /// Legend label, e.g. "Cluster 3 (High)".
    pub fn label(&self, cluster_id: u32) -> String {
        match self.styles.iter().find(|s| s.id == cluster_id) {
            Some(style) => format!("Cluster {} ({})", cluster_id, style.label),
            None => format!("Cluster {}", cluster_id),
        }
    }
}

/// Headline counters shown above the views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    /// Regions passing the current selection.
    pub selected_regions: usize,
    /// Regions in the whole table.
    pub total_regions: usize,
    /// Distinct cluster labels in the whole table.
    pub cluster_count: usize,
}

/// One point of the radar chart in long form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarPoint {
    pub cluster_id: u32,
    pub indicator: String,
    pub value: f64,
}

/// Map coloring of a single region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionColor {
    pub region_name: String,
    pub map_key: String,
    pub cluster_id: u32,
    pub color: String,
    /// Whether this region fills a boundary feature. False when no feature
    /// carries its key, or when an earlier region with the same key
    /// already fills it.
    pub matched: bool,
    /// Indicator values shown with the feature.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub indicators: Vec<Indicator>,
}

/// Result of joining regions to the boundary document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapView {
    /// Where the boundary document came from.
    pub source: String,
    /// Property path used as the join key.
    pub feature_id_key: String,
    /// Regions that fill a boundary feature.
    pub matched: usize,
    /// Per-region colors for the drawn regions.
    pub regions: Vec<RegionColor>,
    /// Map keys with no boundary feature, once each.
    pub unmatched_keys: Vec<String>,
    /// Map keys shared by more than one region or feature, once each.
    pub duplicate_keys: Vec<String>,
    /// Boundary feature keys that no region refers to.
    pub unused_features: Vec<String>,
    /// Set when the boundary document could not be loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MapView {
    /// A map view that could not be drawn.
    pub fn failed(source: String, feature_id_key: String, error: String) -> Self {
        Self {
            source,
            feature_id_key,
            error: Some(error),
            ..Self::default()
        }
    }

    /// Number of join mismatches (unmatched plus duplicated keys).
    pub fn mismatch_count(&self) -> usize {
        self.unmatched_keys.len() + self.duplicate_keys.len()
    }

    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub title: String,
    pub province: String,
    /// Path of the result table.
    pub data_source: String,
    /// Path of the boundary document, if a map was requested.
    pub boundary_source: Option<String>,
    pub selector: ClusterSelector,
    pub generated_at: DateTime<Utc>,
    pub duration_seconds: f64,
    /// Decimal places used for indicator values.
    pub decimals: usize,
}

/// Everything the presenters need for one selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub summary: DashboardSummary,
    pub legend: Vec<ClusterStyle>,
    /// Source columns in header order, for the table view.
    pub columns: Vec<String>,
    pub name_column: String,
    pub cluster_column: String,
    pub indicators: Vec<String>,
    /// Filtered records in source order.
    pub regions: Vec<RegionRecord>,
    pub profiles: ClusterProfiles,
    pub radar: Vec<RadarPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<MapView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}
