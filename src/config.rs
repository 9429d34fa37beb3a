//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.eduseg.toml` files.

use crate::data::normalize::DEFAULT_PREFIXES;
use crate::data::{default_indicators, LoadOptions};
use crate::models::{ClusterPalette, ClusterStyle};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".eduseg.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Result table settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Map settings.
    #[serde(default)]
    pub map: MapConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "eduseg_report.md".to_string()
}

/// Result table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path of the clustering result file.
    #[serde(default = "default_data_path")]
    pub path: String,

    /// Column with the region display name.
    #[serde(default = "default_name_column")]
    pub name_column: String,

    /// Column with the cluster label.
    #[serde(default = "default_cluster_column")]
    pub cluster_column: String,

    /// Indicator columns, in display order.
    #[serde(default = "default_indicators")]
    pub indicators: Vec<String>,

    /// Prefixes stripped from region names to build map keys.
    #[serde(default = "default_prefixes")]
    pub name_prefixes: Vec<String>,

    /// Single-character field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            name_column: default_name_column(),
            cluster_column: default_cluster_column(),
            indicators: default_indicators(),
            name_prefixes: default_prefixes(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_data_path() -> String {
    "hasil_klaster_fcm_sumbar.csv".to_string()
}

fn default_name_column() -> String {
    "Kabupaten_Kota".to_string()
}

fn default_cluster_column() -> String {
    "Cluster".to_string()
}

fn default_prefixes() -> Vec<String> {
    DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect()
}

fn default_delimiter() -> String {
    ",".to_string()
}

/// Map settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Path of the boundary document.
    #[serde(default = "default_geojson")]
    pub geojson: String,

    /// Property path holding each feature's join key.
    #[serde(default = "default_feature_id_key")]
    pub feature_id_key: String,

    /// Color for cluster labels without a style.
    #[serde(default = "default_fallback_color")]
    pub fallback_color: String,

    /// Style per cluster label.
    #[serde(default = "default_clusters")]
    pub clusters: Vec<ClusterStyle>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            geojson: default_geojson(),
            feature_id_key: default_feature_id_key(),
            fallback_color: default_fallback_color(),
            clusters: default_clusters(),
        }
    }
}

fn default_geojson() -> String {
    "Kabupaten-Kota (Provinsi Sumatera Barat).geojson".to_string()
}

fn default_feature_id_key() -> String {
    "properties.NAME_2".to_string()
}

fn default_fallback_color() -> String {
    "#bdbdbd".to_string()
}

fn default_clusters() -> Vec<ClusterStyle> {
    [(1, "Low", "#d73027"), (2, "Medium", "#fee08b"), (3, "High", "#1a9850")]
        .into_iter()
        .map(|(id, label, color)| ClusterStyle {
            id,
            label: label.to_string(),
            color: color.to_string(),
        })
        .collect()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Province the regions belong to.
    #[serde(default = "default_province")]
    pub province: String,

    /// Decimal places for indicator values.
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// Include the interpretation paragraph.
    #[serde(default = "default_true")]
    pub include_interpretation: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            province: default_province(),
            decimals: default_decimals(),
            include_interpretation: true,
        }
    }
}

fn default_title() -> String {
    "Education Quality Segmentation Dashboard".to_string()
}

fn default_province() -> String {
    "Sumatera Barat".to_string()
}

fn default_decimals() -> usize {
    2
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.data.indicators.is_empty() {
            bail!("[data] indicators must name at least one column");
        }
        if self.data.delimiter.len() != 1 {
            bail!(
                "[data] delimiter must be a single ASCII character, got {:?}",
                self.data.delimiter
            );
        }
        if self.map.feature_id_key.trim().is_empty() {
            bail!("[map] feature_id_key must not be empty");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.display().to_string();
        }
        if let Some(ref geojson) = args.geojson {
            self.map.geojson = geojson.display().to_string();
        }
        if let Some(ref key) = args.feature_key {
            self.map.feature_id_key = key.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(decimals) = args.decimals {
            self.report.decimals = decimals;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Table loading options derived from `[data]`.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            name_column: self.data.name_column.clone(),
            cluster_column: self.data.cluster_column.clone(),
            indicators: self.data.indicators.clone(),
            name_prefixes: self.data.name_prefixes.clone(),
            delimiter: self.data.delimiter.bytes().next().unwrap_or(b','),
        }
    }

    /// Cluster color map derived from `[map]`.
    pub fn palette(&self) -> ClusterPalette {
        ClusterPalette::new(self.map.clusters.clone(), self.map.fallback_color.clone())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
