//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::ClusterSelector;
use clap::Parser;
use std::path::PathBuf;

/// EduSeg - education quality segmentation dashboard
///
/// Renders the clustering results of regencies/cities as a report:
/// summary counters, a map join, the data table, cluster profiles and
/// a radar chart.
///
/// Examples:
///   eduseg --data hasil_klaster_fcm_sumbar.csv --geojson sumbar.geojson
///   eduseg --cluster 3 --format json -o cluster3.json
///   eduseg --map-output sumbar_colored.geojson --radar-output radar.svg
///   eduseg --interactive
///   eduseg --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Clustering result file (CSV)
    ///
    /// Defaults to the [data] path in .eduseg.toml.
    #[arg(short, long, value_name = "FILE", env = "EDUSEG_DATA")]
    pub data: Option<PathBuf>,

    /// Boundary document (GeoJSON FeatureCollection)
    #[arg(short, long, value_name = "FILE", env = "EDUSEG_GEOJSON")]
    pub geojson: Option<PathBuf>,

    /// Property path of the feature join key
    #[arg(long, value_name = "PATH")]
    pub feature_key: Option<String>,

    /// Cluster selection: "all", a label such as 2, or "Cluster 2"
    #[arg(short = 'k', long, default_value = "all", value_name = "SELECTION")]
    pub cluster: ClusterSelector,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the boundary document with cluster fill colors
    #[arg(long, value_name = "FILE")]
    pub map_output: Option<PathBuf>,

    /// Write the radar chart as SVG
    #[arg(long, value_name = "FILE")]
    pub radar_output: Option<PathBuf>,

    /// Decimal places for indicator values
    #[arg(long, value_name = "N")]
    pub decimals: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .eduseg.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Skip the map view entirely
    #[arg(long, conflicts_with = "require_map")]
    pub no_map: bool,

    /// Treat an unreadable boundary document as fatal
    #[arg(long)]
    pub require_map: bool,

    /// Exit with code 2 when regions fail to join to the map
    ///
    /// Useful in CI when the result file and boundary document are
    /// maintained separately.
    #[arg(long)]
    pub fail_on_mismatch: bool,

    /// Read selections from stdin and print each view
    #[arg(short, long)]
    pub interactive: bool,

    /// Generate a default .eduseg.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.no_map && (self.map_output.is_some() || self.fail_on_mismatch) {
            return Err(
                "--no-map cannot be combined with --map-output or --fail-on-mismatch".to_string(),
            );
        }

        if let Some(decimals) = self.decimals {
            if decimals > 10 {
                return Err("Decimals must be between 0 and 10".to_string());
            }
        }

        if let Some(ref data) = self.data {
            if data.is_dir() {
                return Err(format!("Data path is a directory: {}", data.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
