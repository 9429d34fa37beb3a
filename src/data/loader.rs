//! Result table loading.
//!
//! Reads the clustering result file into a [`Dataset`], validating that
//! every required column is present before any row is processed and
//! deriving the map key of each region once at load time.

use crate::data::normalize::{normalize_with, DEFAULT_PREFIXES};
use crate::error::DataLoadError;
use crate::models::{Dataset, Indicator, RegionRecord};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Column layout and parsing options for the result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Column holding the region display name.
    pub name_column: String,
    /// Column holding the integer cluster label.
    pub cluster_column: String,
    /// Indicator columns, in display order.
    pub indicators: Vec<String>,
    /// Prefixes stripped from region names to build the map key.
    pub name_prefixes: Vec<String>,
    /// Field delimiter.
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            name_column: "Kabupaten_Kota".to_string(),
            cluster_column: "Cluster".to_string(),
            indicators: default_indicators(),
            name_prefixes: DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect(),
            delimiter: b',',
        }
    }
}

/// The six education indicators of the result table.
pub fn default_indicators() -> Vec<String> {
    vec!["APM_SD", "APM_SMP", "APM_SMA", "HLS", "RLS", "Lulus_SMA_Plus"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Where each required column sits in the header.
struct ColumnIndex {
    name: usize,
    cluster: usize,
    indicators: Vec<usize>,
    extras: Vec<(usize, String)>,
}

impl ColumnIndex {
    fn resolve(
        headers: &StringRecord,
        options: &LoadOptions,
        path: &Path,
    ) -> Result<Self, DataLoadError> {
        let find = |column: &str| headers.iter().position(|h| h == column);

        let mut missing = Vec::new();
        let mut lookup = |column: &str| {
            let idx = find(column);
            if idx.is_none() {
                missing.push(column.to_string());
            }
            idx
        };

        let name = lookup(&options.name_column);
        let cluster = lookup(&options.cluster_column);
        let indicators: Vec<Option<usize>> =
            options.indicators.iter().map(|c| lookup(c)).collect();

        if !missing.is_empty() {
            return Err(DataLoadError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            });
        }

        let name = name.unwrap_or_default();
        let cluster = cluster.unwrap_or_default();
        let indicators: Vec<usize> = indicators.into_iter().flatten().collect();

        let extras = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != name && *i != cluster && !indicators.contains(i))
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        Ok(Self {
            name,
            cluster,
            indicators,
            extras,
        })
    }
}

/// Load the result table from a file.
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<Dataset, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    info!("Loading result table: {}", path.display());

    let file = std::fs::File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    load_from_reader(file, path, options)
}

/// Load the result table from any reader. `source` is only used for
/// diagnostics and recorded on the dataset.
pub fn load_from_reader<R: Read>(
    reader: R,
    source: &Path,
    options: &LoadOptions,
) -> Result<Dataset, DataLoadError> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| csv_error(source, e))?
        .clone();
    let columns = ColumnIndex::resolve(&headers, options, source)?;

    debug!(
        "Header has {} columns, {} passthrough",
        headers.len(),
        columns.extras.len()
    );

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row.map_err(|e| csv_error(source, e))?;
        records.push(parse_row(&row, &columns, options)?);
    }

    info!("Loaded {} regions from {}", records.len(), source.display());

    Ok(Dataset {
        source: source.to_path_buf(),
        columns: headers.iter().map(String::from).collect(),
        indicators: options.indicators.clone(),
        records,
    })
}

fn csv_error(path: &Path, err: csv::Error) -> DataLoadError {
    if err.is_io_error() {
        DataLoadError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::from(err),
        }
    } else {
        DataLoadError::Malformed {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

fn parse_row(
    row: &StringRecord,
    columns: &ColumnIndex,
    options: &LoadOptions,
) -> Result<RegionRecord, DataLoadError> {
    let line = row.position().map(|p| p.line()).unwrap_or_default();
    let field = |idx: usize| row.get(idx).unwrap_or("");

    let region_name = field(columns.name).to_string();
    let cluster_raw = field(columns.cluster);
    let cluster_id = cluster_raw
        .parse::<u32>()
        .map_err(|_| DataLoadError::InvalidValue {
            line,
            column: options.cluster_column.clone(),
            value: cluster_raw.to_string(),
        })?;

    let indicators = options
        .indicators
        .iter()
        .zip(&columns.indicators)
        .map(|(name, &idx)| {
            let raw = field(idx);
            parse_indicator(raw)
                .map(|value| Indicator {
                    name: name.clone(),
                    value,
                })
                .ok_or_else(|| DataLoadError::InvalidValue {
                    line,
                    column: name.clone(),
                    value: raw.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let extras = columns
        .extras
        .iter()
        .map(|(idx, name)| (name.clone(), field(*idx).to_string()))
        .collect();

    Ok(RegionRecord {
        map_key: normalize_with(&region_name, &options.name_prefixes),
        region_name,
        cluster_id,
        indicators,
        extras,
    })
}

/// Parse an indicator cell. Empty cells and NaN markers become NaN;
/// negative or unparsable values are rejected.
fn parse_indicator(raw: &str) -> Option<f64> {
    if raw.is_empty() || matches!(raw.to_ascii_lowercase().as_str(), "nan" | "na" | "n/a") {
        return Some(f64::NAN);
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
        _ => None,
    }
}
