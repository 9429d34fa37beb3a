//! Error types for loading dashboard inputs.
//!
//! Loading the result table and the boundary document are the only
//! fallible steps of the pipeline; everything downstream is a pure
//! transformation over data that already loaded successfully.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the clustering result table.
///
/// Any of these is fatal: no view renders without the table.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// The source file does not exist.
    #[error("data file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The source file exists but could not be read.
    #[error("failed to read data file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid delimited text.
    #[error("malformed data file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The header lacks one or more required columns.
    #[error("data file {} is missing required columns: {}", path.display(), missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    /// A cell could not be parsed as the type its column requires.
    #[error("invalid value {value:?} in column {column} at line {line}")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },
}

/// Errors raised while loading the boundary document.
///
/// Fatal for the map view only.
#[derive(Debug, Error)]
pub enum GeoDocumentError {
    #[error("boundary document not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read boundary document {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse boundary document {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document parsed but is not a feature collection.
    #[error("boundary document {} is not a FeatureCollection", path.display())]
    NotFeatureCollection { path: PathBuf },
}

/// Error for a cluster selection that cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("invalid cluster selection {0:?} (expected \"all\" or a cluster number)")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = DataLoadError::MissingColumns {
            path: PathBuf::from("hasil.csv"),
            missing: vec!["Cluster".to_string(), "HLS".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("hasil.csv"));
        assert!(msg.contains("Cluster, HLS"));
    }

    #[test]
    fn test_selector_error_message() {
        let err = SelectorError::Invalid("lots".to_string());
        assert!(err.to_string().contains("\"lots\""));
    }
}
