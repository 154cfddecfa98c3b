use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading the boundary or cluster inputs. Any of these aborts
/// the whole load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON in {}: {message}", .path.display())]
    GeoJson { path: PathBuf, message: String },

    #[error("{} holds a bare geometry, expected features", .path.display())]
    NotFeatureCollection { path: PathBuf },

    #[error("cannot read spreadsheet {}: {message}", .path.display())]
    Spreadsheet { path: PathBuf, message: String },

    #[error("cannot read CSV {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unsupported table format {} (expected .xlsx, .xlsm, .xls, .ods or .csv)", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("{} has no header row", .path.display())]
    EmptyTable { path: PathBuf },

    #[error("column {column:?} not found in {}", .path.display())]
    MissingColumn { path: PathBuf, column: String },
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}
