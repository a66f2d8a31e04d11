use std::path::{Path, PathBuf};

use thiserror::Error;

// ---------------------------------------------------------------------------
// DataError – failures while obtaining or parsing a source
// ---------------------------------------------------------------------------

/// Why a single data source could not be produced.
///
/// Filtering, joining and aggregation never fail; only getting bytes off
/// disk (or the network) and turning them into typed records can. An empty
/// filter result is *not* represented here, see
/// [`Section`](crate::analysis::Section).
///
/// The payloads are plain strings so a failed source can be kept around
/// (and cloned into the UI) next to the sources that loaded fine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// The file or directory is missing, unreadable, or a fetch failed.
    #[error("data unavailable at {}: {reason}", path.display())]
    DataUnavailable { path: PathBuf, reason: String },

    /// An expected column is absent or a cell could not be parsed.
    #[error("schema error in {}: {message}", path.display())]
    Schema { path: PathBuf, message: String },
}

impl DataError {
    pub fn unavailable(path: &Path, reason: impl ToString) -> Self {
        DataError::DataUnavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn schema(path: &Path, message: impl ToString) -> Self {
        DataError::Schema {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Path of the source this error refers to.
    pub fn path(&self) -> &Path {
        match self {
            DataError::DataUnavailable { path, .. } | DataError::Schema { path, .. } => path,
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigError – problems with the analysis configuration file
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
