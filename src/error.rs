use std::path::PathBuf;

use thiserror::Error;

/// Failures locating or replacing the source spreadsheet.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Nothing to show: the data directory holds no accepted file.
    #[error("no spreadsheet ({extensions}) found in {}", dir.display())]
    NoSpreadsheet { dir: PathBuf, extensions: String },

    #[error("file name {0:?} is not an accepted spreadsheet")]
    RejectedName(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SourceError::Io {
            path: path.into(),
            source,
        }
    }
}
