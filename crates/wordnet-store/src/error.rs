use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// First failure to open a backing file. Later calls for the same file
    /// report [`StoreError::Unavailable`] without touching the filesystem.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} is unavailable (it could not be opened earlier)")]
    Unavailable(String),
    #[error("empty search key for {0}")]
    EmptyKey(String),
    #[error("offset {offset} is past the end of {file} ({len} bytes)")]
    InvalidOffset {
        file: String,
        offset: usize,
        len: usize,
    },
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed bloom filter {}: {reason}", path.display())]
    Bloom { path: PathBuf, reason: String },
}

impl StoreError {
    /// True for errors that mean the dictionary itself is misconfigured.
    pub fn is_configuration(&self) -> bool {
        matches!(self, StoreError::Open { .. } | StoreError::Unavailable(_))
    }

    pub(crate) fn io(file: &str, source: io::Error) -> Self {
        StoreError::Io {
            file: file.to_string(),
            source,
        }
    }
}
