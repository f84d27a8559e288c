use thiserror::Error;
use wordnet_store::StoreError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The dictionary cannot be used as configured.
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A line that should hold an entity could not be decoded.
    #[error("{file} at offset {offset}: {message}")]
    Parse {
        file: String,
        offset: usize,
        message: String,
    },
}

impl Error {
    pub fn is_configuration(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::Store(err) => err.is_configuration(),
            Error::Parse { .. } => false,
        }
    }

    pub(crate) fn parse(file: &str, offset: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            file: file.to_string(),
            offset,
            message: message.into(),
        }
    }
}
