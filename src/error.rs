use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Row 0 is the header; data rows count from 1.
    #[error("schema error at row {row}: {reason}")]
    Schema { row: usize, reason: String },
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("delimiter `{0}` is not an ASCII character")]
    Delimiter(char),
    #[error("invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Error {
    /// Maps an I/O failure on `path`, keeping "not found" distinct.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { path, source }
        } else {
            Self::Io { path, source }
        }
    }

    pub(crate) fn schema(row: usize, reason: impl Into<String>) -> Self {
        Self::Schema {
            row,
            reason: reason.into(),
        }
    }
}
