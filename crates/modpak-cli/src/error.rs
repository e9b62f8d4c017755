use modpak::error::PackageError;
use modpak::records::{PeriodError, StoreError};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Package(#[from] PackageError),

    #[error("Deck error: {0}")]
    Deck(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        CliError::Package(err.into())
    }
}

impl From<PeriodError> for CliError {
    fn from(err: PeriodError) -> Self {
        CliError::Package(err.into())
    }
}
