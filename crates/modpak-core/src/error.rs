use crate::io::codec::FormatError;
use crate::records::{PeriodError, SchemaError, StoreError};
use std::io;
use thiserror::Error;

/// Errors surfaced by package adapters during load and write.
///
/// Loads are all-or-nothing: any variant aborts the whole operation and no
/// partially populated adapter is returned. Write-side I/O errors propagate
/// unchanged; a partially written file is left as-is for the caller to
/// discard.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed record on line {line}: {source}")]
    Format {
        line: usize,
        #[source]
        source: FormatError,
    },

    #[error("Schema violation on line {line}: {source}")]
    Schema {
        line: usize,
        #[source]
        source: SchemaError,
    },

    #[error("Cannot parse control data on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unsupported construct on line {line}: {feature}")]
    Unsupported { line: usize, feature: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid package configuration: {0}")]
    Config(String),
}

impl From<PeriodError> for PackageError {
    fn from(err: PeriodError) -> Self {
        PackageError::Store(err.into())
    }
}

impl PackageError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        PackageError::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(line: usize, feature: impl Into<String>) -> Self {
        PackageError::Unsupported {
            line,
            feature: feature.into(),
        }
    }
}
