//! Typed record schemas and the stress-period record store.
//!
//! Boundary-condition data varies by simulation stress period and can be
//! sparse: a period may supply a new record set, explicitly clear all
//! records, or reuse the most recent prior state. This module reifies that
//! three-way convention as a tagged state instead of relying on map-key
//! absence, and keeps every record set conforming to one fixed schema.

mod record;
mod schema;
mod transient;

pub use record::{Record, RecordSet, Value};
pub use schema::{FieldSpec, FieldType, RecordSchema};
pub use transient::{Effective, IndexError, PeriodEntry, PeriodError, Transient, TransientList};

use thiserror::Error;

/// Violations of a store's fixed record schema.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("record has {found} fields but the schema declares {expected}")]
    Arity { expected: usize, found: usize },

    #[error("field '{field}' expects {expected:?} but received an incompatible value")]
    Type { field: String, expected: FieldType },

    #[error("header declares {declared} auxiliary columns but the data line supplies {found}")]
    AuxColumns { declared: usize, found: usize },

    #[error("record set schema does not match the store schema")]
    SchemaMismatch,
}

/// Errors from stress-period store mutation.
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Period(#[from] PeriodError),

    #[error(transparent)]
    Index(#[from] IndexError),
}
