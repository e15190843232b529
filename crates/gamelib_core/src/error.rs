//! # Storage Error Types
//!
//! All errors that can occur while declaring or mutating tables.
//!
//! Schema and declaration errors are fatal for the caller: they describe a
//! programming mistake and are returned immediately. A missing id is NOT an
//! error on the lookup path (lookups return `Option`); `UnknownId` only shows
//! up where a higher layer requires the id to exist.

use thiserror::Error;

use crate::storage::{RecordId, ScalarType};

/// Errors that can occur in the storage layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An id with no live row was used where a live row is required.
    #[error("unknown id {id} in table `{table}`")]
    UnknownId {
        /// Table the id was looked up in.
        table: String,
        /// The missing id.
        id: RecordId,
    },

    /// A schema was declared without any fields.
    #[error("table `{table}` declares no fields")]
    NoFieldsDeclared {
        /// Table being declared.
        table: String,
    },

    /// A field name that is not part of the declared schema.
    #[error("table `{table}` has no field `{field}`")]
    InvalidField {
        /// Table that was accessed.
        table: String,
        /// The unknown field name.
        field: String,
    },

    /// A field name was declared (or supplied) more than once.
    #[error("field `{field}` is declared more than once in table `{table}`")]
    DuplicateField {
        /// Table being declared.
        table: String,
        /// The repeated field name.
        field: String,
    },

    /// Manual reallocation below the live length.
    #[error("cannot reallocate table `{table}` to {requested} rows while {length} rows are live")]
    CapacityCorruption {
        /// Table being reallocated.
        table: String,
        /// Requested capacity.
        requested: usize,
        /// Current live length.
        length: usize,
    },

    /// A value or table does not match the declared type of a field.
    #[error("field `{field}` of table `{table}` expects {expected}, got {found}")]
    TypeMismatch {
        /// Table that was accessed.
        table: String,
        /// Field that was accessed.
        field: String,
        /// Declared type.
        expected: String,
        /// Supplied type.
        found: String,
    },

    /// Wrong number of positional values for a row.
    #[error("table `{table}` expects {expected} values per row, got {found}")]
    ArityMismatch {
        /// Table that was written.
        table: String,
        /// Declared field count.
        expected: usize,
        /// Supplied value count.
        found: usize,
    },

    /// A required field was not supplied.
    #[error("field `{field}` of table `{table}` was not supplied")]
    MissingField {
        /// Table that was written.
        table: String,
        /// The omitted field.
        field: String,
    },

    /// A table with this name is already registered.
    #[error("table `{0}` is already registered")]
    DuplicateTable(String),

    /// Capacity policy failed validation.
    #[error("invalid capacity policy: {0}")]
    InvalidPolicy(String),
}

impl StoreError {
    /// Builds a `TypeMismatch` for a scalar field.
    pub(crate) fn scalar_mismatch(
        table: &str,
        field: &str,
        expected: ScalarType,
        found: ScalarType,
    ) -> Self {
        Self::TypeMismatch {
            table: table.to_owned(),
            field: field.to_owned(),
            expected: expected.name().to_owned(),
            found: found.name().to_owned(),
        }
    }

    /// Builds an `InvalidField`.
    pub(crate) fn invalid_field(table: &str, field: &str) -> Self {
        Self::InvalidField {
            table: table.to_owned(),
            field: field.to_owned(),
        }
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
