//! # Storage
//!
//! The untyped building blocks: scalar columns and the dense
//! structure-of-arrays store that every table is built on.

mod column;
mod dense;

pub use column::{Column, ColumnRef, Scalar, ScalarType, Value};
pub use dense::{DenseStore, RecordId};
