//! # Tables
//!
//! The two layers built on [`DenseStore`](crate::DenseStore):
//!
//! - **Components**: one table per declared schema, rows of scalars
//! - **Entities**: rows of component ids, one per component field
//!
//! Schemas are declared at runtime with [`Schema::builder`] or at compile
//! time with [`component!`](crate::component).

mod component;
mod entity;
mod registry;
mod schema;
mod typed;

pub use component::{ComponentTable, Record, TableGuard};
pub use entity::{EntityRef, EntitySchema, EntitySchemaBuilder, EntityTable};
pub use registry::Registry;
pub use schema::{FieldDecl, Schema, SchemaBuilder};
pub use typed::{ComponentRow, Field, TypedGuard, TypedRecord, TypedTable};
