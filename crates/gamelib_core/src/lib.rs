//! # Gamelib Core
//!
//! Dense structure-of-arrays storage for game records:
//! - Stable integer ids, recycled first-in first-out
//! - One contiguous array per field, live rows always packed at the front
//! - Amortized O(1) create, lookup and delete
//!
//! ## Layers
//!
//! 1. **[`DenseStore`]** - the untyped SoA primitive (sparse id lookup, swap-delete, grow/shrink)
//! 2. **[`ComponentTable`]** - one locked store per declared component [`Schema`]
//! 3. **[`EntityTable`]** - rows of component ids spanning several component tables
//!
//! ## Example
//!
//! ```rust
//! use gamelib_core::{component, EntitySchema, EntityTable, TypedTable};
//!
//! component! {
//!     /// Position and heading.
//!     pub struct Transform { x: f32, y: f32, theta: f32 }
//! }
//!
//! let transforms = TypedTable::<Transform>::new()?;
//! let players = EntityTable::new(
//!     EntitySchema::builder("Player")
//!         .component("transform", transforms.table())
//!         .build()?,
//! )?;
//!
//! let t = transforms.create(Transform { x: 1.0, y: 2.0, theta: 0.0 })?;
//! let player = players.create(&[t.id()])?;
//! assert_eq!(players.project::<f32>("transform", "y")?, vec![Some(2.0)]);
//!
//! player.destroy();
//! assert!(transforms.is_empty());
//! # Ok::<(), gamelib_core::StoreError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod error;
pub mod policy;
pub mod storage;

pub use ecs::{
    ComponentRow, ComponentTable, EntityRef, EntitySchema, EntitySchemaBuilder, EntityTable,
    Field, FieldDecl, Record, Registry, Schema, SchemaBuilder, TableGuard, TypedGuard,
    TypedRecord, TypedTable,
};
pub use error::{StoreError, StoreResult};
pub use policy::CapacityPolicy;
pub use storage::{Column, ColumnRef, DenseStore, RecordId, Scalar, ScalarType, Value};
