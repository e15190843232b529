//! # Component Tables
//!
//! One dense table per declared component schema.
//!
//! ## Locking
//!
//! Every table owns one reentrant lock. It is taken for the duration of
//! each individual call (so a single read, write, create or destroy is never
//! torn), but a *sequence* of point accesses is not synchronized. Callers
//! that need several accesses to be atomic with respect to creates and
//! destroys on other threads hold [`ComponentTable::lock`] around the whole
//! critical section:
//!
//! ```rust
//! use gamelib_core::{ComponentTable, Schema, ScalarType, Value};
//!
//! let table = ComponentTable::new(
//!     Schema::builder("Health").field("hp", ScalarType::I32).build()?,
//! )?;
//! table.create(&[Value::I32(10)])?;
//! table.create(&[Value::I32(25)])?;
//!
//! let guard = table.lock();
//! let total: i32 = guard.column::<i32>("hp")?.iter().sum();
//! assert_eq!(total, 35);
//! # Ok::<(), gamelib_core::StoreError>(())
//! ```
//!
//! The lock is reentrant: the thread holding the guard may keep calling
//! table methods. Column borrows handed out by the guard must be dropped
//! before that thread creates or destroys rows.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::error::{StoreError, StoreResult};
use crate::policy::CapacityPolicy;
use crate::storage::{DenseStore, RecordId, Scalar, Value};

use super::schema::Schema;

/// Dense storage for one component type.
///
/// Shared between threads and entity tables as `Arc<ComponentTable>`.
pub struct ComponentTable {
    /// Declared layout.
    schema: Schema,
    /// Backing store behind the table lock.
    store: ReentrantMutex<RefCell<DenseStore>>,
}

impl ComponentTable {
    /// Creates an empty table with the default capacity policy.
    ///
    /// # Errors
    ///
    /// Propagates schema validation errors.
    pub fn new(schema: Schema) -> StoreResult<Self> {
        Self::with_policy(schema, CapacityPolicy::default())
    }

    /// Creates an empty table with a custom capacity policy.
    ///
    /// # Errors
    ///
    /// `NoFieldsDeclared`, `DuplicateField` or `InvalidPolicy`.
    pub fn with_policy(schema: Schema, policy: CapacityPolicy) -> StoreResult<Self> {
        let store = DenseStore::new(schema.name(), schema.columns(), policy)?;
        Ok(Self {
            schema,
            store: ReentrantMutex::new(RefCell::new(store)),
        })
    }

    /// Component type name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Declared layout.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Acquires the table lock for a bulk critical section.
    ///
    /// The lock is released when the guard is dropped, on every exit path.
    pub fn lock(&self) -> TableGuard<'_> {
        TableGuard {
            table: self,
            guard: self.store.lock(),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&DenseStore) -> R) -> R {
        let guard = self.store.lock();
        let store = guard.borrow();
        f(&*store)
    }

    fn write<R>(&self, f: impl FnOnce(&mut DenseStore) -> R) -> R {
        let guard = self.store.lock();
        let mut store = guard.borrow_mut();
        f(&mut *store)
    }

    // =========================================================================
    // Rows
    // =========================================================================

    /// Creates a row from one value per field, in declared order.
    ///
    /// # Errors
    ///
    /// `ArityMismatch` or `TypeMismatch`; nothing is created on error.
    pub fn create(&self, values: &[Value]) -> StoreResult<Record<'_>> {
        let id = self.write(|store| store.new_entry(values))?;
        Ok(Record { table: self, id })
    }

    /// Creates a row from `(field, value)` pairs. Omitted fields are zero.
    ///
    /// # Errors
    ///
    /// `InvalidField`, `DuplicateField` or `TypeMismatch`.
    pub fn create_named(&self, values: &[(&str, Value)]) -> StoreResult<Record<'_>> {
        let id = self.write(|store| store.new_entry_named(values))?;
        Ok(Record { table: self, id })
    }

    /// Handle to a live row, `None` if the id has no row.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<Record<'_>> {
        self.contains(id).then_some(Record { table: self, id })
    }

    /// Destroys a row. Returns `false` if the id had no row.
    pub fn destroy(&self, id: RecordId) -> bool {
        self.write(|store| store.delete(id))
    }

    /// Whether the id has a live row.
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.read(|store| store.contains(id))
    }

    /// Number of live rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read(DenseStore::len)
    }

    /// Whether no rows are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocated rows per column.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.read(DenseStore::capacity)
    }

    /// Snapshot of the live ids, in dense order.
    #[must_use]
    pub fn ids(&self) -> Vec<RecordId> {
        self.read(|store| store.ids().to_vec())
    }

    /// Reads one field of a row. `Ok(None)` if the id has no row.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn value(&self, id: RecordId, field: &str) -> StoreResult<Option<Value>> {
        let field = self.schema.field_index(field)?;
        Ok(self.value_at(id, field))
    }

    /// Writes one field of a row. `Ok(false)` if the id has no row.
    ///
    /// # Errors
    ///
    /// `InvalidField` or `TypeMismatch`.
    pub fn set_value(&self, id: RecordId, field: &str, value: Value) -> StoreResult<bool> {
        let field = self.schema.field_index(field)?;
        self.set_value_at(id, field, value)
    }

    pub(crate) fn value_at(&self, id: RecordId, field: usize) -> Option<Value> {
        self.read(|store| store.value_at(id, field))
    }

    pub(crate) fn set_value_at(&self, id: RecordId, field: usize, value: Value) -> StoreResult<bool> {
        self.write(|store| store.set_value_at(id, field, value))
    }

    /// All values of a row, in declared order.
    #[must_use]
    pub fn row(&self, id: RecordId) -> Option<Vec<Value>> {
        self.read(|store| store.row(id))
    }

    /// Overwrites every field of a row at once. `Ok(false)` if the id has no row.
    ///
    /// # Errors
    ///
    /// `ArityMismatch` or `TypeMismatch`; the row is untouched on error.
    pub fn write_row(&self, id: RecordId, values: &[Value]) -> StoreResult<bool> {
        if values.len() != self.schema.len() {
            return Err(StoreError::ArityMismatch {
                table: self.name().to_owned(),
                expected: self.schema.len(),
                found: values.len(),
            });
        }
        for (decl, value) in self.schema.fields().iter().zip(values) {
            if decl.ty != value.scalar_type() {
                return Err(StoreError::scalar_mismatch(
                    self.name(),
                    &decl.name,
                    decl.ty,
                    value.scalar_type(),
                ));
            }
        }
        self.write(|store| {
            if !store.contains(id) {
                return Ok(false);
            }
            for (field, value) in values.iter().enumerate() {
                store.set_value_at(id, field, *value)?;
            }
            Ok(true)
        })
    }

    // =========================================================================
    // Capacity
    // =========================================================================

    /// Reallocates the columns to `capacity` rows.
    ///
    /// # Errors
    ///
    /// Returns `CapacityCorruption` if `capacity` is below the live length.
    pub fn reallocate(&self, capacity: usize) -> StoreResult<()> {
        self.write(|store| store.reallocate(capacity))
    }

    /// Rebuilds the table from its schema: no rows, initial capacity, ids from zero.
    pub fn reset(&self) {
        tracing::debug!(table = %self.name(), "resetting component table");
        self.write(DenseStore::clear);
    }

    /// Same as [`ComponentTable::reset`].
    pub fn clear(&self) {
        self.reset();
    }

    /// Bytes per row.
    #[must_use]
    pub fn row_size(&self) -> usize {
        self.schema.row_size()
    }

    /// Verifies the storage invariants.
    ///
    /// # Errors
    ///
    /// Describes the first broken invariant.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.read(DenseStore::check_invariants)
    }

    /// Field position, checked against the requested scalar type.
    fn typed_field<T: Scalar>(&self, field: &str) -> StoreResult<usize> {
        let index = self.schema.field_index(field)?;
        let declared = self.schema.fields()[index].ty;
        if declared == T::TYPE {
            Ok(index)
        } else {
            Err(StoreError::scalar_mismatch(self.name(), field, declared, T::TYPE))
        }
    }
}

impl fmt::Debug for ComponentTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTable")
            .field("name", &self.name())
            .field("len", &self.len())
            .finish()
    }
}

// ============================================================================
// SCOPED LOCK
// ============================================================================

/// RAII guard for bulk access to one table.
///
/// While it is alive no other thread can create, destroy, read or write rows
/// in the table. Dropping it releases the lock.
///
/// # Panics
///
/// The column borrows are checked at runtime: creating or destroying rows on
/// the locking thread while a column borrow from this guard is still alive
/// panics. That includes the cascade of [`EntityTable::destroy`] and
/// [`EntityTable::clear`] for entities referencing this table.
///
/// [`EntityTable::destroy`]: crate::EntityTable::destroy
/// [`EntityTable::clear`]: crate::EntityTable::clear
pub struct TableGuard<'t> {
    table: &'t ComponentTable,
    guard: ReentrantMutexGuard<'t, RefCell<DenseStore>>,
}

impl<'t> TableGuard<'t> {
    /// The locked table.
    #[must_use]
    pub fn table(&self) -> &'t ComponentTable {
        self.table
    }

    /// Number of live rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guard.borrow().len()
    }

    /// Whether no rows are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live ids in dense order.
    #[must_use]
    pub fn ids(&self) -> Ref<'_, [RecordId]> {
        Ref::map(self.guard.borrow(), DenseStore::ids)
    }

    /// Dense indices for many ids. Valid until the guard is dropped.
    #[must_use]
    pub fn indices_of(&self, ids: &[RecordId]) -> Vec<Option<usize>> {
        self.guard.borrow().indices_of(ids)
    }

    /// Live prefix of a column, in the same order as [`TableGuard::ids`].
    ///
    /// # Errors
    ///
    /// `InvalidField` or `TypeMismatch`.
    pub fn column<T: Scalar>(&self, field: &str) -> StoreResult<Ref<'_, [T]>> {
        let index = self.table.typed_field::<T>(field)?;
        Ok(self.column_at(index))
    }

    /// Mutable live prefix of a column.
    ///
    /// # Errors
    ///
    /// `InvalidField` or `TypeMismatch`.
    pub fn column_mut<T: Scalar>(&self, field: &str) -> StoreResult<RefMut<'_, [T]>> {
        let index = self.table.typed_field::<T>(field)?;
        Ok(self.column_at_mut(index))
    }

    /// Raw bytes of a column's live prefix, for upload to external buffers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn column_bytes(&self, field: &str) -> StoreResult<Ref<'_, [u8]>> {
        let index = self.table.schema.field_index(field)?;
        Ok(Ref::map(self.guard.borrow(), |store| {
            store.column_ref(index).as_bytes()
        }))
    }

    /// Live values of a column, in dense order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn values(&self, field: &str) -> StoreResult<Vec<Value>> {
        let index = self.table.schema.field_index(field)?;
        Ok(self.guard.borrow().column_ref(index).iter().collect())
    }

    /// Runs `f` against the locked store.
    pub fn with_store<R>(&self, f: impl FnOnce(&DenseStore) -> R) -> R {
        f(&*self.guard.borrow())
    }

    // The type was checked against the schema by the caller.
    pub(crate) fn column_at<T: Scalar>(&self, index: usize) -> Ref<'_, [T]> {
        Ref::map(self.guard.borrow(), |store| {
            store.column_at::<T>(index).unwrap_or(&[])
        })
    }

    pub(crate) fn column_at_mut<T: Scalar>(&self, index: usize) -> RefMut<'_, [T]> {
        RefMut::map(self.guard.borrow_mut(), |store| {
            store.column_at_mut::<T>(index).unwrap_or(&mut [])
        })
    }
}

// ============================================================================
// ROW HANDLE
// ============================================================================

/// Lightweight handle to one row: a table reference plus an id.
///
/// Owns nothing. Every access resolves the id through the sparse lookup, so
/// the handle stays correct across growth, shrinking and swap-deletes of
/// other rows. Once its own row is destroyed, reads return `None` and writes
/// return `false`.
#[derive(Clone, Copy)]
pub struct Record<'t> {
    table: &'t ComponentTable,
    id: RecordId,
}

impl<'t> Record<'t> {
    /// Stable id of the row.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    /// The owning table.
    #[must_use]
    pub const fn table(&self) -> &'t ComponentTable {
        self.table
    }

    /// Whether the row still exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.table.contains(self.id)
    }

    /// Reads a field. `Ok(None)` once the row is destroyed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn get(&self, field: &str) -> StoreResult<Option<Value>> {
        self.table.value(self.id, field)
    }

    /// Reads a field as a concrete scalar type.
    ///
    /// # Errors
    ///
    /// `InvalidField` or `TypeMismatch`.
    pub fn get_as<T: Scalar>(&self, field: &str) -> StoreResult<Option<T>> {
        let index = self.table.typed_field::<T>(field)?;
        Ok(self.table.value_at(self.id, index).and_then(T::from_value))
    }

    /// Writes a field. `Ok(false)` once the row is destroyed.
    ///
    /// # Errors
    ///
    /// `InvalidField` or `TypeMismatch`.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> StoreResult<bool> {
        self.table.set_value(self.id, field, value.into())
    }

    /// All field values in declared order.
    #[must_use]
    pub fn values(&self) -> Option<Vec<Value>> {
        self.table.row(self.id)
    }

    /// Destroys the row.
    pub fn destroy(self) -> bool {
        self.table.destroy(self.id)
    }
}

/// Structural equality: same table, both rows live, all values equal in
/// declared order.
impl PartialEq for Record<'_> {
    fn eq(&self, other: &Self) -> bool {
        if !std::ptr::eq(self.table, other.table) {
            return false;
        }
        match (self.values(), other.values()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.table.name())
            .field("id", &self.id)
            .finish()
    }
}

/// Formats as `Name(field=value, ...)`.
impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(values) = self.values() else {
            return write!(f, "{}(<destroyed #{}>)", self.table.name(), self.id);
        };
        write!(f, "{}(", self.table.name())?;
        for (i, (decl, value)) in self.table.schema.fields().iter().zip(values).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={value}", decl.name)?;
        }
        f.write_str(")")
    }
}
