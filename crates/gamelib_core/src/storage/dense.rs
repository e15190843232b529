//! # Dense Array Store
//!
//! Structure-of-arrays storage keyed by a stable integer id.
//!
//! ```text
//! index_of: [0, ABSENT, 2, 1, ABSENT]   <- sparse, indexed by id
//! ids:      [0, 3, 2 | stale...]        <- dense, indexed by row
//! x:        [x0, x3, x2 | stale...]
//! y:        [y0, y3, y2 | stale...]
//!            `-- len --'
//! ```
//!
//! Live rows always occupy the dense prefix `[0, len)`. Deleting a row moves
//! the last live row into the hole (swap-to-end) so the prefix stays packed.
//! The dense order of the remaining rows is therefore NOT stable across
//! deletes; only ids are.
//!
//! ## Guarantees
//!
//! After every public call:
//! 1. `len` equals the number of ids whose `index_of` entry is not `ABSENT`
//! 2. `ids[index_of[id]] == id` for every live id
//! 3. Every column and `ids` share the same allocated capacity
//! 4. Freed ids are reissued first-freed-first-reused before the counter moves

use std::collections::VecDeque;

use crate::error::{StoreError, StoreResult};
use crate::policy::CapacityPolicy;

use super::column::{Column, ColumnRef, Scalar, ScalarType, Value};

/// Stable identity of a row within one table.
pub type RecordId = u32;

/// Sparse lookup sentinel for ids with no live row.
const ABSENT: u32 = u32::MAX;

/// Filler for stale slots of the dense `ids` array.
const STALE_ID: RecordId = RecordId::MAX;

/// Generic structure-of-arrays table.
///
/// # Example
///
/// ```rust
/// use gamelib_core::{CapacityPolicy, DenseStore, ScalarType, Value};
///
/// let mut store = DenseStore::new(
///     "Mass",
///     vec![("kg".to_owned(), ScalarType::F32)],
///     CapacityPolicy::default(),
/// )?;
/// let id = store.new_entry(&[Value::F32(2.5)])?;
/// assert_eq!(store.value(id, "kg")?, Some(Value::F32(2.5)));
/// assert!(store.delete(id));
/// assert_eq!(store.value(id, "kg")?, None);
/// # Ok::<(), gamelib_core::StoreError>(())
/// ```
#[derive(Clone, Debug)]
pub struct DenseStore {
    /// Table name, used in errors and logs.
    name: String,
    /// Declared field names, in column order.
    field_names: Vec<String>,
    /// One column per field, each allocated to `capacity`.
    columns: Vec<Column>,
    /// Dense id of each row, allocated to `capacity`.
    ids: Vec<RecordId>,
    /// Sparse id -> dense index, `ABSENT` for dead ids.
    index_of: Vec<u32>,
    /// Live row count.
    len: usize,
    /// Allocated rows per column.
    capacity: usize,
    /// Next never-issued id.
    next_id: RecordId,
    /// Freed ids, reissued front first.
    recycled: VecDeque<RecordId>,
    /// Growth and shrink thresholds.
    policy: CapacityPolicy,
}

impl DenseStore {
    /// Creates an empty store with the given fields.
    ///
    /// # Errors
    ///
    /// - `NoFieldsDeclared` if `fields` is empty
    /// - `DuplicateField` if a name appears twice
    /// - `InvalidPolicy` if `policy` fails validation
    pub fn new(
        name: impl Into<String>,
        fields: Vec<(String, ScalarType)>,
        policy: CapacityPolicy,
    ) -> StoreResult<Self> {
        let name = name.into();
        if fields.is_empty() {
            return Err(StoreError::NoFieldsDeclared { table: name });
        }
        for (i, (field, _)) in fields.iter().enumerate() {
            if fields[..i].iter().any(|(other, _)| other == field) {
                return Err(StoreError::DuplicateField {
                    table: name,
                    field: field.clone(),
                });
            }
        }
        policy.validate()?;

        let capacity = policy.min_capacity;
        let (field_names, columns) = fields
            .into_iter()
            .map(|(field, ty)| (field, Column::with_len(ty, capacity)))
            .unzip();

        Ok(Self {
            name,
            field_names,
            columns,
            ids: vec![STALE_ID; capacity],
            index_of: vec![ABSENT; capacity],
            len: 0,
            capacity,
            next_id: 0,
            recycled: VecDeque::new(),
            policy,
        })
    }

    /// Table name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared field names, in column order.
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Position of a field in column order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn field_index(&self, field: &str) -> StoreResult<usize> {
        self.field_names
            .iter()
            .position(|name| name == field)
            .ok_or_else(|| StoreError::invalid_field(&self.name, field))
    }

    /// Element type of the field at `index`.
    #[must_use]
    pub fn field_type(&self, index: usize) -> ScalarType {
        self.columns[index].scalar_type()
    }

    /// Number of live rows.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no rows are live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated rows per column.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size of the sparse id lookup.
    #[inline]
    #[must_use]
    pub fn lookup_len(&self) -> usize {
        self.index_of.len()
    }

    /// The id the counter will issue once the recycle pool is empty.
    #[inline]
    #[must_use]
    pub const fn next_id(&self) -> RecordId {
        self.next_id
    }

    /// Freed ids waiting for reuse, in reuse order.
    pub fn recycled(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.recycled.iter().copied()
    }

    /// Active capacity policy.
    #[must_use]
    pub const fn policy(&self) -> &CapacityPolicy {
        &self.policy
    }

    /// Bytes per row across all columns.
    #[must_use]
    pub fn row_size(&self) -> usize {
        self.columns.iter().map(|c| c.scalar_type().size_of()).sum()
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Appends a row with one value per field, in declared order.
    ///
    /// The values are checked before an id is allocated, so a rejected call
    /// leaves the store untouched.
    ///
    /// # Errors
    ///
    /// - `ArityMismatch` if the value count differs from the field count
    /// - `TypeMismatch` if a value does not match its column
    pub fn new_entry(&mut self, values: &[Value]) -> StoreResult<RecordId> {
        if values.len() != self.columns.len() {
            return Err(StoreError::ArityMismatch {
                table: self.name.clone(),
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        for (i, value) in values.iter().enumerate() {
            self.check_type(i, *value)?;
        }

        let (id, index) = self.allocate_row();
        for (column, value) in self.columns.iter_mut().zip(values) {
            let written = column.write(index, *value);
            debug_assert!(written.is_ok(), "type checked before allocation");
        }
        tracing::trace!(table = %self.name, id, index, "created row");
        Ok(id)
    }

    /// Appends a row from `(field, value)` pairs. Omitted fields are zero.
    ///
    /// # Errors
    ///
    /// - `InvalidField` for an undeclared name
    /// - `DuplicateField` if a name is given twice
    /// - `TypeMismatch` if a value does not match its column
    pub fn new_entry_named(&mut self, values: &[(&str, Value)]) -> StoreResult<RecordId> {
        let mut row: Vec<Value> = self
            .columns
            .iter()
            .map(|c| Value::zero(c.scalar_type()))
            .collect();
        let mut seen = vec![false; row.len()];
        for (field, value) in values {
            let index = self.field_index(field)?;
            if std::mem::replace(&mut seen[index], true) {
                return Err(StoreError::DuplicateField {
                    table: self.name.clone(),
                    field: (*field).to_owned(),
                });
            }
            row[index] = *value;
        }
        self.new_entry(&row)
    }

    /// Issues an id and reserves the next dense slot for it.
    fn allocate_row(&mut self) -> (RecordId, usize) {
        let id = match self.recycled.pop_front() {
            Some(id) => id,
            None => {
                let id = self.next_id;
                debug_assert!(id != STALE_ID, "id space exhausted");
                self.next_id += 1;
                id
            }
        };

        if self.len >= self.capacity {
            let grown = self.policy.grown_capacity(self.len);
            tracing::debug!(table = %self.name, from = self.capacity, to = grown, "growing columns");
            self.resize_columns(grown);
        }

        let slot = id as usize;
        if slot >= self.index_of.len() {
            let grown = self.policy.grown_capacity(self.index_of.len()).max(slot + 1);
            tracing::debug!(table = %self.name, from = self.index_of.len(), to = grown, "growing id lookup");
            self.index_of.resize(grown, ABSENT);
        }

        let index = self.len;
        self.ids[index] = id;
        self.index_of[slot] = index as u32;
        self.len += 1;
        (id, index)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Dense index of a live id.
    #[inline]
    #[must_use]
    pub fn index_of(&self, id: RecordId) -> Option<usize> {
        match self.index_of.get(id as usize) {
            Some(&index) if index != ABSENT => Some(index as usize),
            _ => None,
        }
    }

    /// Dense indices for many ids at once. Only valid until the next mutation.
    #[must_use]
    pub fn indices_of(&self, ids: &[RecordId]) -> Vec<Option<usize>> {
        ids.iter().map(|&id| self.index_of(id)).collect()
    }

    /// Whether `id` has a live row.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.index_of(id).is_some()
    }

    /// Reads one field of a row by field position.
    #[must_use]
    pub fn value_at(&self, id: RecordId, field: usize) -> Option<Value> {
        let index = self.index_of(id)?;
        Some(self.columns[field].read(index))
    }

    /// Reads one field of a row. `Ok(None)` if the id is not live.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn value(&self, id: RecordId, field: &str) -> StoreResult<Option<Value>> {
        let field = self.field_index(field)?;
        Ok(self.value_at(id, field))
    }

    /// Writes one field of a row by field position. `Ok(false)` if the id is not live.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the value does not match the column.
    pub fn set_value_at(&mut self, id: RecordId, field: usize, value: Value) -> StoreResult<bool> {
        self.check_type(field, value)?;
        let Some(index) = self.index_of(id) else {
            return Ok(false);
        };
        let written = self.columns[field].write(index, value);
        debug_assert!(written.is_ok(), "type checked on entry");
        Ok(true)
    }

    /// Writes one field of a row. `Ok(false)` if the id is not live.
    ///
    /// # Errors
    ///
    /// `InvalidField` or `TypeMismatch`.
    pub fn set_value(&mut self, id: RecordId, field: &str, value: Value) -> StoreResult<bool> {
        let field = self.field_index(field)?;
        self.set_value_at(id, field, value)
    }

    /// All values of a row, in declared order.
    #[must_use]
    pub fn row(&self, id: RecordId) -> Option<Vec<Value>> {
        let index = self.index_of(id)?;
        Some(self.columns.iter().map(|c| c.read(index)).collect())
    }

    // =========================================================================
    // Columnar access
    // =========================================================================

    /// Live ids in dense order.
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &[RecordId] {
        &self.ids[..self.len]
    }

    /// Live prefix of a column by field position.
    #[must_use]
    pub fn column_ref(&self, field: usize) -> ColumnRef<'_> {
        ColumnRef::new(&self.columns[field], self.len)
    }

    /// Live prefix of every column, in declared order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnRef<'_>)> {
        self.field_names
            .iter()
            .zip(&self.columns)
            .map(|(name, column)| (name.as_str(), ColumnRef::new(column, self.len)))
    }

    /// Typed live prefix of a column by field position.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if `T` is not the column's type.
    pub fn column_at<T: Scalar>(&self, field: usize) -> StoreResult<&[T]> {
        let column = &self.columns[field];
        T::slice(column)
            .map(|s| &s[..self.len])
            .ok_or_else(|| self.mismatch(field, T::TYPE))
    }

    /// Typed mutable live prefix of a column by field position.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if `T` is not the column's type.
    pub fn column_at_mut<T: Scalar>(&mut self, field: usize) -> StoreResult<&mut [T]> {
        let Self {
            name,
            field_names,
            columns,
            len,
            ..
        } = self;
        let expected = columns[field].scalar_type();
        T::slice_mut(&mut columns[field])
            .map(|s| &mut s[..*len])
            .ok_or_else(|| StoreError::scalar_mismatch(name, &field_names[field], expected, T::TYPE))
    }

    /// Typed live prefix of a column.
    ///
    /// # Errors
    ///
    /// `InvalidField` or `TypeMismatch`.
    pub fn column<T: Scalar>(&self, field: &str) -> StoreResult<&[T]> {
        let field = self.field_index(field)?;
        self.column_at(field)
    }

    /// Typed mutable live prefix of a column.
    ///
    /// # Errors
    ///
    /// `InvalidField` or `TypeMismatch`.
    pub fn column_mut<T: Scalar>(&mut self, field: &str) -> StoreResult<&mut [T]> {
        let field = self.field_index(field)?;
        self.column_at_mut(field)
    }

    /// Raw bytes of a column's live prefix.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn column_bytes(&self, field: &str) -> StoreResult<&[u8]> {
        let field = self.field_index(field)?;
        Ok(self.columns[field].as_bytes(self.len))
    }

    // =========================================================================
    // Deletion and capacity
    // =========================================================================

    /// Deletes a row. Returns `false` (and changes nothing) if the id is not live.
    pub fn delete(&mut self, id: RecordId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };

        let last = self.len - 1;
        if index != last {
            // Move the last live row into the hole.
            let moved = self.ids[last];
            for column in &mut self.columns {
                column.copy_within(last, index);
            }
            self.ids[index] = moved;
            self.index_of[moved as usize] = index as u32;
        }

        self.len = last;
        self.recycled.push_back(id);
        self.index_of[id as usize] = ABSENT;
        tracing::trace!(table = %self.name, id, index, "deleted row");

        self.consider_shrinking();
        true
    }

    /// Reallocates every column to `capacity` rows (floored at `min_capacity`).
    ///
    /// # Errors
    ///
    /// Returns `CapacityCorruption` if `capacity` is below the live length;
    /// live rows are never truncated.
    pub fn reallocate(&mut self, capacity: usize) -> StoreResult<()> {
        if capacity < self.len {
            return Err(StoreError::CapacityCorruption {
                table: self.name.clone(),
                requested: capacity,
                length: self.len,
            });
        }
        let target = self.policy.floor(capacity);
        tracing::debug!(table = %self.name, from = self.capacity, to = target, "reallocating columns");
        self.resize_columns(target);
        Ok(())
    }

    /// Drops every row and returns to the initial allocation.
    ///
    /// The id counter restarts at zero and the recycle pool is emptied.
    pub fn clear(&mut self) {
        let capacity = self.policy.min_capacity;
        for column in &mut self.columns {
            *column = Column::with_len(column.scalar_type(), capacity);
        }
        self.ids = vec![STALE_ID; capacity];
        self.index_of = vec![ABSENT; capacity];
        self.len = 0;
        self.capacity = capacity;
        self.next_id = 0;
        self.recycled.clear();
        tracing::debug!(table = %self.name, "cleared");
    }

    fn resize_columns(&mut self, capacity: usize) {
        for column in &mut self.columns {
            column.resize(capacity);
        }
        self.ids.resize(capacity, STALE_ID);
        self.ids.shrink_to_fit();
        self.capacity = capacity;
    }

    /// Shrinks the id lookup and the columns when they are mostly empty.
    fn consider_shrinking(&mut self) {
        let len = self.len as f64;
        if self.len > 0 && self.index_of.len() as f64 >= len * self.policy.lookup_shrink_ratio {
            let greatest = self.ids().iter().copied().max().unwrap_or(0);
            let bound = greatest as usize + 1;
            if greatest as f64 <= len * self.policy.lookup_max_id_ratio && bound < self.index_of.len() {
                tracing::debug!(table = %self.name, from = self.index_of.len(), to = bound, "shrinking id lookup");
                self.index_of.truncate(bound);
                self.index_of.shrink_to_fit();
                // Ids past the new bound are unreachable; the counter reissues them.
                self.next_id = greatest + 1;
                self.recycled.retain(|&id| id <= greatest);
            }
        }

        if self.policy.should_shrink(self.len, self.capacity) {
            let target = self.policy.floor(self.len);
            if target < self.capacity {
                tracing::debug!(table = %self.name, from = self.capacity, to = target, "shrinking columns");
                self.resize_columns(target);
            }
        }
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Verifies every storage invariant, describing the first violation.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the broken invariant.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.len > self.capacity {
            return Err(format!("len {} exceeds capacity {}", self.len, self.capacity));
        }
        if self.ids.len() != self.capacity {
            return Err(format!("ids allocated {} != capacity {}", self.ids.len(), self.capacity));
        }
        for (name, column) in self.field_names.iter().zip(&self.columns) {
            if column.allocated() != self.capacity {
                return Err(format!(
                    "column `{name}` allocated {} != capacity {}",
                    column.allocated(),
                    self.capacity
                ));
            }
        }
        let live = self.index_of.iter().filter(|&&i| i != ABSENT).count();
        if live != self.len {
            return Err(format!("{live} ids live in lookup but len is {}", self.len));
        }
        for (index, &id) in self.ids().iter().enumerate() {
            if self.index_of(id) != Some(index) {
                return Err(format!("id {id} at dense index {index} is not mapped back"));
            }
        }
        for &id in &self.recycled {
            if self.contains(id) {
                return Err(format!("recycled id {id} is live"));
            }
            if id >= self.next_id {
                return Err(format!("recycled id {id} is not below the counter {}", self.next_id));
            }
        }
        Ok(())
    }

    fn check_type(&self, field: usize, value: Value) -> StoreResult<()> {
        let expected = self.columns[field].scalar_type();
        if expected == value.scalar_type() {
            Ok(())
        } else {
            Err(self.mismatch(field, value.scalar_type()))
        }
    }

    fn mismatch(&self, field: usize, found: ScalarType) -> StoreError {
        StoreError::scalar_mismatch(
            &self.name,
            &self.field_names[field],
            self.columns[field].scalar_type(),
            found,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_store() -> DenseStore {
        DenseStore::new(
            "Point",
            vec![("x".into(), ScalarType::F32), ("y".into(), ScalarType::I32)],
            CapacityPolicy::default(),
        )
        .unwrap()
    }

    fn add(store: &mut DenseStore, x: f32, y: i32) -> RecordId {
        store.new_entry(&[Value::F32(x), Value::I32(y)]).unwrap()
    }

    #[test]
    fn test_new_requires_fields() {
        let err = DenseStore::new("Empty", Vec::new(), CapacityPolicy::default()).unwrap_err();
        assert_eq!(err, StoreError::NoFieldsDeclared { table: "Empty".into() });
    }

    #[test]
    fn test_new_rejects_duplicate_fields() {
        let err = DenseStore::new(
            "Dup",
            vec![("a".into(), ScalarType::U8), ("a".into(), ScalarType::U8)],
            CapacityPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateField { .. }));
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut store = xy_store();
        assert_eq!(add(&mut store, 0.0, 0), 0);
        assert_eq!(add(&mut store, 1.0, 1), 1);
        assert_eq!(add(&mut store, 2.0, 2), 2);
        assert_eq!(store.len(), 3);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_swap_delete_keeps_other_rows() {
        let mut store = xy_store();
        let a = add(&mut store, 0.5, 10);
        let b = add(&mut store, 1.5, 11);
        let c = add(&mut store, 2.5, 12);

        assert!(store.delete(b));
        assert_eq!(store.len(), 2);
        assert_eq!(store.row(b), None);
        assert_eq!(store.row(a), Some(vec![Value::F32(0.5), Value::I32(10)]));
        assert_eq!(store.row(c), Some(vec![Value::F32(2.5), Value::I32(12)]));
        // c moved into b's old slot
        assert_eq!(store.index_of(c), Some(1));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_delete_last_row() {
        let mut store = xy_store();
        let a = add(&mut store, 1.0, 1);
        let b = add(&mut store, 2.0, 2);
        assert!(store.delete(b));
        assert_eq!(store.ids(), &[a]);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut store = xy_store();
        let a = add(&mut store, 1.0, 1);
        assert!(store.delete(a));
        assert!(!store.delete(a));
        assert!(!store.delete(9_999));
        assert_eq!(store.len(), 0);
        assert_eq!(store.recycled().collect::<Vec<_>>(), vec![a]);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_recycling_is_fifo() {
        let mut store = xy_store();
        for i in 0..5 {
            add(&mut store, i as f32, i);
        }
        store.delete(3);
        store.delete(1);
        assert_eq!(add(&mut store, 0.0, 0), 3);
        assert_eq!(add(&mut store, 0.0, 0), 1);
        assert_eq!(add(&mut store, 0.0, 0), 5);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_growth_preserves_rows() {
        let mut store = xy_store();
        for i in 0..11 {
            add(&mut store, i as f32, i);
        }
        assert!(store.capacity() >= 11);
        assert_eq!(store.capacity(), 15);
        for i in 0..11u32 {
            assert_eq!(store.value(i, "y").unwrap(), Some(Value::I32(i as i32)));
        }
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_shrink_after_mass_delete() {
        let mut store = xy_store();
        for i in 0..100 {
            add(&mut store, i as f32, i);
        }
        assert!(store.capacity() >= 100);
        for id in 10..100 {
            assert!(store.delete(id));
            store.check_invariants().unwrap();
        }
        assert_eq!(store.len(), 10);
        assert!(store.capacity() >= store.len());
        assert!(store.capacity() <= 20);
        // ids 0..10 are live, so the lookup shrinks to exactly 10 slots
        assert_eq!(store.lookup_len(), 10);
        assert_eq!(store.next_id(), 10);
        assert_eq!(store.recycled().count(), 0);
        for i in 0..10u32 {
            assert_eq!(store.value(i, "x").unwrap(), Some(Value::F32(i as f32)));
        }
    }

    #[test]
    fn test_lookup_shrink_discards_unreachable_recycled_ids() {
        let mut store = xy_store();
        for i in 0..30 {
            add(&mut store, i as f32, i);
        }
        // Free low ids first so they stay below the new bound.
        store.delete(2);
        for id in 12..30 {
            store.delete(id);
        }
        store.check_invariants().unwrap();
        assert!(store.recycled().all(|id| id < store.next_id()));
        let fresh = add(&mut store, 0.0, 0);
        assert_eq!(fresh, 2);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_new_entry_checks_before_allocating() {
        let mut store = xy_store();
        let err = store.new_entry(&[Value::F32(1.0)]).unwrap_err();
        assert!(matches!(err, StoreError::ArityMismatch { expected: 2, found: 1, .. }));
        let err = store.new_entry(&[Value::F32(1.0), Value::F32(2.0)]).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { .. }));
        assert_eq!(store.len(), 0);
        assert_eq!(store.next_id(), 0);
    }

    #[test]
    fn test_new_entry_named_defaults_to_zero() {
        let mut store = xy_store();
        let id = store.new_entry_named(&[("y", Value::I32(4))]).unwrap();
        assert_eq!(store.row(id), Some(vec![Value::F32(0.0), Value::I32(4)]));
        assert!(matches!(
            store.new_entry_named(&[("z", Value::I32(4))]),
            Err(StoreError::InvalidField { .. })
        ));
        assert!(matches!(
            store.new_entry_named(&[("y", Value::I32(4)), ("y", Value::I32(5))]),
            Err(StoreError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_set_value() {
        let mut store = xy_store();
        let id = add(&mut store, 1.0, 1);
        assert!(store.set_value(id, "x", Value::F32(9.0)).unwrap());
        assert_eq!(store.column::<f32>("x").unwrap(), &[9.0]);
        assert!(matches!(
            store.set_value(id, "x", Value::I32(9)),
            Err(StoreError::TypeMismatch { .. })
        ));
        store.delete(id);
        assert!(!store.set_value(id, "x", Value::F32(1.0)).unwrap());
    }

    #[test]
    fn test_columns_cover_live_prefix_only() {
        let mut store = xy_store();
        add(&mut store, 1.0, 1);
        add(&mut store, 2.0, 2);
        let columns: Vec<_> = store.columns().collect();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].0, "x");
        assert_eq!(columns[0].1.len(), 2);
        assert_eq!(store.column_bytes("y").unwrap().len(), 8);
        assert!(store.column::<u8>("y").is_err());
        assert_eq!(store.row_size(), 8);
    }

    #[test]
    fn test_column_mut_writes_through() {
        let mut store = xy_store();
        let a = add(&mut store, 1.0, 1);
        let b = add(&mut store, 2.0, 2);
        for y in store.column_mut::<i32>("y").unwrap() {
            *y *= 10;
        }
        assert_eq!(store.value(a, "y").unwrap(), Some(Value::I32(10)));
        assert_eq!(store.value(b, "y").unwrap(), Some(Value::I32(20)));
    }

    #[test]
    fn test_reallocate_guards_live_rows() {
        let mut store = xy_store();
        for i in 0..12 {
            add(&mut store, i as f32, i);
        }
        assert!(matches!(
            store.reallocate(11),
            Err(StoreError::CapacityCorruption { requested: 11, length: 12, .. })
        ));
        store.reallocate(40).unwrap();
        assert_eq!(store.capacity(), 40);
        store.reallocate(1).unwrap_err();
        store.reallocate(12).unwrap();
        assert_eq!(store.capacity(), 12);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_clear_resets_counter() {
        let mut store = xy_store();
        for i in 0..20 {
            add(&mut store, i as f32, i);
        }
        store.delete(4);
        store.clear();
        assert_eq!(store.len(), 0);
        assert_eq!(store.capacity(), 10);
        assert_eq!(store.recycled().count(), 0);
        assert_eq!(add(&mut store, 0.0, 0), 0);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_indices_of() {
        let mut store = xy_store();
        let a = add(&mut store, 1.0, 1);
        let b = add(&mut store, 2.0, 2);
        store.delete(a);
        assert_eq!(store.indices_of(&[a, b, 77]), vec![None, Some(0), None]);
    }
}
