//! # Entities
//!
//! An entity row is a tuple of component ids, one per declared component
//! field, stored in its own [`DenseStore`] (one `u32` column per field).
//!
//! ```text
//! Player table:      transform | collider
//!   entity 0   ->        4     |    0      --> Transform #4, Collider #0
//!   entity 1   ->        2     |    1      --> Transform #2, Collider #1
//! ```
//!
//! Reading a component goes entity id -> entity dense row -> component id ->
//! component dense row. Destroying an entity removes its own row, then
//! destroys every component it references.
//!
//! ## Lock order
//!
//! The entity lock is never held while a component table lock is being
//! taken, so callers holding [`ComponentTable::lock`] may destroy entities.
//! Only `create` holds both: it locks the referenced component tables (in
//! address order), then the entity table, so the liveness check and the
//! insert are one step.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::policy::CapacityPolicy;
use crate::storage::{DenseStore, RecordId, Scalar, ScalarType, Value};

use super::component::{ComponentTable, Record};

/// Ordered component fields of an entity type.
#[derive(Clone)]
pub struct EntitySchema {
    name: String,
    fields: Vec<(String, Arc<ComponentTable>)>,
}

impl EntitySchema {
    /// Starts declaring an entity type.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Entity type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of component fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always `false`; a built schema has at least one field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names, in declared order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Table referenced by a field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn table(&self, field: &str) -> StoreResult<&Arc<ComponentTable>> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, table)| table)
            .ok_or_else(|| StoreError::invalid_field(&self.name, field))
    }

    /// First field referencing `table`.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if no field references it.
    pub fn field_for(&self, table: &Arc<ComponentTable>) -> StoreResult<usize> {
        self.fields
            .iter()
            .position(|(_, t)| Arc::ptr_eq(t, table))
            .ok_or_else(|| StoreError::TypeMismatch {
                table: self.name.clone(),
                field: table.name().to_owned(),
                expected: format!(
                    "one of [{}]",
                    self.fields
                        .iter()
                        .map(|(_, t)| t.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                found: table.name().to_owned(),
            })
    }
}

impl fmt::Debug for EntitySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, table) in &self.fields {
            map.entry(name, &table.name());
        }
        map.finish()
    }
}

/// Builder returned by [`EntitySchema::builder`].
#[must_use]
pub struct EntitySchemaBuilder {
    name: String,
    fields: Vec<(String, Arc<ComponentTable>)>,
}

impl EntitySchemaBuilder {
    /// Declares the next component field.
    pub fn component(mut self, field: impl Into<String>, table: &Arc<ComponentTable>) -> Self {
        self.fields.push((field.into(), Arc::clone(table)));
        self
    }

    /// Finishes the declaration.
    ///
    /// # Errors
    ///
    /// `NoFieldsDeclared` or `DuplicateField`.
    pub fn build(self) -> StoreResult<EntitySchema> {
        if self.fields.is_empty() {
            return Err(StoreError::NoFieldsDeclared { table: self.name });
        }
        for (i, (field, _)) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|(other, _)| other == field) {
                return Err(StoreError::DuplicateField {
                    table: self.name.clone(),
                    field: field.clone(),
                });
            }
        }
        Ok(EntitySchema {
            name: self.name,
            fields: self.fields,
        })
    }
}

// ============================================================================
// ENTITY TABLE
// ============================================================================

/// Dense table of entity rows.
pub struct EntityTable {
    schema: EntitySchema,
    /// One `u32` column of component ids per field.
    store: Mutex<DenseStore>,
}

impl EntityTable {
    /// Creates an empty entity table with the default capacity policy.
    ///
    /// # Errors
    ///
    /// Propagates store construction errors.
    pub fn new(schema: EntitySchema) -> StoreResult<Self> {
        Self::with_policy(schema, CapacityPolicy::default())
    }

    /// Creates an empty entity table with a custom capacity policy.
    ///
    /// # Errors
    ///
    /// `InvalidPolicy` if the policy fails validation.
    pub fn with_policy(schema: EntitySchema, policy: CapacityPolicy) -> StoreResult<Self> {
        let columns = schema
            .fields
            .iter()
            .map(|(name, _)| (name.clone(), ScalarType::U32))
            .collect();
        let store = DenseStore::new(schema.name.clone(), columns, policy)?;
        Ok(Self {
            schema,
            store: Mutex::new(store),
        })
    }

    /// Entity type name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Declared component fields.
    #[must_use]
    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    /// Whether no entities are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the id has a live entity.
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.store.lock().contains(id)
    }

    /// Snapshot of the live entity ids, in dense order.
    #[must_use]
    pub fn ids(&self) -> Vec<RecordId> {
        self.store.lock().ids().to_vec()
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates an entity from one live component id per field, in declared order.
    ///
    /// # Errors
    ///
    /// - `ArityMismatch` if the id count differs from the field count
    /// - `UnknownId` if a component id has no live row in its table
    pub fn create(&self, components: &[RecordId]) -> StoreResult<EntityRef<'_>> {
        if components.len() != self.schema.len() {
            return Err(StoreError::ArityMismatch {
                table: self.name().to_owned(),
                expected: self.schema.len(),
                found: components.len(),
            });
        }
        let mut tables: Vec<&Arc<ComponentTable>> =
            self.schema.fields.iter().map(|(_, table)| table).collect();
        tables.sort_unstable_by_key(|table| Arc::as_ptr(*table));
        tables.dedup_by(|a, b| Arc::ptr_eq(*a, *b));
        let _guards: Vec<_> = tables.iter().map(|table| table.lock()).collect();

        for ((_, table), &id) in self.schema.fields.iter().zip(components) {
            if !table.contains(id) {
                return Err(StoreError::UnknownId {
                    table: table.name().to_owned(),
                    id,
                });
            }
        }

        let values: Vec<Value> = components.iter().map(|&id| Value::U32(id)).collect();
        let id = self.store.lock().new_entry(&values)?;
        tracing::trace!(entity = %self.name(), id, "created entity");
        Ok(EntityRef { table: self, id })
    }

    /// Creates an entity from component handles, in declared order.
    ///
    /// # Errors
    ///
    /// - `ArityMismatch` if the handle count differs from the field count
    /// - `TypeMismatch` if a handle belongs to a different table than its field
    /// - `UnknownId` if a handle's row was destroyed
    pub fn create_from(&self, components: &[Record<'_>]) -> StoreResult<EntityRef<'_>> {
        if components.len() != self.schema.len() {
            return Err(StoreError::ArityMismatch {
                table: self.name().to_owned(),
                expected: self.schema.len(),
                found: components.len(),
            });
        }
        for ((field, table), record) in self.schema.fields.iter().zip(components) {
            if !std::ptr::eq(Arc::as_ptr(table), record.table()) {
                return Err(StoreError::TypeMismatch {
                    table: self.name().to_owned(),
                    field: field.clone(),
                    expected: table.name().to_owned(),
                    found: record.table().name().to_owned(),
                });
            }
        }
        let ids: Vec<RecordId> = components.iter().map(Record::id).collect();
        self.create(&ids)
    }

    /// Creates an entity from `(field, component id)` pairs. Every field is required.
    ///
    /// # Errors
    ///
    /// `InvalidField`, `DuplicateField`, `MissingField` or `UnknownId`.
    pub fn create_named(&self, components: &[(&str, RecordId)]) -> StoreResult<EntityRef<'_>> {
        let mut ids: Vec<Option<RecordId>> = vec![None; self.schema.len()];
        for &(field, id) in components {
            let index = self
                .schema
                .fields
                .iter()
                .position(|(name, _)| name == field)
                .ok_or_else(|| StoreError::invalid_field(self.name(), field))?;
            if ids[index].replace(id).is_some() {
                return Err(StoreError::DuplicateField {
                    table: self.name().to_owned(),
                    field: field.to_owned(),
                });
            }
        }
        let ids = ids
            .into_iter()
            .zip(&self.schema.fields)
            .map(|(id, (field, _))| {
                id.ok_or_else(|| StoreError::MissingField {
                    table: self.name().to_owned(),
                    field: field.clone(),
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        self.create(&ids)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Handle to a live entity, `None` if the id has no row.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<EntityRef<'_>> {
        self.contains(id).then_some(EntityRef { table: self, id })
    }

    /// Component ids of a live entity, in declared order.
    #[must_use]
    pub fn component_ids_of(&self, id: RecordId) -> Option<Vec<RecordId>> {
        let row = self.store.lock().row(id)?;
        Some(row.into_iter().filter_map(Value::get::<u32>).collect())
    }

    /// Component id stored in one field of a live entity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn component_id(&self, id: RecordId, field: &str) -> StoreResult<Option<RecordId>> {
        let value = self.store.lock().value(id, field)?;
        Ok(value.and_then(Value::get::<u32>))
    }

    /// The component ids referenced through `table` for every live entity,
    /// in entity dense order.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if no field references `table`.
    pub fn component_ids(&self, table: &Arc<ComponentTable>) -> StoreResult<Vec<RecordId>> {
        let index = self.schema.field_for(table)?;
        let store = self.store.lock();
        Ok(store.column_at::<u32>(index)?.to_vec())
    }

    /// The component ids stored in `field` for every live entity, in entity
    /// dense order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn field_ids(&self, field: &str) -> StoreResult<Vec<RecordId>> {
        Ok(self.store.lock().column::<u32>(field)?.to_vec())
    }

    /// Field projection: one column of a component, gathered for every live
    /// entity in entity dense order.
    ///
    /// Entry `i` belongs to the `i`-th id of [`EntityTable::ids`] taken at the
    /// same moment; it is `None` where the referenced component is gone.
    /// The entity ids are copied under the entity lock, which is released
    /// before the component table is locked for the gather.
    ///
    /// # Errors
    ///
    /// `InvalidField` for an unknown entity field or component column,
    /// `TypeMismatch` if `T` is not the column's type.
    pub fn project<T: Scalar>(&self, field: &str, column: &str) -> StoreResult<Vec<Option<T>>> {
        let table = self.schema.table(field)?;
        let ids = self.store.lock().column::<u32>(field)?.to_vec();

        let guard = table.lock();
        let values = guard.column::<T>(column)?;
        let projected = guard
            .indices_of(&ids)
            .into_iter()
            .map(|index| index.map(|i| values[i]))
            .collect();
        Ok(projected)
    }

    // =========================================================================
    // Destruction
    // =========================================================================

    /// Destroys an entity and every component it references.
    ///
    /// The entity row is removed first and the entity lock released before
    /// any component table is locked. Components that are already gone are
    /// skipped. Returns `false` if the entity id had no row.
    ///
    /// # Panics
    ///
    /// If the calling thread holds a column borrow from a [`TableGuard`] of
    /// one of the referenced component tables.
    ///
    /// [`TableGuard`]: crate::TableGuard
    pub fn destroy(&self, id: RecordId) -> bool {
        let row = {
            let mut store = self.store.lock();
            let Some(row) = store.row(id) else {
                return false;
            };
            store.delete(id);
            row
        };
        tracing::trace!(entity = %self.name(), id, "destroyed entity");
        for ((_, table), value) in self.schema.fields.iter().zip(row) {
            if let Some(component) = value.get::<u32>() {
                table.destroy(component);
            }
        }
        true
    }

    /// Destroys every live entity, cascading to their components.
    pub fn clear(&self) {
        let ids = self.ids();
        tracing::debug!(entity = %self.name(), count = ids.len(), "clearing entities");
        for id in ids {
            self.destroy(id);
        }
    }

    /// Verifies the storage invariants of the entity rows.
    ///
    /// # Errors
    ///
    /// Describes the first broken invariant.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.store.lock().check_invariants()
    }
}

impl fmt::Debug for EntityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityTable")
            .field("name", &self.name())
            .field("schema", &self.schema)
            .field("len", &self.len())
            .finish()
    }
}

// ============================================================================
// ENTITY HANDLE
// ============================================================================

/// Lightweight handle to one entity: a table reference plus an id.
#[derive(Clone, Copy)]
pub struct EntityRef<'t> {
    table: &'t EntityTable,
    id: RecordId,
}

impl<'t> EntityRef<'t> {
    /// Stable id of the entity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    /// Whether the entity still exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.table.contains(self.id)
    }

    /// Component id stored in a field. `Ok(None)` once the entity is destroyed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn component_id(&self, field: &str) -> StoreResult<Option<RecordId>> {
        self.table.component_id(self.id, field)
    }

    /// Handle to the component referenced by a field.
    ///
    /// `Ok(None)` once the entity or that component is destroyed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn component(&self, field: &str) -> StoreResult<Option<Record<'t>>> {
        let table = self.table.schema.table(field)?;
        let Some(id) = self.component_id(field)? else {
            return Ok(None);
        };
        Ok(table.get(id))
    }

    /// Handles to every referenced component, in declared order.
    ///
    /// `None` once the entity is destroyed; an inner `None` marks a
    /// component that is already gone.
    #[must_use]
    pub fn components(&self) -> Option<Vec<Option<Record<'t>>>> {
        let ids = self.table.component_ids_of(self.id)?;
        Some(
            self.table
                .schema
                .fields
                .iter()
                .zip(ids)
                .map(|((_, table), id)| table.get(id))
                .collect(),
        )
    }

    /// Destroys the entity and its components.
    pub fn destroy(self) -> bool {
        self.table.destroy(self.id)
    }
}

/// Structural equality: same entity table, both live, and every component
/// equal field by field.
impl PartialEq for EntityRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        if !std::ptr::eq(self.table, other.table) {
            return false;
        }
        match (self.components(), other.components()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for EntityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("table", &self.table.name())
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::schema::Schema;

    struct Fixture {
        transforms: Arc<ComponentTable>,
        colliders: Arc<ComponentTable>,
        players: EntityTable,
    }

    fn fixture() -> Fixture {
        let transforms = Arc::new(
            ComponentTable::new(
                Schema::builder("Transform")
                    .field("x", ScalarType::F32)
                    .field("y", ScalarType::F32)
                    .build()
                    .unwrap(),
            )
            .unwrap(),
        );
        let colliders = Arc::new(
            ComponentTable::new(
                Schema::builder("Collider")
                    .field("radius", ScalarType::F32)
                    .build()
                    .unwrap(),
            )
            .unwrap(),
        );
        let players = EntityTable::new(
            EntitySchema::builder("Player")
                .component("transform", &transforms)
                .component("collider", &colliders)
                .build()
                .unwrap(),
        )
        .unwrap();
        Fixture {
            transforms,
            colliders,
            players,
        }
    }

    fn spawn(f: &Fixture, x: f32, radius: f32) -> RecordId {
        let t = f.transforms.create(&[Value::F32(x), Value::F32(0.0)]).unwrap().id();
        let c = f.colliders.create(&[Value::F32(radius)]).unwrap().id();
        f.players.create(&[t, c]).unwrap().id()
    }

    #[test]
    fn test_schema_requires_components() {
        let err = EntitySchema::builder("Ghost").build().unwrap_err();
        assert_eq!(err, StoreError::NoFieldsDeclared { table: "Ghost".into() });
    }

    #[test]
    fn test_schema_rejects_duplicate_fields() {
        let f = fixture();
        let err = EntitySchema::builder("Twice")
            .component("a", &f.transforms)
            .component("a", &f.colliders)
            .build()
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateField { .. }));
    }

    #[test]
    fn test_two_level_lookup() {
        let f = fixture();
        let id = spawn(&f, 3.0, 0.5);
        let player = f.players.get(id).unwrap();
        let collider = player.component("collider").unwrap().unwrap();
        assert_eq!(collider.get_as::<f32>("radius").unwrap(), Some(0.5));
        assert!(matches!(player.component("weapon"), Err(StoreError::InvalidField { .. })));
    }

    #[test]
    fn test_create_validates_components() {
        let f = fixture();
        assert!(matches!(f.players.create(&[0]), Err(StoreError::ArityMismatch { .. })));
        assert!(matches!(
            f.players.create(&[0, 0]),
            Err(StoreError::UnknownId { .. })
        ));
        assert!(f.players.is_empty());
    }

    #[test]
    fn test_create_from_checks_tables() {
        let f = fixture();
        let t = f.transforms.create(&[Value::F32(1.0), Value::F32(1.0)]).unwrap();
        let c = f.colliders.create(&[Value::F32(1.0)]).unwrap();
        assert!(matches!(
            f.players.create_from(&[c, t]),
            Err(StoreError::TypeMismatch { .. })
        ));
        let player = f.players.create_from(&[t, c]).unwrap();
        assert_eq!(player.component_id("transform").unwrap(), Some(t.id()));
    }

    #[test]
    fn test_create_named() {
        let f = fixture();
        let t = f.transforms.create(&[Value::F32(1.0), Value::F32(1.0)]).unwrap().id();
        let c = f.colliders.create(&[Value::F32(1.0)]).unwrap().id();
        assert!(matches!(
            f.players.create_named(&[("transform", t)]),
            Err(StoreError::MissingField { .. })
        ));
        assert!(matches!(
            f.players.create_named(&[("transform", t), ("shield", c)]),
            Err(StoreError::InvalidField { .. })
        ));
        let player = f.players.create_named(&[("collider", c), ("transform", t)]).unwrap();
        assert_eq!(player.component_id("collider").unwrap(), Some(c));
    }

    #[test]
    fn test_destroy_cascades() {
        let f = fixture();
        let keep = spawn(&f, 1.0, 1.0);
        let gone = spawn(&f, 2.0, 2.0);
        let ids = f.players.component_ids_of(gone).unwrap();

        assert!(f.players.destroy(gone));
        assert!(f.players.get(gone).is_none());
        assert!(f.transforms.get(ids[0]).is_none());
        assert!(f.colliders.get(ids[1]).is_none());
        assert_eq!(f.transforms.len(), 1);
        assert!(f.players.get(keep).is_some());
        assert!(!f.players.destroy(gone));
    }

    #[test]
    fn test_destroy_tolerates_missing_components() {
        let f = fixture();
        let id = spawn(&f, 1.0, 1.0);
        let t = f.players.component_id(id, "transform").unwrap().unwrap();
        f.transforms.destroy(t);
        assert!(f.players.destroy(id));
        assert!(f.colliders.is_empty());
    }

    #[test]
    fn test_component_ids_by_table() {
        let f = fixture();
        spawn(&f, 1.0, 1.0);
        spawn(&f, 2.0, 2.0);
        assert_eq!(f.players.component_ids(&f.colliders).unwrap(), vec![0, 1]);

        let stranger = Arc::new(
            ComponentTable::new(Schema::builder("Sound").field("db", ScalarType::F32).build().unwrap())
                .unwrap(),
        );
        assert!(matches!(
            f.players.component_ids(&stranger),
            Err(StoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_projection_follows_entity_order() {
        let f = fixture();
        // Unrelated transforms shuffle dense order in the component table.
        let filler = f.transforms.create(&[Value::F32(-1.0), Value::F32(0.0)]).unwrap().id();
        let a = spawn(&f, 10.0, 0.1);
        let b = spawn(&f, 20.0, 0.2);
        f.transforms.destroy(filler);

        let xs = f.players.project::<f32>("transform", "x").unwrap();
        let order = f.players.ids();
        assert_eq!(order, vec![a, b]);
        assert_eq!(xs, vec![Some(10.0), Some(20.0)]);

        let radii = f.players.project::<f32>("collider", "radius").unwrap();
        assert_eq!(radii, vec![Some(0.1), Some(0.2)]);

        assert!(f.players.project::<u8>("collider", "radius").is_err());
        assert!(f.players.project::<f32>("collider", "mass").is_err());
    }

    #[test]
    fn test_clear_cascades() {
        let f = fixture();
        for i in 0..15 {
            spawn(&f, i as f32, 1.0);
        }
        f.players.clear();
        assert!(f.players.is_empty());
        assert!(f.transforms.is_empty());
        assert!(f.colliders.is_empty());
        f.players.check_invariants().unwrap();
    }

    #[test]
    fn test_entity_equality() {
        let f = fixture();
        let a = f.players.get(spawn(&f, 1.0, 1.0)).unwrap();
        let b = f.players.get(spawn(&f, 1.0, 1.0)).unwrap();
        let c = f.players.get(spawn(&f, 1.0, 2.0)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_destroy_inside_component_lock() {
        let f = fixture();
        let id = spawn(&f, 1.0, 1.0);
        let guard = f.transforms.lock();
        assert!(f.players.destroy(id));
        assert!(guard.is_empty());
        drop(guard);
        assert!(f.colliders.is_empty());
    }

    #[test]
    fn test_create_checks_and_inserts_under_component_locks() {
        use std::sync::mpsc;
        use std::time::Duration;

        let f = &fixture();
        let t = f.transforms.create(&[Value::F32(1.0), Value::F32(1.0)]).unwrap().id();
        let c = f.colliders.create(&[Value::F32(1.0)]).unwrap().id();
        let (tx, rx) = mpsc::channel();

        std::thread::scope(|scope| {
            let entities = f.players.store.lock();
            let creator = scope.spawn(|| f.players.create(&[t, c]).map(|e| e.id()));
            std::thread::sleep(Duration::from_millis(100));
            let destroyer = scope.spawn(move || {
                let destroyed = f.transforms.destroy(t);
                tx.send(()).unwrap();
                destroyed
            });
            // The creator is parked between its liveness check and the insert.
            let destroyer_blocked = rx.recv_timeout(Duration::from_millis(100)).is_err();
            drop(entities);

            assert_eq!(creator.join().unwrap(), Ok(0));
            assert!(destroyer.join().unwrap());
            assert!(destroyer_blocked);
        });
    }
}
