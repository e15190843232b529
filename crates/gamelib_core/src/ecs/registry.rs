//! # Table Registry
//!
//! Owns every component and entity table of one world. Nothing is global:
//! two registries never share state, and dropping one frees all its tables.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::policy::CapacityPolicy;

use super::component::ComponentTable;
use super::entity::{EntitySchema, EntityTable};
use super::schema::Schema;
use super::typed::{ComponentRow, TypedTable};

/// Named component and entity tables sharing one capacity policy.
///
/// Component and entity tables live in one namespace.
///
/// ```rust
/// use gamelib_core::{EntitySchema, Registry, Schema, ScalarType, Value};
///
/// let mut registry = Registry::new();
/// let health = registry.register(Schema::builder("Health").field("hp", ScalarType::I32).build()?)?;
/// let units = registry.register_entity(
///     EntitySchema::builder("Unit").component("health", &health).build()?,
/// )?;
///
/// let hp = health.create(&[Value::I32(100)])?.id();
/// units.create(&[hp])?;
///
/// registry.reset_all();
/// assert!(health.is_empty() && units.is_empty());
/// # Ok::<(), gamelib_core::StoreError>(())
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    policy: CapacityPolicy,
    components: BTreeMap<String, Arc<ComponentTable>>,
    entities: BTreeMap<String, Arc<EntityTable>>,
}

impl Registry {
    /// Creates an empty registry with the default capacity policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose tables all use `policy`.
    ///
    /// # Errors
    ///
    /// `InvalidPolicy` if the policy fails validation.
    pub fn with_policy(policy: CapacityPolicy) -> StoreResult<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            ..Self::default()
        })
    }

    /// Capacity policy applied to new tables.
    #[must_use]
    pub fn policy(&self) -> &CapacityPolicy {
        &self.policy
    }

    fn ensure_free(&self, name: &str) -> StoreResult<()> {
        if self.components.contains_key(name) || self.entities.contains_key(name) {
            return Err(StoreError::DuplicateTable(name.to_owned()));
        }
        Ok(())
    }

    /// Creates and registers a component table.
    ///
    /// # Errors
    ///
    /// `DuplicateTable` if the name is taken.
    pub fn register(&mut self, schema: Schema) -> StoreResult<Arc<ComponentTable>> {
        self.ensure_free(schema.name())?;
        let table = Arc::new(ComponentTable::with_policy(schema, self.policy)?);
        tracing::debug!(table = %table.name(), "registered component table");
        self.components
            .insert(table.name().to_owned(), Arc::clone(&table));
        Ok(table)
    }

    /// Creates and registers the table for a `component!` row type.
    ///
    /// # Errors
    ///
    /// `DuplicateTable` if `C::NAME` is taken.
    pub fn register_typed<C: ComponentRow>(&mut self) -> StoreResult<TypedTable<C>> {
        let table = self.register(C::schema()?)?;
        TypedTable::from_table(table)
    }

    /// Registered component table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<Arc<ComponentTable>> {
        self.components.get(name).cloned()
    }

    /// Typed view of a registered component table.
    ///
    /// `None` if `C::NAME` is not registered or its schema differs from `C`.
    #[must_use]
    pub fn typed<C: ComponentRow>(&self) -> Option<TypedTable<C>> {
        TypedTable::from_table(self.table(C::NAME)?).ok()
    }

    /// Creates and registers an entity table.
    ///
    /// # Errors
    ///
    /// `DuplicateTable` if the name is taken.
    pub fn register_entity(&mut self, schema: EntitySchema) -> StoreResult<Arc<EntityTable>> {
        self.ensure_free(schema.name())?;
        let table = Arc::new(EntityTable::with_policy(schema, self.policy)?);
        tracing::debug!(entity = %table.name(), "registered entity table");
        self.entities.insert(table.name().to_owned(), Arc::clone(&table));
        Ok(table)
    }

    /// Registered entity table by name.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<Arc<EntityTable>> {
        self.entities.get(name).cloned()
    }

    /// Names of all registered tables, components first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components
            .keys()
            .chain(self.entities.keys())
            .map(String::as_str)
    }

    /// Empties every table: entities first (cascading), then every component
    /// table back to its initial state.
    pub fn reset_all(&self) {
        tracing::debug!(
            components = self.components.len(),
            entities = self.entities.len(),
            "resetting registry"
        );
        for entities in self.entities.values() {
            entities.clear();
        }
        for table in self.components.values() {
            table.reset();
        }
    }
}
