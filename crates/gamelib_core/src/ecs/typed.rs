//! # Typed Components
//!
//! Compile-time schemas on top of [`ComponentTable`].
//!
//! [`component!`](crate::component) declares a plain row struct and one
//! [`Field`] key per field, so field names and types are checked by the
//! compiler instead of at runtime:
//!
//! ```rust
//! use gamelib_core::{component, TypedTable};
//!
//! component! {
//!     /// World-space placement.
//!     pub struct Transform {
//!         /// X position.
//!         x: f32,
//!         /// Y position.
//!         y: f32,
//!         /// Rotation in degrees.
//!         theta: f32,
//!     }
//! }
//!
//! let transforms = TypedTable::<Transform>::new()?;
//! let record = transforms.create(Transform { x: 1.0, y: 2.0, theta: 0.0 })?;
//! record.set(Transform::theta, 45.0);
//! assert_eq!(record.get(Transform::theta), Some(45.0));
//! # Ok::<(), gamelib_core::StoreError>(())
//! ```

use std::cell::{Ref, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::policy::CapacityPolicy;
use crate::storage::{RecordId, Scalar, Value};

use super::component::{ComponentTable, Record, TableGuard};
use super::schema::Schema;

/// A row type with a fixed schema. Implemented by [`component!`](crate::component).
pub trait ComponentRow: Copy + Send + Sync + 'static {
    /// Component type name.
    const NAME: &'static str;

    /// The declared layout.
    ///
    /// # Errors
    ///
    /// Propagates schema validation errors.
    fn schema() -> StoreResult<Schema>;

    /// Field values in declared order.
    fn into_values(self) -> Vec<Value>;

    /// Rebuilds a row from values in declared order, `None` on mismatch.
    fn from_values(values: &[Value]) -> Option<Self>;
}

/// Typed key of one field of `C`, holding an element of type `T`.
pub struct Field<C, T> {
    index: usize,
    name: &'static str,
    _marker: PhantomData<fn() -> (C, T)>,
}

impl<C, T> Field<C, T> {
    /// Creates a key for the field at `index`. Called by [`component!`](crate::component).
    #[must_use]
    pub const fn new(index: usize, name: &'static str) -> Self {
        Self {
            index,
            name,
            _marker: PhantomData,
        }
    }

    /// Position of the field in declared order.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<C, T> Clone for Field<C, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, T> Copy for Field<C, T> {}

impl<C, T> fmt::Debug for Field<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("index", &self.index)
            .field("name", &self.name)
            .finish()
    }
}

/// Declares a component row type.
///
/// Generates a `Copy` struct with public fields, a [`ComponentRow`] impl,
/// and one associated [`Field`] constant per field, named like the field.
/// Field types must implement [`Scalar`].
#[macro_export]
macro_rules! component {
    (@fields $name:ident; $index:expr;) => {};
    (@fields $name:ident; $index:expr; $field:ident : $ty:ty, $($rest:tt)*) => {
        #[doc = concat!("Typed key for `", stringify!($name), "::", stringify!($field), "`.")]
        pub const $field: $crate::Field<$name, $ty> =
            $crate::Field::new($index, stringify!($field));
        $crate::component!(@fields $name; $index + 1usize; $($rest)*);
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )+
        }

        #[allow(non_upper_case_globals, dead_code)]
        impl $name {
            $crate::component!(@fields $name; 0usize; $($field : $ty,)+);
        }

        impl $crate::ComponentRow for $name {
            const NAME: &'static str = stringify!($name);

            fn schema() -> $crate::StoreResult<$crate::Schema> {
                $crate::Schema::builder(stringify!($name))
                    $(.field(stringify!($field), <$ty as $crate::Scalar>::TYPE))+
                    .build()
            }

            fn into_values(self) -> ::std::vec::Vec<$crate::Value> {
                ::std::vec![$(<$ty as $crate::Scalar>::into_value(self.$field)),+]
            }

            fn from_values(values: &[$crate::Value]) -> ::std::option::Option<Self> {
                let mut values = values.iter().copied();
                ::std::option::Option::Some(Self {
                    $($field: <$ty as $crate::Scalar>::from_value(values.next()?)?,)+
                })
            }
        }
    };
}

// ============================================================================
// TYPED TABLE
// ============================================================================

/// A [`ComponentTable`] whose rows are the struct `C`.
pub struct TypedTable<C: ComponentRow> {
    table: Arc<ComponentTable>,
    _marker: PhantomData<fn() -> C>,
}

impl<C: ComponentRow> TypedTable<C> {
    /// Creates an empty table with the default capacity policy.
    ///
    /// # Errors
    ///
    /// Propagates schema validation errors.
    pub fn new() -> StoreResult<Self> {
        Self::with_policy(CapacityPolicy::default())
    }

    /// Creates an empty table with a custom capacity policy.
    ///
    /// # Errors
    ///
    /// Schema errors or `InvalidPolicy`.
    pub fn with_policy(policy: CapacityPolicy) -> StoreResult<Self> {
        let table = ComponentTable::with_policy(C::schema()?, policy)?;
        Ok(Self {
            table: Arc::new(table),
            _marker: PhantomData,
        })
    }

    /// Wraps an existing table, checking that its schema is `C`'s.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the schemas differ.
    pub fn from_table(table: Arc<ComponentTable>) -> StoreResult<Self> {
        let schema = C::schema()?;
        if *table.schema() != schema {
            return Err(StoreError::TypeMismatch {
                table: table.name().to_owned(),
                field: C::NAME.to_owned(),
                expected: format!("{schema:?}"),
                found: format!("{:?}", table.schema()),
            });
        }
        Ok(Self {
            table,
            _marker: PhantomData,
        })
    }

    /// The untyped table, for entity schemas and name-based access.
    #[must_use]
    pub fn table(&self) -> &Arc<ComponentTable> {
        &self.table
    }

    /// Creates a row.
    ///
    /// # Errors
    ///
    /// Only if the table was built from a different schema, which
    /// [`TypedTable::from_table`] rules out.
    pub fn create(&self, row: C) -> StoreResult<TypedRecord<'_, C>> {
        let record = self.table.create(&row.into_values())?;
        Ok(TypedRecord::new(record))
    }

    /// Handle to a live row.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<TypedRecord<'_, C>> {
        self.table.get(id).map(TypedRecord::new)
    }

    /// Copy of a live row.
    #[must_use]
    pub fn read(&self, id: RecordId) -> Option<C> {
        self.table.row(id).and_then(|values| C::from_values(&values))
    }

    /// Destroys a row. Returns `false` if the id had no row.
    pub fn destroy(&self, id: RecordId) -> bool {
        self.table.destroy(id)
    }

    /// Number of live rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no rows are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Acquires the table lock for typed bulk access.
    pub fn lock(&self) -> TypedGuard<'_, C> {
        TypedGuard {
            guard: self.table.lock(),
            _marker: PhantomData,
        }
    }
}

impl<C: ComponentRow> Clone for TypedTable<C> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            _marker: PhantomData,
        }
    }
}

impl<C: ComponentRow> fmt::Debug for TypedTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedTable").field(&self.table).finish()
    }
}

/// Scoped lock with typed column access. Derefs to [`TableGuard`].
pub struct TypedGuard<'t, C> {
    guard: TableGuard<'t>,
    _marker: PhantomData<fn() -> C>,
}

impl<'t, C: ComponentRow> TypedGuard<'t, C> {
    /// Live prefix of a column.
    #[must_use]
    pub fn column<T: Scalar>(&self, field: Field<C, T>) -> Ref<'_, [T]> {
        self.guard.column_at(field.index)
    }

    /// Mutable live prefix of a column.
    #[must_use]
    pub fn column_mut<T: Scalar>(&self, field: Field<C, T>) -> RefMut<'_, [T]> {
        self.guard.column_at_mut(field.index)
    }
}

impl<'t, C> Deref for TypedGuard<'t, C> {
    type Target = TableGuard<'t>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

// ============================================================================
// TYPED HANDLE
// ============================================================================

/// Row handle with typed field accessors.
pub struct TypedRecord<'t, C> {
    record: Record<'t>,
    _marker: PhantomData<fn() -> C>,
}

impl<'t, C: ComponentRow> TypedRecord<'t, C> {
    fn new(record: Record<'t>) -> Self {
        Self {
            record,
            _marker: PhantomData,
        }
    }

    /// Stable id of the row.
    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.record.id()
    }

    /// The untyped handle.
    #[must_use]
    pub const fn record(&self) -> Record<'t> {
        self.record
    }

    /// Whether the row still exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.record.is_alive()
    }

    /// Reads a field, `None` once the row is destroyed.
    #[must_use]
    pub fn get<T: Scalar>(&self, field: Field<C, T>) -> Option<T> {
        self.record
            .table()
            .value_at(self.record.id(), field.index)
            .and_then(T::from_value)
    }

    /// Writes a field, `false` once the row is destroyed.
    pub fn set<T: Scalar>(&self, field: Field<C, T>, value: T) -> bool {
        self.record
            .table()
            .set_value_at(self.record.id(), field.index, value.into_value())
            .unwrap_or(false)
    }

    /// Copy of the whole row.
    #[must_use]
    pub fn read(&self) -> Option<C> {
        self.record.values().and_then(|values| C::from_values(&values))
    }

    /// Overwrites the whole row under one lock, `false` once the row is destroyed.
    pub fn write(&self, row: C) -> bool {
        self.record
            .table()
            .write_row(self.record.id(), &row.into_values())
            .unwrap_or(false)
    }

    /// Destroys the row.
    pub fn destroy(self) -> bool {
        self.record.destroy()
    }
}

impl<C> Clone for TypedRecord<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for TypedRecord<'_, C> {}

impl<C> PartialEq for TypedRecord<'_, C> {
    fn eq(&self, other: &Self) -> bool {
        self.record == other.record
    }
}

impl<C> fmt::Debug for TypedRecord<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.record, f)
    }
}

impl<C> fmt::Display for TypedRecord<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.record, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ScalarType;

    crate::component! {
        /// Test body.
        struct Body {
            mass: f32,
            charge: i16,
            flags: u8,
        }
    }

    #[test]
    fn test_macro_schema() {
        let schema = Body::schema().unwrap();
        assert_eq!(schema.name(), "Body");
        assert_eq!(schema.fields()[1].name, "charge");
        assert_eq!(schema.fields()[1].ty, ScalarType::I16);
        assert_eq!(Body::flags.index(), 2);
        assert_eq!(Body::mass.name(), "mass");
    }

    #[test]
    fn test_values_roundtrip() {
        let body = Body { mass: 2.0, charge: -1, flags: 3 };
        let values = body.into_values();
        assert_eq!(values[1], Value::I16(-1));
        assert_eq!(Body::from_values(&values), Some(body));
        assert_eq!(Body::from_values(&values[..2]), None);
    }

    #[test]
    fn test_typed_accessors() {
        let bodies = TypedTable::<Body>::new().unwrap();
        let record = bodies.create(Body { mass: 1.0, charge: 2, flags: 0 }).unwrap();
        assert_eq!(record.get(Body::charge), Some(2));
        assert!(record.set(Body::flags, 7));
        assert_eq!(bodies.read(record.id()), Some(Body { mass: 1.0, charge: 2, flags: 7 }));
        assert!(record.write(Body { mass: 5.0, charge: 0, flags: 1 }));
        assert_eq!(record.read().map(|b| b.mass), Some(5.0));
        assert!(record.destroy());
        assert_eq!(record.get(Body::charge), None);
        assert!(!record.set(Body::charge, 1));
        assert!(bodies.is_empty());
    }

    #[test]
    fn test_typed_guard_columns() {
        let bodies = TypedTable::<Body>::new().unwrap();
        for i in 0..4 {
            bodies.create(Body { mass: i as f32, charge: 0, flags: 0 }).unwrap();
        }
        let guard = bodies.lock();
        assert_eq!(&*guard.column(Body::mass), &[0.0, 1.0, 2.0, 3.0]);
        for charge in guard.column_mut(Body::charge).iter_mut() {
            *charge = 9;
        }
        drop(guard);
        assert_eq!(bodies.read(3).map(|b| b.charge), Some(9));
    }

    #[test]
    fn test_from_table_checks_schema() {
        let other = Arc::new(
            ComponentTable::new(Schema::builder("Body").field("mass", ScalarType::F64).build().unwrap())
                .unwrap(),
        );
        assert!(matches!(
            TypedTable::<Body>::from_table(other),
            Err(StoreError::TypeMismatch { .. })
        ));

        let bodies = TypedTable::<Body>::new().unwrap();
        let again = TypedTable::<Body>::from_table(Arc::clone(bodies.table())).unwrap();
        bodies.create(Body::default()).unwrap();
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn test_typed_equality() {
        let bodies = TypedTable::<Body>::new().unwrap();
        let a = bodies.create(Body { mass: 1.0, charge: 1, flags: 1 }).unwrap();
        let b = bodies.create(Body { mass: 1.0, charge: 1, flags: 1 }).unwrap();
        let c = bodies.create(Body { mass: 1.0, charge: 1, flags: 2 }).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
