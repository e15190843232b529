//! # Schema Declaration
//!
//! A component's layout is declared once, up front, as an ordered list of
//! `(name, type)` pairs. Nothing is discovered at runtime.

use crate::error::{StoreError, StoreResult};
use crate::storage::ScalarType;

/// One declared field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field name, unique within the schema.
    pub name: String,
    /// Element type of the field's column.
    pub ty: ScalarType,
}

/// Ordered field layout of a component type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDecl>,
}

impl Schema {
    /// Starts declaring a schema.
    ///
    /// ```rust
    /// use gamelib_core::{Schema, ScalarType};
    ///
    /// let schema = Schema::builder("Transform")
    ///     .field("x", ScalarType::F32)
    ///     .field("y", ScalarType::F32)
    ///     .field("theta", ScalarType::F32)
    ///     .build()?;
    /// assert_eq!(schema.len(), 3);
    /// # Ok::<(), gamelib_core::StoreError>(())
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Component type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields, in order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always `false`; a built schema has at least one field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` if the name is not declared.
    pub fn field_index(&self, field: &str) -> StoreResult<usize> {
        self.fields
            .iter()
            .position(|f| f.name == field)
            .ok_or_else(|| StoreError::invalid_field(&self.name, field))
    }

    /// Bytes per row.
    #[must_use]
    pub fn row_size(&self) -> usize {
        self.fields.iter().map(|f| f.ty.size_of()).sum()
    }

    pub(crate) fn columns(&self) -> Vec<(String, ScalarType)> {
        self.fields.iter().map(|f| (f.name.clone(), f.ty)).collect()
    }
}

/// Builder returned by [`Schema::builder`].
#[derive(Clone, Debug)]
#[must_use]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDecl>,
}

impl SchemaBuilder {
    /// Declares the next field.
    pub fn field(mut self, name: impl Into<String>, ty: ScalarType) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            ty,
        });
        self
    }

    /// Finishes the declaration.
    ///
    /// # Errors
    ///
    /// - `NoFieldsDeclared` if no field was declared
    /// - `DuplicateField` if a name was declared twice (fields cannot be rebound)
    pub fn build(self) -> StoreResult<Schema> {
        if self.fields.is_empty() {
            return Err(StoreError::NoFieldsDeclared { table: self.name });
        }
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(StoreError::DuplicateField {
                    table: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(Schema {
            name: self.name,
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_schema_rejected() {
        let err = Schema::builder("Nothing").build().unwrap_err();
        assert_eq!(err, StoreError::NoFieldsDeclared { table: "Nothing".into() });
    }

    #[test]
    fn test_rebinding_a_field_rejected() {
        let err = Schema::builder("Mass")
            .field("kg", ScalarType::F32)
            .field("kg", ScalarType::F64)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateField {
                table: "Mass".into(),
                field: "kg".into()
            }
        );
    }

    #[test]
    fn test_field_lookup() {
        let schema = Schema::builder("Color")
            .field("r", ScalarType::U8)
            .field("g", ScalarType::U8)
            .field("b", ScalarType::U8)
            .field("a", ScalarType::F32)
            .build()
            .unwrap();
        assert_eq!(schema.field_index("b").unwrap(), 2);
        assert!(matches!(schema.field_index("w"), Err(StoreError::InvalidField { .. })));
        assert_eq!(schema.row_size(), 7);
    }
}
