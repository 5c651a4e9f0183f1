//! Validated record instances
//!
//! A `ModelInstance` pairs a shared compiled schema with one native value
//! per field, in schema order. Instances only come out of a successful
//! validation, and every later write goes through the same field validator,
//! so an instance is valid for its whole lifetime.

use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::schema::CompiledSchema;
use crate::validation::{validate_field, ValidationError};
use crate::value::{to_host, FieldValue, HostValue};

/// One validated record.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    schema: Arc<CompiledSchema>,
    values: Vec<FieldValue>,
}

impl ModelInstance {
    /// Caller guarantees `values[i]` is the validated value of field `i`.
    pub(crate) fn from_parts(schema: Arc<CompiledSchema>, values: Vec<FieldValue>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self { schema, values }
    }

    pub fn schema(&self) -> &Arc<CompiledSchema> {
        &self.schema
    }

    /// Values in declaration order
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Native value of a field.
    pub fn get_value(&self, name: &str) -> Option<&FieldValue> {
        self.schema.index_of(name).map(|i| &self.values[i])
    }

    /// Host view of a field, or `None` if the schema has no such field.
    pub fn get_field(&self, name: &str) -> Option<HostValue> {
        let field = self.schema.field_by_name(name)?;
        Some(to_host(&self.values[field.index()], field.field_type()))
    }

    /// Validates `raw` for one field and stores it.
    ///
    /// On error the instance is left exactly as it was.
    pub fn set_field(&mut self, name: &str, raw: HostValue) -> Result<(), ValidationError> {
        let field = self
            .schema
            .field_by_name(name)
            .ok_or_else(|| ValidationError::unknown_field(name))?;

        let value = validate_field(field, Some(&raw))?;
        self.values[field.index()] = value;
        Ok(())
    }

    /// `(name, value)` pairs in declaration order.
    pub fn dict(&self) -> Vec<(String, HostValue)> {
        self.schema
            .fields()
            .iter()
            .zip(&self.values)
            .map(|(field, value)| (field.name().to_string(), to_host(value, field.field_type())))
            .collect()
    }

    /// Compact JSON text in declaration order.
    pub fn json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl PartialEq for ModelInstance {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name() && self.values == other.values
    }
}

impl Serialize for ModelInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.schema.fields().iter().zip(&self.values) {
            map.serialize_entry(field.name(), value)?;
        }
        map.end()
    }
}
