//! Compiled, immutable schema representation
//!
//! A `CompiledSchema` is built once per declaration and shared read-only
//! (behind an `Arc`) by any number of concurrent validations.

use std::collections::HashMap;
use std::sync::Arc;

use super::constraints::ConstraintBag;
use crate::value::FieldValue;

/// Resolved field type. Nested records point at their own compiled schema.
#[derive(Debug, Clone)]
pub enum CompiledType {
    String,
    Int,
    Float,
    Bool,
    Decimal,
    Uuid,
    DateTime,
    Any,
    List(Box<CompiledType>),
    Map(Box<CompiledType>),
    Object(Arc<CompiledSchema>),
}

impl CompiledType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CompiledType::String => "string",
            CompiledType::Int => "integer",
            CompiledType::Float => "float",
            CompiledType::Bool => "boolean",
            CompiledType::Decimal => "decimal",
            CompiledType::Uuid => "uuid",
            CompiledType::DateTime => "date-time",
            CompiledType::Any => "any",
            CompiledType::List(_) => "list",
            CompiledType::Map(_) => "map",
            CompiledType::Object(_) => "object",
        }
    }
}

/// One field of a compiled schema.
#[derive(Debug, Clone)]
pub struct CompiledField {
    pub(crate) name: String,
    pub(crate) index: usize,
    pub(crate) field_type: CompiledType,
    pub(crate) constraints: ConstraintBag,
    pub(crate) required: bool,
    pub(crate) default: Option<FieldValue>,
}

impl CompiledField {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of this field in the schema and in every instance.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn field_type(&self) -> &CompiledType {
        &self.field_type
    }

    pub fn constraints(&self) -> &ConstraintBag {
        &self.constraints
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> Option<&FieldValue> {
        self.default.as_ref()
    }
}

/// A record type ready for validation.
#[derive(Debug)]
pub struct CompiledSchema {
    name: String,
    fields: Vec<CompiledField>,
    index: HashMap<String, usize>,
}

impl CompiledSchema {
    /// Assembles a schema from fields already in declaration order.
    /// Field names must be unique; the compiler guarantees it.
    pub(crate) fn new(name: String, fields: Vec<CompiledField>) -> Self {
        let index = fields
            .iter()
            .map(|field| (field.name.clone(), field.index))
            .collect();
        Self {
            name,
            fields,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&CompiledField> {
        self.fields.get(index)
    }

    /// O(1) position lookup by field name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn field_by_name(&self, name: &str) -> Option<&CompiledField> {
        self.index_of(name).and_then(|i| self.fields.get(i))
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}
