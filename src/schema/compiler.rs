//! Schema compiler
//!
//! Turns a `SchemaDecl` into an immutable `CompiledSchema`:
//! - fields keep declaration order and get a name→index map
//! - constraint rules become ordered checks with patterns compiled once
//! - defaults and enum members are coerced ahead of time
//!
//! Compilation is pure. Every problem with a declaration is reported here
//! and never surfaces during validation.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use super::compiled::{CompiledField, CompiledSchema, CompiledType};
use super::constraints::{Check, ConstraintBag};
use super::errors::{CompileError, CompileResult};
use super::patterns;
use super::types::{Constraints, FieldDecl, FieldType, SchemaDecl};
use crate::observability::Event;
use crate::validation::make_path;
use crate::value::{from_host, FieldValue, HostValue};

/// Compiles a schema declaration.
pub fn compile(decl: &SchemaDecl) -> CompileResult<Arc<CompiledSchema>> {
    let schema = compile_schema(&decl.name, &decl.fields, "").inspect_err(|err| {
        tracing::warn!(event = %Event::SchemaRejected, schema = %decl.name, code = err.code(), %err);
    })?;
    tracing::debug!(event = %Event::SchemaCompiled, schema = %decl.name, fields = schema.len());
    Ok(Arc::new(schema))
}

fn compile_schema(name: &str, fields: &[FieldDecl], prefix: &str) -> CompileResult<CompiledSchema> {
    let mut seen = HashSet::with_capacity(fields.len());
    let mut compiled = Vec::with_capacity(fields.len());

    for (index, decl) in fields.iter().enumerate() {
        if decl.name.is_empty() {
            return Err(CompileError::EmptyFieldName {
                schema: name.to_string(),
            });
        }
        if !seen.insert(decl.name.as_str()) {
            return Err(CompileError::DuplicateField {
                schema: name.to_string(),
                field: decl.name.clone(),
            });
        }

        let path = make_path(prefix, &decl.name);
        compiled.push(compile_field(index, decl, &path)?);
    }

    Ok(CompiledSchema::new(name.to_string(), compiled))
}

fn compile_field(index: usize, decl: &FieldDecl, path: &str) -> CompileResult<CompiledField> {
    let field_type = compile_type(&decl.field_type, path)?;
    let constraints = compile_constraints(path, &field_type, &decl.constraints)?;
    let default = decl
        .default
        .as_ref()
        .map(|value| compile_default(path, &field_type, &constraints, value))
        .transpose()?;

    Ok(CompiledField {
        name: decl.name.clone(),
        index,
        field_type,
        constraints,
        required: decl.required,
        default,
    })
}

fn compile_type(field_type: &FieldType, path: &str) -> CompileResult<CompiledType> {
    Ok(match field_type {
        FieldType::String => CompiledType::String,
        FieldType::Int => CompiledType::Int,
        FieldType::Float => CompiledType::Float,
        FieldType::Bool => CompiledType::Bool,
        FieldType::Decimal => CompiledType::Decimal,
        FieldType::Uuid => CompiledType::Uuid,
        FieldType::DateTime => CompiledType::DateTime,
        FieldType::Any => CompiledType::Any,
        FieldType::List { items } => CompiledType::List(Box::new(compile_type(items, path)?)),
        FieldType::Map { values } => CompiledType::Map(Box::new(compile_type(values, path)?)),
        FieldType::Object { fields } => {
            CompiledType::Object(Arc::new(compile_schema(path, fields, path)?))
        }
    })
}

/// Which constraint families a type accepts.
struct Applicability {
    text: bool,
    numeric: bool,
    items: bool,
    unique: bool,
    one_of: bool,
}

impl Applicability {
    fn of(field_type: &CompiledType) -> Self {
        let text = matches!(field_type, CompiledType::String);
        let numeric = matches!(
            field_type,
            CompiledType::Int | CompiledType::Float | CompiledType::Decimal
        );
        let items = matches!(field_type, CompiledType::List(_) | CompiledType::Map(_));
        let unique = matches!(field_type, CompiledType::List(_));
        let one_of = !matches!(
            field_type,
            CompiledType::Any | CompiledType::List(_) | CompiledType::Map(_) | CompiledType::Object(_)
        );
        Self {
            text,
            numeric,
            items,
            unique,
            one_of,
        }
    }
}

fn compile_constraints(
    path: &str,
    field_type: &CompiledType,
    c: &Constraints,
) -> CompileResult<ConstraintBag> {
    let applies = Applicability::of(field_type);
    let require = |ok: bool, constraint: &'static str| -> CompileResult<()> {
        if ok {
            Ok(())
        } else {
            Err(CompileError::InapplicableConstraint {
                field: path.to_string(),
                constraint,
                type_name: field_type.type_name(),
            })
        }
    };

    let mut checks = Vec::new();

    if let Some(n) = c.min_length {
        require(applies.text, "min_length")?;
        checks.push(Check::MinLength(n));
    }
    if let Some(n) = c.max_length {
        require(applies.text, "max_length")?;
        checks.push(Check::MaxLength(n));
    }
    if let Some(pattern) = &c.pattern {
        require(applies.text, "pattern")?;
        let regex = patterns::intern(pattern).map_err(|e| CompileError::InvalidPattern {
            field: path.to_string(),
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        checks.push(Check::Pattern(regex));
    }
    if c.email {
        require(applies.text, "email")?;
        checks.push(Check::Email);
    }
    if c.url {
        require(applies.text, "url")?;
        checks.push(Check::Url);
    }

    let bounds: [(&'static str, Option<f64>, fn(f64) -> Check); 4] = [
        ("ge", c.ge, Check::Ge),
        ("le", c.le, Check::Le),
        ("gt", c.gt, Check::Gt),
        ("lt", c.lt, Check::Lt),
    ];
    for (constraint, bound, check) in bounds {
        if let Some(bound) = bound {
            require(applies.numeric, constraint)?;
            if !bound.is_finite() {
                return Err(CompileError::InvalidConstraint {
                    field: path.to_string(),
                    reason: format!("{} must be finite", constraint),
                });
            }
            checks.push(check(bound));
        }
    }
    if let Some(step) = c.multiple_of {
        require(applies.numeric, "multiple_of")?;
        if !(step.is_finite() && step > 0.0) {
            return Err(CompileError::InvalidConstraint {
                field: path.to_string(),
                reason: format!("multiple_of must be a positive number, got {}", step),
            });
        }
        checks.push(Check::MultipleOf(step));
    }

    if let Some(n) = c.min_items {
        require(applies.items, "min_items")?;
        checks.push(Check::MinItems(n));
    }
    if let Some(n) = c.max_items {
        require(applies.items, "max_items")?;
        checks.push(Check::MaxItems(n));
    }
    if c.unique_items {
        require(applies.unique, "unique_items")?;
        checks.push(Check::UniqueItems);
    }

    if let Some(members) = &c.enum_values {
        require(applies.one_of, "enum")?;
        checks.push(Check::OneOf(compile_enum(path, field_type, members)?));
    }

    check_conflicts(path, c)?;

    Ok(ConstraintBag::new(checks))
}

fn check_conflicts(path: &str, c: &Constraints) -> CompileResult<()> {
    let conflict = |reason: String| {
        Err(CompileError::ConflictingConstraints {
            field: path.to_string(),
            reason,
        })
    };

    if let (Some(min), Some(max)) = (c.min_length, c.max_length) {
        if min > max {
            return conflict(format!("min_length {} > max_length {}", min, max));
        }
    }
    if let (Some(min), Some(max)) = (c.min_items, c.max_items) {
        if min > max {
            return conflict(format!("min_items {} > max_items {}", min, max));
        }
    }
    if let (Some(ge), Some(le)) = (c.ge, c.le) {
        if ge > le {
            return conflict(format!("ge {} > le {}", ge, le));
        }
    }
    let exclusive = [("gt", c.gt, "lt", c.lt), ("ge", c.ge, "lt", c.lt), ("gt", c.gt, "le", c.le)];
    for (low_name, low, high_name, high) in exclusive {
        if let (Some(low), Some(high)) = (low, high) {
            if low >= high {
                return conflict(format!("{} {} >= {} {}", low_name, low, high_name, high));
            }
        }
    }
    Ok(())
}

fn compile_enum(
    path: &str,
    field_type: &CompiledType,
    members: &[Value],
) -> CompileResult<HashSet<FieldValue>> {
    if members.is_empty() {
        return Err(CompileError::InvalidConstraint {
            field: path.to_string(),
            reason: "enum must list at least one value".into(),
        });
    }

    members
        .iter()
        .map(|member| {
            from_host(&HostValue::from(member.clone()), field_type, path).map_err(|e| {
                CompileError::InvalidConstraint {
                    field: path.to_string(),
                    reason: format!("enum member {} is not valid: {}", member, e.message),
                }
            })
        })
        .collect()
}

fn compile_default(
    path: &str,
    field_type: &CompiledType,
    constraints: &ConstraintBag,
    value: &Value,
) -> CompileResult<FieldValue> {
    let invalid = |reason: String| CompileError::InvalidDefault {
        field: path.to_string(),
        reason,
    };

    let coerced =
        from_host(&HostValue::from(value.clone()), field_type, path).map_err(|e| invalid(e.message))?;
    constraints.check(&coerced).map_err(invalid)?;
    Ok(coerced)
}
