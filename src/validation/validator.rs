//! Field and record validation
//!
//! One linear pass over the schema's fields in declaration order:
//! presence, then coercion, then constraint checks. A field contributes at
//! most one error. Nothing is returned for a record until every field has
//! passed, so callers never see a partially populated instance.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;
use super::make_path;
use crate::instance::ModelInstance;
use crate::schema::{CompiledField, CompiledSchema};
use crate::value::{from_host, FieldValue, HostValue};

/// Path reported when the record itself is not a mapping.
pub const ROOT_PATH: &str = "$root";

/// How many failing fields a record pass reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Report every failing field.
    #[default]
    Accumulate,
    /// Stop at the first failing field.
    FailFast,
}

/// Per-call validation behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationOptions {
    /// Reject keys the schema does not declare.
    pub strict: bool,
    pub error_policy: ErrorPolicy,
}

impl ValidationOptions {
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn fail_fast(mut self) -> Self {
        self.error_policy = ErrorPolicy::FailFast;
        self
    }
}

/// Validates one top-level field value.
///
/// `raw` is `None` when the key is absent from the record.
pub fn validate_field(field: &CompiledField, raw: Option<&HostValue>) -> Result<FieldValue, ValidationError> {
    validate_field_at(field, raw, field.name())
}

fn validate_field_at(
    field: &CompiledField,
    raw: Option<&HostValue>,
    path: &str,
) -> Result<FieldValue, ValidationError> {
    let raw = match raw {
        Some(raw) if !raw.is_none() => raw,
        _ => {
            return match (field.default(), field.is_required()) {
                (Some(default), _) => Ok(default.clone()),
                (None, true) => Err(ValidationError::missing_field(path)),
                (None, false) => Ok(FieldValue::None),
            };
        }
    };

    let value = from_host(raw, field.field_type(), path)?;
    field
        .constraints()
        .check(&value)
        .map_err(|message| ValidationError::constraint(path, message))?;
    Ok(value)
}

/// Validates a whole record against `schema`.
pub fn validate_record(
    schema: &Arc<CompiledSchema>,
    raw: &HostValue,
    options: &ValidationOptions,
) -> Result<ModelInstance, Vec<ValidationError>> {
    let entries = match raw.as_map() {
        Some(entries) => entries,
        None => {
            return Err(vec![ValidationError::type_mismatch(
                ROOT_PATH,
                "object",
                raw.type_name(),
            )]);
        }
    };

    // Later duplicates overwrite earlier ones.
    let lookup: HashMap<&str, &HostValue> = entries.iter().map(|(k, v)| (k.as_str(), v)).collect();

    let mut values = Vec::with_capacity(schema.len());
    let mut errors = Vec::new();

    for field in schema.fields() {
        match validate_field(field, lookup.get(field.name()).copied()) {
            Ok(value) => values.push(value),
            Err(err) => {
                errors.push(err);
                if options.error_policy == ErrorPolicy::FailFast {
                    return Err(errors);
                }
            }
        }
    }

    if options.strict {
        let mut reported = HashSet::new();
        for (key, _) in entries {
            if schema.index_of(key).is_none() && reported.insert(key.as_str()) {
                errors.push(ValidationError::extra_field(key.as_str()));
                if options.error_policy == ErrorPolicy::FailFast {
                    return Err(errors);
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(ModelInstance::from_parts(Arc::clone(schema), values))
    } else {
        Err(errors)
    }
}

/// Validates a nested record value, reporting the first failing field.
pub(crate) fn validate_nested(
    schema: &CompiledSchema,
    raw: &HostValue,
    path: &str,
) -> Result<FieldValue, ValidationError> {
    let mut entries = Vec::with_capacity(schema.len());
    for field in schema.fields() {
        let field_path = make_path(path, field.name());
        let value = validate_field_at(field, raw.get(field.name()), &field_path)?;
        entries.push((field.name().to_string(), value));
    }
    Ok(FieldValue::Map(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{compile, Constraints, FieldDecl, FieldType, SchemaDecl};
    use crate::validation::ErrorKind;
    use serde_json::json;

    fn user_schema() -> Arc<CompiledSchema> {
        compile(&SchemaDecl::new(
            "User",
            vec![
                FieldDecl::required("id", FieldType::Int),
                FieldDecl::required("name", FieldType::String)
                    .with_constraints(Constraints::new().min_length(2)),
                FieldDecl::required("email", FieldType::String)
                    .with_constraints(Constraints::new().email()),
                FieldDecl::optional("age", FieldType::Int)
                    .with_constraints(Constraints::new().ge(0.0).le(150.0)),
            ],
        ))
        .unwrap()
    }

    fn host(value: serde_json::Value) -> HostValue {
        HostValue::from(value)
    }

    #[test]
    fn test_valid_record() {
        let schema = user_schema();
        let instance = validate_record(
            &schema,
            &host(json!({"id": "7", "name": "Al", "email": "al@example.com"})),
            &ValidationOptions::default(),
        )
        .unwrap();
        assert_eq!(instance.get_value("id"), Some(&FieldValue::Int(7)));
        assert_eq!(instance.get_value("age"), Some(&FieldValue::None));
    }

    #[test]
    fn test_errors_accumulate_in_field_order() {
        let schema = user_schema();
        let errors = validate_record(
            &schema,
            &host(json!({"name": "A", "email": "nope", "age": 151})),
            &ValidationOptions::default(),
        )
        .unwrap_err();

        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["id", "name", "email", "age"]);
        assert_eq!(errors[0].kind, ErrorKind::RequiredFieldMissing);
        assert_eq!(errors[1].message, "String length must be >= 2");
        assert_eq!(errors[2].message, "Invalid email format");
        assert_eq!(errors[3].message, "Value must be <= 150");
    }

    #[test]
    fn test_fail_fast_stops_at_first_field() {
        let schema = user_schema();
        let errors = validate_record(
            &schema,
            &host(json!({"name": "A", "email": "nope"})),
            &ValidationOptions::default().fail_fast(),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "id");
    }

    #[test]
    fn test_unknown_keys_ignored_unless_strict() {
        let schema = user_schema();
        let raw = host(json!({"id": 1, "name": "Al", "email": "al@example.com", "extra": true}));
        assert!(validate_record(&schema, &raw, &ValidationOptions::default()).is_ok());

        let errors = validate_record(&schema, &raw, &ValidationOptions::default().strict()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "extra");
        assert_eq!(errors[0].kind, ErrorKind::ConstraintError);
    }

    #[test]
    fn test_non_map_record_is_root_type_error() {
        let schema = user_schema();
        let errors = validate_record(&schema, &host(json!([1, 2])), &ValidationOptions::default())
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, ROOT_PATH);
        assert_eq!(errors[0].kind, ErrorKind::TypeError);
    }

    #[test]
    fn test_explicit_null_counts_as_absent() {
        let schema = user_schema();
        let errors = validate_record(
            &schema,
            &host(json!({"id": null, "name": "Al", "email": "al@example.com"})),
            &ValidationOptions::default(),
        )
        .unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::RequiredFieldMissing);
    }

    #[test]
    fn test_nested_error_path() {
        let schema = compile(&SchemaDecl::new(
            "Person",
            vec![FieldDecl::required(
                "address",
                FieldType::object(vec![
                    FieldDecl::required("street", FieldType::String),
                    FieldDecl::required("city", FieldType::String)
                        .with_constraints(Constraints::new().min_length(2)),
                ]),
            )],
        ))
        .unwrap();

        let errors = validate_record(
            &schema,
            &host(json!({"address": {"street": "Main", "city": "X"}})),
            &ValidationOptions::default(),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "address.city");

        let instance = validate_record(
            &schema,
            &host(json!({"address": {"city": "Pune", "street": "Main"}})),
            &ValidationOptions::default(),
        )
        .unwrap();
        let address = instance.get_value("address").unwrap();
        let keys: Vec<&str> = address.as_map().unwrap().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["street", "city"]);
    }

    #[test]
    fn test_validate_field_default() {
        let schema = compile(&SchemaDecl::new(
            "S",
            vec![FieldDecl::optional("name", FieldType::String).with_default(json!("John Doe"))],
        ))
        .unwrap();
        let value = validate_field(&schema.fields()[0], None).unwrap();
        assert_eq!(value, FieldValue::String("John Doe".into()));
    }
}
