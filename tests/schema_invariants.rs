//! Schema Invariant Tests
//!
//! Tests for schema compilation and validation invariants:
//! - Validation is deterministic
//! - Required fields must be present unless a default exists
//! - Undeclared fields are ignored, or rejected in strict mode
//! - Every bad declaration is caught at compile time
//! - Registry redefinition and file loading

use std::fs;

use satya::schema::{compile, CompileError, Constraints, FieldDecl, FieldType, SchemaDecl, SchemaRegistry};
use satya::{validate_record, ErrorKind, ErrorPolicy, HostValue, ValidationOptions};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn users_decl() -> SchemaDecl {
    SchemaDecl::new(
        "users",
        vec![
            FieldDecl::required("_id", FieldType::String),
            FieldDecl::required("name", FieldType::String),
            FieldDecl::optional("age", FieldType::Int),
        ],
    )
}

fn setup_test_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.define(&users_decl()).unwrap();
    registry
}

fn host(value: serde_json::Value) -> HostValue {
    HostValue::from(value)
}

// =============================================================================
// Validation Determinism Tests
// =============================================================================

/// Same document validates the same way every time.
#[test]
fn test_validation_is_deterministic() {
    let registry = setup_test_registry();
    let schema = registry.get("users").unwrap();
    let doc = host(json!({"_id": "user1", "name": "Alice"}));

    let first = validate_record(&schema, &doc, &ValidationOptions::default()).unwrap();
    for _ in 0..100 {
        let again = validate_record(&schema, &doc, &ValidationOptions::default()).unwrap();
        assert_eq!(again, first);
    }
}

/// Invalid document fails with the same errors every time.
#[test]
fn test_invalid_document_fails_consistently() {
    let registry = setup_test_registry();
    let schema = registry.get("users").unwrap();
    let doc = host(json!({"_id": "user1"}));

    let first = validate_record(&schema, &doc, &ValidationOptions::default()).unwrap_err();
    for _ in 0..100 {
        let again = validate_record(&schema, &doc, &ValidationOptions::default()).unwrap_err();
        assert_eq!(again, first);
    }
}

/// Two compilations of one declaration behave identically.
#[test]
fn test_compilation_is_pure() {
    let a = compile(&users_decl()).unwrap();
    let b = compile(&users_decl()).unwrap();
    let doc = host(json!({"_id": 7, "name": "Bob", "age": "x"}));

    assert_eq!(
        validate_record(&a, &doc, &ValidationOptions::default()).unwrap_err(),
        validate_record(&b, &doc, &ValidationOptions::default()).unwrap_err()
    );
}

// =============================================================================
// Required Field Tests
// =============================================================================

/// Missing required field fails validation.
#[test]
fn test_missing_required_field() {
    let schema = compile(&users_decl()).unwrap();
    let errors = validate_record(&schema, &host(json!({"_id": "u"})), &ValidationOptions::default())
        .unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "name");
    assert_eq!(errors[0].kind, ErrorKind::RequiredFieldMissing);
}

/// A default satisfies a missing field.
#[test]
fn test_default_fills_missing_field() {
    let schema = compile(&SchemaDecl::new(
        "users",
        vec![FieldDecl::optional("role", FieldType::String).with_default(json!("member"))],
    ))
    .unwrap();
    let instance = validate_record(&schema, &host(json!({})), &ValidationOptions::default()).unwrap();
    assert_eq!(instance.get_field("role"), Some(HostValue::from("member")));
}

// =============================================================================
// Unknown Field Tests
// =============================================================================

/// Extra fields are ignored by default and rejected in strict mode.
#[test]
fn test_extra_field_policy() {
    let schema = compile(&users_decl()).unwrap();
    let doc = host(json!({"_id": "u", "name": "n", "nickname": "x", "zzz": 1}));

    let instance = validate_record(&schema, &doc, &ValidationOptions::default()).unwrap();
    assert_eq!(instance.values().len(), 3);

    let errors = validate_record(&schema, &doc, &ValidationOptions::default().strict()).unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["nickname", "zzz"]);
    assert!(errors.iter().all(|e| e.kind == ErrorKind::ConstraintError));
}

/// Fail-fast reports only the first failing field.
#[test]
fn test_fail_fast_policy() {
    let schema = compile(&users_decl()).unwrap();
    let options = ValidationOptions {
        strict: true,
        error_policy: ErrorPolicy::FailFast,
    };
    let errors = validate_record(&schema, &host(json!({"age": "old", "extra": 1})), &options).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "_id");
}

// =============================================================================
// Compile Error Tests
// =============================================================================

/// Each malformed declaration is rejected with its own error.
#[test]
fn test_compile_errors() {
    let cases: Vec<(FieldDecl, &str)> = vec![
        (
            FieldDecl::required("code", FieldType::String).with_constraints(Constraints::new().pattern("(")),
            "SCHEMA_INVALID_PATTERN",
        ),
        (
            FieldDecl::required("n", FieldType::Int).with_constraints(Constraints::new().ge(5.0).le(1.0)),
            "SCHEMA_CONFLICTING_CONSTRAINTS",
        ),
        (
            FieldDecl::required("items", FieldType::list(FieldType::Int))
                .with_constraints(Constraints::new().min_items(3).max_items(1)),
            "SCHEMA_CONFLICTING_CONSTRAINTS",
        ),
        (
            FieldDecl::required("flag", FieldType::Bool).with_constraints(Constraints::new().max_length(1)),
            "SCHEMA_INAPPLICABLE_CONSTRAINT",
        ),
        (
            FieldDecl::required("n", FieldType::Float).with_constraints(Constraints::new().multiple_of(-2.0)),
            "SCHEMA_INVALID_CONSTRAINT",
        ),
        (
            FieldDecl::optional("n", FieldType::Int).with_default(json!(1.5)),
            "SCHEMA_INVALID_DEFAULT",
        ),
        (FieldDecl::required("", FieldType::Int), "SCHEMA_EMPTY_FIELD_NAME"),
    ];

    for (field, code) in cases {
        let err = compile(&SchemaDecl::new("broken", vec![field])).unwrap_err();
        assert_eq!(err.code(), code, "{}", err);
    }
}

/// Unknown type tags are rejected when a declaration is parsed.
#[test]
fn test_unknown_type_tag() {
    let err = SchemaDecl::from_json(
        &json!({"name": "x", "fields": [{"name": "a", "type": "complex"}]}).to_string(),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Malformed(_)));

    assert!(matches!(
        FieldType::parse("Set[int]").unwrap_err(),
        CompileError::UnknownType(_)
    ));
}

// =============================================================================
// Registry Tests
// =============================================================================

/// Redefining a schema affects new validations only.
#[test]
fn test_redefinition_keeps_old_instances() {
    let mut registry = setup_test_registry();
    let old_schema = registry.get("users").unwrap();
    let old = validate_record(
        &old_schema,
        &host(json!({"_id": "u", "name": "n"})),
        &ValidationOptions::default(),
    )
    .unwrap();

    registry
        .define(&SchemaDecl::new("users", vec![FieldDecl::required("email", FieldType::String)]))
        .unwrap();

    assert_eq!(old.get_field("name"), Some(HostValue::from("n")));
    let errors = validate_record(
        &registry.get("users").unwrap(),
        &host(json!({"_id": "u", "name": "n"})),
        &ValidationOptions::default(),
    )
    .unwrap_err();
    assert_eq!(errors[0].field, "email");
}

/// Declarations load from disk.
#[test]
fn test_load_declarations_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("schemas.json");
    fs::write(
        &path,
        json!([
            {"name": "users", "fields": [{"name": "_id", "type": "uuid"}]},
            {"name": "posts", "fields": [{"name": "tags", "type": "list", "items": {"type": "str"}}]}
        ])
        .to_string(),
    )
    .unwrap();

    let mut registry = SchemaRegistry::new();
    let names = registry.load_file(&path).unwrap();
    assert_eq!(names, vec!["users", "posts"]);
    assert_eq!(registry.names(), vec!["posts", "users"]);

    let errors = validate_record(
        &registry.get("users").unwrap(),
        &host(json!({"_id": "not-a-uuid"})),
        &ValidationOptions::default(),
    )
    .unwrap_err();
    assert_eq!(errors[0].kind, ErrorKind::TypeError);
}
