//! Schema compilation errors
//!
//! A `CompileError` always aborts construction of the schema it belongs to.
//! It is raised synchronously by the compiler and never during validation.

use thiserror::Error;

/// Result type for schema compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// Reasons a schema declaration is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("Unknown type '{0}'")]
    UnknownType(String),

    #[error("Malformed schema declaration: {0}")]
    Malformed(String),

    #[error("Schema '{schema}' declares a field with an empty name")]
    EmptyFieldName { schema: String },

    #[error("Schema '{schema}' declares field '{field}' more than once")]
    DuplicateField { schema: String, field: String },

    #[error("Field '{field}': invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        field: String,
        pattern: String,
        reason: String,
    },

    #[error("Field '{field}': conflicting constraints: {reason}")]
    ConflictingConstraints { field: String, reason: String },

    #[error("Field '{field}': constraint '{constraint}' does not apply to type {type_name}")]
    InapplicableConstraint {
        field: String,
        constraint: &'static str,
        type_name: &'static str,
    },

    #[error("Field '{field}': invalid constraint: {reason}")]
    InvalidConstraint { field: String, reason: String },

    #[error("Field '{field}': invalid default: {reason}")]
    InvalidDefault { field: String, reason: String },

    #[error("Failed to read schema file '{path}': {reason}")]
    Unreadable { path: String, reason: String },
}

impl CompileError {
    /// Returns a stable code for the error category
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::UnknownType(_) => "SCHEMA_UNKNOWN_TYPE",
            CompileError::Malformed(_) => "SCHEMA_MALFORMED",
            CompileError::EmptyFieldName { .. } => "SCHEMA_EMPTY_FIELD_NAME",
            CompileError::DuplicateField { .. } => "SCHEMA_DUPLICATE_FIELD",
            CompileError::InvalidPattern { .. } => "SCHEMA_INVALID_PATTERN",
            CompileError::ConflictingConstraints { .. } => "SCHEMA_CONFLICTING_CONSTRAINTS",
            CompileError::InapplicableConstraint { .. } => "SCHEMA_INAPPLICABLE_CONSTRAINT",
            CompileError::InvalidConstraint { .. } => "SCHEMA_INVALID_CONSTRAINT",
            CompileError::InvalidDefault { .. } => "SCHEMA_INVALID_DEFAULT",
            CompileError::Unreadable { .. } => "SCHEMA_UNREADABLE",
        }
    }
}
