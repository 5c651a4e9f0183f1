//! Validation error types
//!
//! Wire shape: `{ "field": <dotted path>, "message": <text>, "kind": <kind> }`
//! where kind is one of `TypeError`, `ConstraintError`,
//! `RequiredFieldMissing`.
//!
//! These errors are ordinary results. They are collected per record and
//! returned to the caller, never raised as faults.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Failure categories reported for invalid input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Raw value could not be coerced to the declared type
    TypeError,
    /// Coerced value failed a declared rule
    ConstraintError,
    /// Required field absent and no default declared
    RequiredFieldMissing,
}

impl ErrorKind {
    /// Returns the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ConstraintError => "ConstraintError",
            ErrorKind::RequiredFieldMissing => "RequiredFieldMissing",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field path (e.g., "user.address.city", "friends[2]")
    pub field: String,
    /// Human-readable description
    pub message: String,
    pub kind: ErrorKind,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind,
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("Required field {} is missing", field);
        Self::new(field, message, ErrorKind::RequiredFieldMissing)
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self::new(
            field,
            format!("Expected {}, got {}", expected, actual),
            ErrorKind::TypeError,
        )
    }

    pub fn constraint(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, ErrorKind::ConstraintError)
    }

    /// Undeclared key present in strict mode
    pub fn extra_field(field: impl Into<String>) -> Self {
        Self::constraint(field, "Extra field not permitted")
    }

    /// Write to a field name the schema does not declare
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::constraint(field, "Field is not declared by the schema")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] field '{}': {}", self.kind, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}
