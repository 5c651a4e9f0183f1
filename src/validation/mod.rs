//! Validator/coercer
//!
//! Turns raw host records into validated instances or a list of
//! `ValidationError`s. Errors are data; validation itself never fails.

mod errors;
mod validator;

pub use errors::{ErrorKind, ValidationError};
pub use validator::{
    validate_field, validate_record, ErrorPolicy, ValidationOptions, ROOT_PATH,
};

pub(crate) use validator::validate_nested;

/// Joins a parent path and a field name with a dot.
pub fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}
