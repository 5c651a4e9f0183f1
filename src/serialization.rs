//! JSON encode/decode for validated instances
//!
//! Encoding writes fields in declaration order; integers have no decimal
//! point and decimals are JSON strings. Decoding parses straight into the
//! host value tree and runs the ordinary record validator, so JSON input
//! obeys exactly the same rules as any other input.

use std::sync::Arc;

use serde_json::Value;

use crate::instance::ModelInstance;
use crate::schema::CompiledSchema;
use crate::validation::{validate_record, ValidationError, ValidationOptions, ROOT_PATH};
use crate::value::HostValue;

/// Compact JSON text.
pub fn to_json(instance: &ModelInstance) -> serde_json::Result<String> {
    serde_json::to_string(instance)
}

/// Indented JSON text.
pub fn to_json_pretty(instance: &ModelInstance) -> serde_json::Result<String> {
    serde_json::to_string_pretty(instance)
}

/// Parses `text` and validates it against `schema`.
///
/// Text that is not JSON yields a single `$root` type error; a non-object
/// root is reported the same way by the validator.
pub fn from_json(
    schema: &Arc<CompiledSchema>,
    text: &str,
    options: &ValidationOptions,
) -> Result<ModelInstance, Vec<ValidationError>> {
    let parsed: Value = serde_json::from_str(text).map_err(|e| {
        vec![ValidationError::type_mismatch(
            ROOT_PATH,
            "JSON object",
            format!("invalid JSON ({})", e),
        )]
    })?;
    validate_record(schema, &HostValue::from(parsed), options)
}
