//! Engine facade for host bindings
//!
//! Bindings talk to one `Engine`: compile declarations into handles, then
//! validate single records or batches against a handle. Outcomes carry the
//! validated instance or the full error list and serialise to the wire
//! shape `{"success": true, "data": {...}}` /
//! `{"success": false, "errors": [...]}`.

use std::sync::{Arc, PoisonError, RwLock};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::batch::{validate_batch, BatchConfig, RecordResult};
use crate::config::EngineConfig;
use crate::instance::ModelInstance;
use crate::observability::{Event, MetricsRegistry, MetricsSnapshot};
use crate::schema::{compile, CompileResult, CompiledSchema, SchemaDecl, SchemaRegistry};
use crate::serialization;
use crate::validation::{validate_record, ValidationError, ValidationOptions};
use crate::value::HostValue;

/// Opaque reference to a compiled schema.
#[derive(Debug, Clone)]
pub struct SchemaHandle(Arc<CompiledSchema>);

impl SchemaHandle {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn schema(&self) -> &Arc<CompiledSchema> {
        &self.0
    }
}

impl From<Arc<CompiledSchema>> for SchemaHandle {
    fn from(schema: Arc<CompiledSchema>) -> Self {
        SchemaHandle(schema)
    }
}

/// Result of validating one record.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(ModelInstance),
    Invalid(Vec<ValidationError>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    pub fn instance(&self) -> Option<&ModelInstance> {
        match self {
            ValidationOutcome::Valid(instance) => Some(instance),
            ValidationOutcome::Invalid(_) => None,
        }
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ValidationOutcome::Valid(_) => &[],
            ValidationOutcome::Invalid(errors) => errors,
        }
    }

    pub fn into_result(self) -> RecordResult {
        match self {
            ValidationOutcome::Valid(instance) => Ok(instance),
            ValidationOutcome::Invalid(errors) => Err(errors),
        }
    }
}

impl From<RecordResult> for ValidationOutcome {
    fn from(result: RecordResult) -> Self {
        match result {
            Ok(instance) => ValidationOutcome::Valid(instance),
            Err(errors) => ValidationOutcome::Invalid(errors),
        }
    }
}

impl Serialize for ValidationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            ValidationOutcome::Valid(instance) => {
                map.serialize_entry("success", &true)?;
                map.serialize_entry("data", instance)?;
            }
            ValidationOutcome::Invalid(errors) => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("errors", errors)?;
            }
        }
        map.end()
    }
}

/// Validation engine with its configuration, counters and named schemas.
#[derive(Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    metrics: MetricsRegistry,
    registry: RwLock<SchemaRegistry>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            metrics: MetricsRegistry::new(),
            registry: RwLock::new(SchemaRegistry::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Compiles a declaration without registering it.
    pub fn compile(&self, decl: &SchemaDecl) -> CompileResult<SchemaHandle> {
        let schema = compile(decl)?;
        self.metrics.increment_schemas_compiled();
        Ok(SchemaHandle(schema))
    }

    /// Compiles a JSON declaration.
    pub fn compile_json(&self, text: &str) -> CompileResult<SchemaHandle> {
        self.compile(&SchemaDecl::from_json(text)?)
    }

    /// Compiles and registers a declaration under its name, replacing any
    /// earlier definition.
    pub fn define(&self, decl: &SchemaDecl) -> CompileResult<SchemaHandle> {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let schema = registry.define(decl)?;
        self.metrics.increment_schemas_compiled();
        Ok(SchemaHandle(schema))
    }

    /// Looks up a registered schema.
    pub fn schema(&self, name: &str) -> Option<SchemaHandle> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(SchemaHandle)
    }

    pub fn schema_names(&self) -> Vec<String> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn options(&self) -> ValidationOptions {
        self.config.validation_options()
    }

    fn record(&self, schema: &CompiledSchema, result: RecordResult) -> ValidationOutcome {
        match &result {
            Ok(_) => self.metrics.increment_records_validated(),
            Err(errors) => {
                self.metrics.increment_records_rejected();
                tracing::debug!(
                    event = %Event::RecordRejected,
                    schema = schema.name(),
                    errors = errors.len()
                );
            }
        }
        result.into()
    }

    /// Validates a single raw record.
    pub fn validate_one(&self, handle: &SchemaHandle, raw: &HostValue) -> ValidationOutcome {
        let result = validate_record(&handle.0, raw, &self.options());
        self.record(&handle.0, result)
    }

    /// Validates a record given as JSON text.
    pub fn from_json(&self, handle: &SchemaHandle, text: &str) -> ValidationOutcome {
        let result = serialization::from_json(&handle.0, text, &self.options());
        self.record(&handle.0, result)
    }

    /// Validates many records; results are in input order.
    ///
    /// `batch_size` overrides the parallel threshold and `micro_batch_size`
    /// the chunk size for this call only.
    pub fn validate_batch(
        &self,
        handle: &SchemaHandle,
        records: &[HostValue],
        batch_size: Option<usize>,
        micro_batch_size: Option<usize>,
    ) -> Vec<ValidationOutcome> {
        let defaults = self.config.batch_config();
        let config = BatchConfig {
            parallel_threshold: batch_size.unwrap_or(defaults.parallel_threshold).max(1),
            micro_batch_size: micro_batch_size.unwrap_or(defaults.micro_batch_size).max(1),
            ..defaults
        };

        let results = validate_batch(&handle.0, records, &config);
        let validated = results.iter().filter(|r| r.is_ok()).count() as u64;
        self.metrics.increment_batches(config.is_parallel(records.len()));
        self.metrics
            .add_batch_outcomes(validated, results.len() as u64 - validated);

        results.into_iter().map(ValidationOutcome::from).collect()
    }
}
