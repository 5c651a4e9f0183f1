//! satya - A strict, schema-compiling validation and coercion engine
//!
//! Schemas are compiled once into immutable, shareable form; records are
//! validated and coerced in a single pass into native instances, one at a
//! time or in order-preserving parallel batches.

pub mod batch;
pub mod config;
pub mod engine;
pub mod instance;
pub mod observability;
pub mod schema;
pub mod serialization;
pub mod validation;
pub mod value;

pub use batch::{validate_batch, BatchConfig, BatchValidator, RecordResult};
pub use config::{ConfigError, ConfigResult, EngineConfig};
pub use engine::{Engine, SchemaHandle, ValidationOutcome};
pub use instance::ModelInstance;
pub use schema::{
    compile, CompileError, CompileResult, CompiledSchema, Constraints, FieldDecl, FieldType,
    SchemaDecl, SchemaRegistry,
};
pub use validation::{
    validate_record, ErrorKind, ErrorPolicy, ValidationError, ValidationOptions,
};
pub use value::{FieldValue, HostValue};
