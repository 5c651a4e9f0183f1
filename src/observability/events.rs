//! Engine events
//!
//! Events are explicit and typed. Each one is emitted through `tracing`
//! with its stable name in the `event` field.

use std::fmt;

/// Observable events in the validation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Engine configuration loaded from a file
    ConfigLoaded,

    // Schemas
    /// Declaration compiled
    SchemaCompiled,
    /// Declaration rejected by the compiler
    SchemaRejected,
    /// Schema registered under a name
    SchemaDefined,
    /// Registered schema replaced by a new definition
    SchemaRedefined,
    /// Schema removed from a registry
    SchemaRemoved,
    /// Declarations loaded from a file
    SchemasLoaded,

    // Validation
    /// Record failed validation
    RecordRejected,

    // Batches
    /// Batch validated on the calling thread
    BatchSequential,
    /// Batch split across worker threads
    BatchParallel,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::SchemaCompiled => "SCHEMA_COMPILED",
            Event::SchemaRejected => "SCHEMA_REJECTED",
            Event::SchemaDefined => "SCHEMA_DEFINED",
            Event::SchemaRedefined => "SCHEMA_REDEFINED",
            Event::SchemaRemoved => "SCHEMA_REMOVED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",

            Event::RecordRejected => "RECORD_REJECTED",

            Event::BatchSequential => "BATCH_SEQUENTIAL",
            Event::BatchParallel => "BATCH_PARALLEL",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
