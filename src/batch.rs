//! Batch validation
//!
//! Small batches run on the calling thread. Batches at or above the
//! parallel threshold are cut into fixed-size chunks that scoped worker
//! threads claim from a shared cursor. Each chunk's results land in the
//! slot for that chunk, so concatenating the slots restores input order
//! regardless of which worker finished first.
//!
//! Validation of one item never depends on another; a rejected item only
//! affects its own result.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use crate::instance::ModelInstance;
use crate::observability::Event;
use crate::schema::CompiledSchema;
use crate::validation::{validate_record, ValidationError, ValidationOptions};
use crate::value::HostValue;

/// Batches with fewer items than this run sequentially.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1000;

/// Items per chunk handed to a worker.
pub const DEFAULT_MICRO_BATCH_SIZE: usize = 512;

/// Outcome for one batch item.
pub type RecordResult = Result<ModelInstance, Vec<ValidationError>>;

/// Batch tuning and per-record options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub parallel_threshold: usize,
    pub micro_batch_size: usize,
    /// Upper bound on worker threads; 0 uses the available parallelism.
    pub max_workers: usize,
    pub options: ValidationOptions,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            micro_batch_size: DEFAULT_MICRO_BATCH_SIZE,
            max_workers: 0,
            options: ValidationOptions::default(),
        }
    }
}

impl BatchConfig {
    /// Returns true if a batch of `len` items is split across workers.
    pub fn is_parallel(&self, len: usize) -> bool {
        len >= self.parallel_threshold.max(1)
    }

    fn workers_for(&self, chunks: usize) -> usize {
        let available = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let limit = if self.max_workers == 0 {
            available
        } else {
            self.max_workers
        };
        limit.min(chunks).max(1)
    }
}

/// Validates every item, returning one result per item in input order.
pub fn validate_batch(
    schema: &Arc<CompiledSchema>,
    items: &[HostValue],
    config: &BatchConfig,
) -> Vec<RecordResult> {
    if !config.is_parallel(items.len()) {
        tracing::debug!(
            event = %Event::BatchSequential,
            schema = schema.name(),
            items = items.len()
        );
        return items
            .iter()
            .map(|item| validate_record(schema, item, &config.options))
            .collect();
    }

    let chunk_size = config.micro_batch_size.max(1);
    let chunks: Vec<&[HostValue]> = items.chunks(chunk_size).collect();
    let workers = config.workers_for(chunks.len());

    tracing::debug!(
        event = %Event::BatchParallel,
        schema = schema.name(),
        items = items.len(),
        chunks = chunks.len(),
        workers
    );

    let slots: Vec<Mutex<Vec<RecordResult>>> = chunks.iter().map(|_| Mutex::new(Vec::new())).collect();
    let cursor = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let index = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(chunk) = chunks.get(index) else {
                    break;
                };
                let results: Vec<RecordResult> = chunk
                    .iter()
                    .map(|item| validate_record(schema, item, &config.options))
                    .collect();
                *slots[index].lock().unwrap_or_else(PoisonError::into_inner) = results;
            });
        }
    });

    slots
        .into_iter()
        .flat_map(|slot| slot.into_inner().unwrap_or_else(PoisonError::into_inner))
        .collect()
}

/// A schema bound to batch settings.
///
/// `batch_size` is the parallel threshold: the knob an external tuner
/// adjusts between runs.
#[derive(Debug, Clone)]
pub struct BatchValidator {
    schema: Arc<CompiledSchema>,
    config: BatchConfig,
}

impl BatchValidator {
    pub fn new(schema: Arc<CompiledSchema>) -> Self {
        Self::with_config(schema, BatchConfig::default())
    }

    pub fn with_config(schema: Arc<CompiledSchema>, config: BatchConfig) -> Self {
        Self { schema, config }
    }

    pub fn schema(&self) -> &Arc<CompiledSchema> {
        &self.schema
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn batch_size(&self) -> usize {
        self.config.parallel_threshold
    }

    pub fn set_batch_size(&mut self, size: usize) {
        self.config.parallel_threshold = size.max(1);
    }

    pub fn micro_batch_size(&self) -> usize {
        self.config.micro_batch_size
    }

    pub fn set_micro_batch_size(&mut self, size: usize) {
        self.config.micro_batch_size = size.max(1);
    }

    pub fn validate(&self, items: &[HostValue]) -> Vec<RecordResult> {
        validate_batch(&self.schema, items, &self.config)
    }

    /// Per-item success flags, in input order.
    pub fn validate_bools(&self, items: &[HostValue]) -> Vec<bool> {
        self.validate(items).iter().map(Result::is_ok).collect()
    }
}
