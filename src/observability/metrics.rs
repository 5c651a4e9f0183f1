//! Engine metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe but lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one engine
///
/// All counters use Relaxed ordering; batch workers bump them concurrently
/// and readers only need eventually consistent totals.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Declarations compiled successfully
    schemas_compiled: AtomicU64,
    /// Records that passed validation
    records_validated: AtomicU64,
    /// Records that failed validation
    records_rejected: AtomicU64,
    /// Batches run on the calling thread
    batches_sequential: AtomicU64,
    /// Batches split across workers
    batches_parallel: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_schemas_compiled(&self) {
        self.schemas_compiled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records_validated(&self) {
        self.records_validated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records_rejected(&self) {
        self.records_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds the outcome counts of one batch.
    pub fn add_batch_outcomes(&self, validated: u64, rejected: u64) {
        self.records_validated.fetch_add(validated, Ordering::Relaxed);
        self.records_rejected.fetch_add(rejected, Ordering::Relaxed);
    }

    pub fn increment_batches(&self, parallel: bool) {
        let counter = if parallel {
            &self.batches_parallel
        } else {
            &self.batches_sequential
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of all metrics as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            schemas_compiled: self.schemas_compiled.load(Ordering::Relaxed),
            records_validated: self.records_validated.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
            batches_sequential: self.batches_sequential.load(Ordering::Relaxed),
            batches_parallel: self.batches_parallel.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub schemas_compiled: u64,
    pub records_validated: u64,
    pub records_rejected: u64,
    pub batches_sequential: u64,
    pub batches_parallel: u64,
}
