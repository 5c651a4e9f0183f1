//! Batch Invariant Tests
//!
//! - One result per input item, in input order
//! - Sequential and parallel execution agree item by item
//! - One item's failure never affects another

use std::sync::Arc;

use proptest::prelude::*;
use satya::schema::{compile, CompiledSchema, Constraints, FieldDecl, FieldType, SchemaDecl};
use satya::{validate_batch, BatchConfig, BatchValidator, Engine, FieldValue, HostValue};

// =============================================================================
// Helper Functions
// =============================================================================

fn schema() -> Arc<CompiledSchema> {
    compile(&SchemaDecl::new(
        "Event",
        vec![
            FieldDecl::required("seq", FieldType::Int),
            FieldDecl::required("label", FieldType::String)
                .with_constraints(Constraints::new().min_length(1).max_length(8)),
            FieldDecl::optional("score", FieldType::Float)
                .with_constraints(Constraints::new().ge(0.0)),
        ],
    ))
    .unwrap()
}

fn item(seq: usize, label: &str, score: f64) -> HostValue {
    HostValue::map([
        ("seq", HostValue::Int(seq as i64)),
        ("label", HostValue::from(label)),
        ("score", HostValue::Float(score)),
    ])
}

fn parallel(micro_batch_size: usize) -> BatchConfig {
    BatchConfig {
        parallel_threshold: 1,
        micro_batch_size,
        ..BatchConfig::default()
    }
}

// =============================================================================
// Order & Completeness
// =============================================================================

/// Result i carries the sequence number of input i.
#[test]
fn test_results_follow_input_order() {
    let items: Vec<HostValue> = (0..5000).map(|i| item(i, "ok", 1.0)).collect();
    let results = validate_batch(&schema(), &items, &BatchConfig::default());

    assert_eq!(results.len(), items.len());
    for (i, result) in results.iter().enumerate() {
        let instance = result.as_ref().unwrap();
        assert_eq!(instance.get_value("seq"), Some(&FieldValue::Int(i as i64)));
    }
}

/// A batch just below the threshold and one at it produce the same results.
#[test]
fn test_threshold_boundary() {
    let config = BatchConfig {
        parallel_threshold: 100,
        micro_batch_size: 9,
        ..BatchConfig::default()
    };
    let items: Vec<HostValue> = (0..100)
        .map(|i| item(i, if i % 5 == 0 { "" } else { "x" }, 0.5))
        .collect();

    assert!(!config.is_parallel(99));
    assert!(config.is_parallel(100));

    let below = validate_batch(&schema(), &items[..99], &config);
    let at = validate_batch(&schema(), &items, &config);
    assert_eq!(below[..], at[..99]);
}

/// Failures stay with their own item.
#[test]
fn test_failures_are_isolated() {
    let mut items: Vec<HostValue> = (0..64).map(|i| item(i, "ok", 1.0)).collect();
    items[10] = item(10, "way too long label", 1.0);
    items[40] = HostValue::from("not a record");

    let flags = BatchValidator::with_config(schema(), parallel(4)).validate_bools(&items);
    for (i, ok) in flags.iter().enumerate() {
        assert_eq!(*ok, i != 10 && i != 40, "item {}", i);
    }
}

/// The engine applies per-call batch sizes.
#[test]
fn test_engine_batch_overrides() {
    let engine = Engine::default();
    let handle = engine.compile(&SchemaDecl::new("Event", vec![FieldDecl::required("seq", FieldType::Int)])).unwrap();
    let items: Vec<HostValue> = (0..50).map(|i| HostValue::map([("seq", i as i64)])).collect();

    let outcomes = engine.validate_batch(&handle, &items, Some(10), Some(3));
    assert_eq!(outcomes.len(), 50);
    assert!(outcomes.iter().all(|o| o.is_valid()));
    assert_eq!(engine.metrics().batches_parallel, 1);

    engine.validate_batch(&handle, &items, None, None);
    assert_eq!(engine.metrics().batches_sequential, 1);
}

// =============================================================================
// Properties
// =============================================================================

fn arb_item() -> impl Strategy<Value = (String, f64)> {
    ("[a-z]{0,10}", -5.0f64..5.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_batch_complete_and_ordered(entries in prop::collection::vec(arb_item(), 0..300), chunk in 1usize..40) {
        let items: Vec<HostValue> = entries
            .iter()
            .enumerate()
            .map(|(i, (label, score))| item(i, label, *score))
            .collect();

        let results = validate_batch(&schema(), &items, &parallel(chunk));
        prop_assert_eq!(results.len(), items.len());
        for (i, result) in results.iter().enumerate() {
            if let Ok(instance) = result {
                prop_assert_eq!(instance.get_value("seq"), Some(&FieldValue::Int(i as i64)));
            }
        }
    }

    #[test]
    fn prop_sequential_parallel_equivalence(entries in prop::collection::vec(arb_item(), 0..200), chunk in 1usize..25) {
        let items: Vec<HostValue> = entries
            .iter()
            .enumerate()
            .map(|(i, (label, score))| item(i, label, *score))
            .collect();

        let sequential = validate_batch(&schema(), &items, &BatchConfig::default());
        let split = validate_batch(&schema(), &items, &parallel(chunk));
        prop_assert_eq!(sequential, split);
    }
}
