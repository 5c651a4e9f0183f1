//! Compiled constraint checks
//!
//! A `ConstraintBag` is an ordered list of checks built once by the
//! compiler. Checks run cheapest first and evaluation stops at the first
//! failure, so regex matching only happens for values that already passed
//! every comparison.

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;

use super::patterns;
use crate::value::FieldValue;

/// One compiled rule.
#[derive(Debug, Clone)]
pub enum Check {
    MinLength(usize),
    MaxLength(usize),
    MinItems(usize),
    MaxItems(usize),
    Ge(f64),
    Le(f64),
    Gt(f64),
    Lt(f64),
    MultipleOf(f64),
    OneOf(HashSet<FieldValue>),
    UniqueItems,
    Email,
    Url,
    Pattern(Arc<Regex>),
}

impl Check {
    /// Relative evaluation cost; lower runs first.
    fn cost(&self) -> u8 {
        match self {
            Check::MinLength(_) | Check::MaxLength(_) | Check::MinItems(_) | Check::MaxItems(_) => 0,
            Check::Ge(_) | Check::Le(_) | Check::Gt(_) | Check::Lt(_) => 1,
            Check::MultipleOf(_) => 2,
            Check::OneOf(_) => 3,
            Check::UniqueItems => 4,
            Check::Email | Check::Url => 5,
            Check::Pattern(_) => 6,
        }
    }

    /// Evaluates the rule, returning the failure message.
    fn evaluate(&self, value: &FieldValue) -> Result<(), String> {
        match self {
            Check::MinLength(min) => {
                let len = text_len(value);
                if len < *min {
                    return Err(format!("String length must be >= {}", min));
                }
            }
            Check::MaxLength(max) => {
                let len = text_len(value);
                if len > *max {
                    return Err(format!("String length must be <= {}", max));
                }
            }
            Check::MinItems(min) => {
                if item_count(value) < *min {
                    return Err(format!("Must contain at least {} items", min));
                }
            }
            Check::MaxItems(max) => {
                if item_count(value) > *max {
                    return Err(format!("Must contain at most {} items", max));
                }
            }
            Check::Ge(bound) => {
                if !number(value).is_some_and(|n| n >= *bound) {
                    return Err(format!("Value must be >= {}", bound));
                }
            }
            Check::Le(bound) => {
                if !number(value).is_some_and(|n| n <= *bound) {
                    return Err(format!("Value must be <= {}", bound));
                }
            }
            Check::Gt(bound) => {
                if !number(value).is_some_and(|n| n > *bound) {
                    return Err(format!("Value must be > {}", bound));
                }
            }
            Check::Lt(bound) => {
                if !number(value).is_some_and(|n| n < *bound) {
                    return Err(format!("Value must be < {}", bound));
                }
            }
            Check::MultipleOf(step) => {
                if !is_multiple(value, *step) {
                    return Err(format!("Value must be a multiple of {}", step));
                }
            }
            Check::OneOf(allowed) => {
                if !allowed.contains(value) {
                    return Err(format!("Value must be one of {}", describe_set(allowed)));
                }
            }
            Check::UniqueItems => {
                if let Some(items) = value.as_list() {
                    let mut seen = HashSet::with_capacity(items.len());
                    if !items.iter().all(|item| seen.insert(item)) {
                        return Err("List items must be unique".to_string());
                    }
                }
            }
            Check::Email => {
                if !value.as_str().is_some_and(patterns::is_email) {
                    return Err("Invalid email format".to_string());
                }
            }
            Check::Url => {
                if !value.as_str().is_some_and(patterns::is_url) {
                    return Err("Invalid URL format".to_string());
                }
            }
            Check::Pattern(regex) => {
                if !value.as_str().is_some_and(|s| regex.is_match(s)) {
                    return Err(format!("String does not match pattern: {}", regex.as_str()));
                }
            }
        }
        Ok(())
    }
}

fn text_len(value: &FieldValue) -> usize {
    value.as_str().map_or(0, |s| s.chars().count())
}

fn item_count(value: &FieldValue) -> usize {
    match value {
        FieldValue::List(items) => items.len(),
        FieldValue::Map(entries) => entries.len(),
        _ => 0,
    }
}

fn number(value: &FieldValue) -> Option<f64> {
    value.numeric()
}

fn is_multiple(value: &FieldValue, step: f64) -> bool {
    match value {
        // Exact arithmetic when both sides are whole numbers.
        FieldValue::Int(i) if step.fract() == 0.0 && step.abs() < i64::MAX as f64 => {
            i % (step as i64) == 0
        }
        other => match other.numeric() {
            Some(n) => {
                let quotient = n / step;
                (quotient - quotient.round()).abs() < 1e-9
            }
            None => false,
        },
    }
}

fn describe_set(allowed: &HashSet<FieldValue>) -> String {
    let mut rendered: Vec<String> = allowed.iter().map(|v| v.to_json().to_string()).collect();
    rendered.sort();
    format!("[{}]", rendered.join(", "))
}

/// All checks compiled for one field, ordered by ascending cost.
#[derive(Debug, Clone, Default)]
pub struct ConstraintBag {
    checks: Vec<Check>,
}

impl ConstraintBag {
    pub fn new(mut checks: Vec<Check>) -> Self {
        checks.sort_by_key(Check::cost);
        Self { checks }
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Runs every check in order and returns the first failure message.
    ///
    /// `None` values are never checked; presence is decided before
    /// constraints run.
    pub fn check(&self, value: &FieldValue) -> Result<(), String> {
        if value.is_none() {
            return Ok(());
        }
        self.checks.iter().try_for_each(|check| check.evaluate(value))
    }
}
