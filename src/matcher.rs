//! # Observatory matching
//!
//! Decides whether an object's observation batch contains at least one observation made from a
//! target observatory. The upstream service is inconsistent about the shape of what it returns,
//! so matching happens in two steps:
//!
//! 1. [`classify`] compares every entry's observatory code (in its string form) against the
//!    target and reports the result as a [`ComparisonShape`]:
//!    * `Scalar(bool)` – the batch is a single entry object, or already a boolean;
//!    * `Sequence(Vec<bool>)` – the batch is an array, one boolean per entry;
//!    * `Unrecognized` – anything else (`null`, a bare string or number, nested arrays...).
//! 2. [`matches`] turns that shape into a [`MatchOutcome`]. This step never fails: an
//!    unrecognized shape becomes [`MatchOutcome::Skipped`].
//!
//! ## Entry rules
//! -----------------
//! | Array item / scalar            | Comparison |
//! |--------------------------------|------------|
//! | object with `observatory`      | string form of the code `== target` |
//! | object without `observatory`   | `false` |
//! | boolean                        | the boolean itself |
//! | bare string or number (in array) | string form `== target` |
//! | `null` (in array)              | `false` |
//! | nested array                   | whole batch is `Unrecognized` |
use std::fmt;

use serde_json::{Map, Value};

use crate::observation::{ObservationBatch, OBSERVATORY_FIELD};

/// Shape of the per-entry comparison result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonShape {
    Scalar(bool),
    Sequence(Vec<bool>),
    Unrecognized { found: &'static str },
}

/// Why an object was left out without being classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The catalog record has no permanent number, its observations cannot be requested.
    NoUsableNumber,
    /// The observation batch is neither a boolean nor a collection of comparable entries.
    UnrecognizedShape { found: &'static str },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoUsableNumber => write!(f, "no usable object number"),
            SkipReason::UnrecognizedShape { found } => write!(
                f,
                "unrecognized observation shape: expected list or bool, got {found}"
            ),
        }
    }
}

/// Final decision for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Included,
    Excluded,
    Skipped(SkipReason),
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// String form of a scalar code, `None` for anything that is not a code.
fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn entry_matches(entry: &Map<String, Value>, target: &str) -> bool {
    entry
        .get(OBSERVATORY_FIELD)
        .and_then(code_text)
        .is_some_and(|code| code == target)
}

fn item_matches(item: &Value, target: &str) -> Option<bool> {
    match item {
        Value::Object(entry) => Some(entry_matches(entry, target)),
        Value::Bool(b) => Some(*b),
        Value::String(_) | Value::Number(_) => code_text(item).map(|code| code == target),
        Value::Null => Some(false),
        Value::Array(_) => None,
    }
}

/// Compare every observation of `batch` with the `target` observatory code.
pub fn classify(batch: &ObservationBatch, target: &str) -> ComparisonShape {
    let target = target.trim();
    match batch {
        Value::Bool(b) => ComparisonShape::Scalar(*b),
        Value::Object(entry) => ComparisonShape::Scalar(entry_matches(entry, target)),
        Value::Array(items) => items
            .iter()
            .map(|item| item_matches(item, target))
            .collect::<Option<Vec<bool>>>()
            .map_or(ComparisonShape::Unrecognized { found: "nested array" }, |flags| {
                ComparisonShape::Sequence(flags)
            }),
        other => ComparisonShape::Unrecognized {
            found: value_kind(other),
        },
    }
}

/// Decide whether `batch` holds at least one observation from `target`.
///
/// Arguments
/// -----------------
/// * `batch`: the raw observation batch of one object.
/// * `target`: MPC observatory code, e.g. `"C51"`.
///
/// Return
/// ----------
/// * [`MatchOutcome::Included`] / [`MatchOutcome::Excluded`] for a recognized shape.
/// * [`MatchOutcome::Skipped`] with [`SkipReason::UnrecognizedShape`] otherwise.
pub fn matches(batch: &ObservationBatch, target: &str) -> MatchOutcome {
    let decide = |hit: bool| {
        if hit {
            MatchOutcome::Included
        } else {
            MatchOutcome::Excluded
        }
    };

    match classify(batch, target) {
        ComparisonShape::Scalar(hit) => decide(hit),
        ComparisonShape::Sequence(flags) => decide(flags.into_iter().any(|hit| hit)),
        ComparisonShape::Unrecognized { found } => {
            MatchOutcome::Skipped(SkipReason::UnrecognizedShape { found })
        }
    }
}
