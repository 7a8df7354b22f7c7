//! # Schema normalization of catalog batches
//!
//! Coerces a freshly fetched [`RawCatalog`] into [`CatalogRecord`]s following the fixed
//! [`CATALOG_FIELDS`] table. Each [`FieldKind`] owns exactly one cast function, so the outcome
//! never depends on what the first row of a batch happens to contain.
//!
//! ## Rules
//! -----------------
//! * A value already in canonical form is returned unchanged, which makes normalization
//!   idempotent: normalizing the serialized form of a [`CatalogRecord`] yields the same record.
//! * A field absent from a row is treated as `null` and then follows the null policy of its kind.
//! * Any failed cast aborts the whole batch with [`XmatchError::Normalization`] naming the field.
//!   No partial catalog is ever returned.
//!
//! ## See also
//! ------------
//! * [`crate::catalog_record`] – Field table and null policy per kind.
//! * [`crate::sources::CatalogSource`] – Runs the normalizer once per fresh catalog fetch.
use serde_json::{Map, Number, Value};

use crate::{
    catalog_record::{CatalogRecord, FieldKind, RawCatalog, RawRow, CATALOG_FIELDS},
    constants::NONE_SENTINEL,
    xmatch_errors::XmatchError,
};

static NULL: Value = Value::Null;

impl FieldKind {
    /// Cast one upstream value into the canonical JSON form of this kind.
    ///
    /// Arguments
    /// -----------------
    /// * `value`: the raw value, `None` when the field is absent from the row.
    ///
    /// Return
    /// ----------
    /// * `Float` → a JSON number, or `null` for a missing/NaN value.
    /// * `Int` → a JSON integer.
    /// * `Bool` → a JSON boolean.
    /// * text kinds → a JSON string, or `null` for nullable kinds.
    /// * `Err(reason)` if the value cannot be represented by this kind.
    pub fn cast(self, value: Option<&Value>) -> Result<Value, String> {
        let value = value.unwrap_or(&NULL);
        match self {
            FieldKind::Float => cast_float(value),
            FieldKind::Int => cast_int(value),
            FieldKind::Bool => cast_bool(value),
            FieldKind::Text => match cast_text(value, false)? {
                Value::Null => Err("missing value for a required text field".into()),
                text => Ok(text),
            },
            FieldKind::NullableText => cast_text(value, false),
            FieldKind::Flexible => cast_text(value, true),
        }
    }
}

fn is_null_like(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s == NONE_SENTINEL
}

fn float_value(x: f64) -> Value {
    Number::from_f64(x).map_or(Value::Null, Value::Number)
}

fn cast_float(value: &Value) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Number(n) => n
            .as_f64()
            .map(float_value)
            .ok_or_else(|| format!("number {n} is not representable as f64")),
        Value::String(s) if is_null_like(s) => Ok(Value::Null),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(float_value)
            .map_err(|_| format!("{s:?} is not a floating point number")),
        other => Err(format!("{other} is not a floating point number")),
    }
}

fn integral(x: f64) -> Option<i64> {
    (x.is_finite() && x.fract() == 0.0 && x.abs() < i64::MAX as f64).then_some(x as i64)
}

fn cast_int(value: &Value) -> Result<Value, String> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        Value::Null => return Err("missing value for an integer field".into()),
        _ => None,
    };
    parsed
        .map(|n| Value::Number(n.into()))
        .ok_or_else(|| format!("{value} is not an integer"))
}

fn cast_bool(value: &Value) -> Result<Value, String> {
    let flag = match value {
        Value::Null => Some(false),
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 0.0 => Some(false),
            Some(x) if x == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "true" | "True" | "TRUE" | "1" => Some(true),
            "false" | "False" | "FALSE" | "0" | "" | NONE_SENTINEL => Some(false),
            _ => None,
        },
        _ => None,
    };
    flag.map(Value::Bool)
        .ok_or_else(|| format!("{value} is not a boolean"))
}

fn cast_text(value: &Value, flexible: bool) -> Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) if is_null_like(s) => Ok(Value::Null),
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) if flexible => Ok(Value::String(b.to_string())),
        other if flexible => Ok(Value::String(other.to_string())),
        other => Err(format!("{other} is not text")),
    }
}

/// Normalize a single raw row into a [`CatalogRecord`].
///
/// Arguments
/// -----------------
/// * `row`: the raw upstream row.
///
/// Return
/// ----------
/// * The typed record, or [`XmatchError::Normalization`] naming the first field that fails.
pub fn normalize_row(row: &RawRow) -> Result<CatalogRecord, XmatchError> {
    let mut canonical = Map::with_capacity(CATALOG_FIELDS.len());
    for (field, kind) in CATALOG_FIELDS {
        let value = kind
            .cast(row.get(*field))
            .map_err(|reason| XmatchError::normalization(field, reason))?;
        canonical.insert((*field).to_string(), value);
    }

    serde_json::from_value(Value::Object(canonical))
        .map_err(|e| XmatchError::normalization("<record>", e.to_string()))
}

/// Normalize a whole catalog batch.
///
/// The batch either normalizes fully or not at all; the error reports the offending field and
/// the index of the row it was found in.
///
/// Arguments
/// -----------------
/// * `raw`: the catalog rows as decoded from the upstream service.
///
/// Return
/// ----------
/// * The typed catalog in upstream order.
pub fn normalize_catalog(raw: RawCatalog) -> Result<Vec<CatalogRecord>, XmatchError> {
    raw.iter()
        .enumerate()
        .map(|(idx, row)| {
            normalize_row(row).map_err(|err| match err {
                XmatchError::Normalization { field, reason } => XmatchError::Normalization {
                    field,
                    reason: format!("row {idx}: {reason}"),
                },
                other => other,
            })
        })
        .collect()
}
