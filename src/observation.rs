//! # Raw observation batches
//!
//! Observation batches are consumed **as returned** by the upstream service: no schema is
//! enforced on them and the matcher ([`crate::matcher`]) accepts any of their shapes. A batch is
//! therefore a plain [`serde_json::Value`] which, in practice, is one of:
//!
//! * an array of entry objects (the usual case, possibly empty),
//! * a single entry object when the object has exactly one observation,
//! * `null` when the service has no observations to give back,
//! * occasionally something else entirely.
//!
//! Each entry carries at least an `observatory` field (MPC code, usually a string but sometimes
//! a number such as `704`).
//!
//! ## MPC 80-column records
//! -----------------
//! [`observations_from_80col`] turns the MPC 80-column text export of an object into such a
//! batch. Field layout (0-based, end-exclusive):
//!
//! * `0..5` – packed permanent number
//! * `5..12` – packed provisional designation
//! * `13` / `14` – note 1 / note 2 (observation type)
//! * `15..32` – date of observation
//! * `32..44` – right ascension
//! * `44..56` – declination
//! * `65..70` / `70` – magnitude / band
//! * `77..80` – MPC observatory code
//!
//! Second lines of two-line records (note 2 `s`, `v` or `r`: satellite position, roving
//! observer) repeat the observatory code of the first line and are left out.
use serde_json::{Map, Value};
use tracing::debug;

/// A raw observation batch of one object.
pub type ObservationBatch = Value;

/// Name of the observatory code field of an observation entry.
pub const OBSERVATORY_FIELD: &str = "observatory";

fn column(line: &str, start: usize, end: usize) -> Value {
    match line.get(start..end).map(str::trim) {
        Some(text) if !text.is_empty() => Value::String(text.to_string()),
        _ => Value::Null,
    }
}

/// Parse one MPC 80-column line into an observation entry.
///
/// Return
/// ----------
/// * `None` if the line is shorter than 80 characters or is the second line of a two-line record.
pub fn entry_from_80col(line: &str) -> Option<Map<String, Value>> {
    if line.len() < 80 {
        return None;
    }
    if matches!(line.get(14..15), Some("s" | "v" | "r")) {
        return None;
    }

    let mut entry = Map::new();
    entry.insert("number".into(), column(line, 0, 5));
    entry.insert("designation".into(), column(line, 5, 12));
    entry.insert("note1".into(), column(line, 13, 14));
    entry.insert("note2".into(), column(line, 14, 15));
    entry.insert("date".into(), column(line, 15, 32));
    entry.insert("ra".into(), column(line, 32, 44));
    entry.insert("dec".into(), column(line, 44, 56));
    entry.insert("magnitude".into(), column(line, 65, 70));
    entry.insert("band".into(), column(line, 70, 71));
    entry.insert(OBSERVATORY_FIELD.into(), column(line, 77, 80));
    Some(entry)
}

/// Build an observation batch from the MPC 80-column text export of an object.
///
/// A single parsed line gives a single entry object, several lines give an array; unparsable
/// lines are ignored.
pub fn observations_from_80col(text: &str) -> ObservationBatch {
    let mut entries: Vec<Value> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let entry = entry_from_80col(line);
            if entry.is_none() {
                debug!(line, "ignoring MPC 80-column line");
            }
            entry
        })
        .map(Value::Object)
        .collect();

    if entries.len() == 1 {
        entries.remove(0)
    } else {
        Value::Array(entries)
    }
}
