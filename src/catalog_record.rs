//! # Catalog records of the distant-object query
//!
//! This module defines the **canonical row shape** of the MPC orbit catalog as returned by the
//! `search_orbits` web service, together with the explicit per-field type table that drives
//! normalization ([`crate::normalize`]) and persistence ([`crate::table_codec`]).
//!
//! ## Overview
//! -----------------
//! - [`RawRow`] / [`RawCatalog`]: rows exactly as decoded from the upstream JSON. Column types are
//!   **not** stable from one query to the next (a MOID can be a number, a string, `"None"` or
//!   `null`; the orbit uncertainty is usually a digit but sometimes a letter code).
//! - [`FieldKind`]: the closed set of canonical kinds a catalog field can have.
//! - [`CATALOG_FIELDS`]: the fixed `(field name, kind)` table, in persistence column order.
//! - [`CatalogRecord`]: the strongly-typed record built from a normalized row.
//!
//! ## Null policy per kind
//! -----------------
//! | Kind           | Rust type        | Upstream `null`          |
//! |----------------|------------------|--------------------------|
//! | `Float`        | `f64`            | `NaN`                    |
//! | `Int`          | `i64`            | rejected                 |
//! | `Bool`         | `bool`           | `false`                  |
//! | `Text`         | `String`         | rejected                 |
//! | `NullableText` | `Option<String>` | `None`                   |
//! | `Flexible`     | `Option<String>` | `None`                   |
//!
//! For every text kind the literal `"None"` string is treated exactly like `null`.
//!
//! `Text` fields (`designation`, `epoch`, `epoch_jd`, `updated_at`, `first_opposition_used`,
//! `last_opposition_used`) are required: a row where one of them is `null`, `"None"` or absent
//! fails normalization, and with it the whole catalog batch. Turning such a value into a
//! string would reintroduce the `"None"` sentinel that normalized records must not contain.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::constants::NONE_SENTINEL;

/// One catalog row as decoded from the upstream JSON payload.
pub type RawRow = Map<String, Value>;

/// A full catalog batch as decoded from the upstream JSON payload.
pub type RawCatalog = Vec<RawRow>;

/// Canonical kind of a catalog field.
///
/// Each kind owns a single cast function and a single null policy, see
/// [`FieldKind::cast`](crate::normalize).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Orbital elements and other real-valued quantities.
    Float,
    /// Counters and enumerations (`observations`, `oppositions`, `orbit_type`).
    Int,
    /// Catalog flags (`neo`, `pha`, ...).
    Bool,
    /// Required text (`designation`, `epoch`, ...).
    Text,
    /// Optional text whose missing value may be spelled `"None"` (MOIDs).
    NullableText,
    /// Free-form text of unknown upstream encoding, never narrowed to another type.
    Flexible,
}

/// The fixed catalog schema, in persistence column order.
pub const CATALOG_FIELDS: &[(&str, FieldKind)] = &[
    ("number", FieldKind::Flexible),
    ("name", FieldKind::Flexible),
    ("designation", FieldKind::Text),
    ("absolute_magnitude", FieldKind::Float),
    ("aphelion_distance", FieldKind::Float),
    ("arc_length", FieldKind::Float),
    ("argument_of_perihelion", FieldKind::Float),
    ("ascending_node", FieldKind::Float),
    ("eccentricity", FieldKind::Float),
    ("inclination", FieldKind::Float),
    ("mean_anomaly", FieldKind::Float),
    ("mean_daily_motion", FieldKind::Float),
    ("phase_slope", FieldKind::Float),
    ("q_vector_x", FieldKind::Float),
    ("q_vector_y", FieldKind::Float),
    ("q_vector_z", FieldKind::Float),
    ("residual_rms", FieldKind::Float),
    ("semimajor_axis", FieldKind::Float),
    ("tisserand_jupiter", FieldKind::Float),
    ("delta_v", FieldKind::Float),
    ("mercury_moid", FieldKind::NullableText),
    ("venus_moid", FieldKind::NullableText),
    ("earth_moid", FieldKind::NullableText),
    ("mars_moid", FieldKind::NullableText),
    ("jupiter_moid", FieldKind::NullableText),
    ("saturn_moid", FieldKind::NullableText),
    ("uranus_moid", FieldKind::NullableText),
    ("critical_list_numbered_object", FieldKind::Bool),
    ("km_neo", FieldKind::Bool),
    ("neo", FieldKind::Bool),
    ("pha", FieldKind::Bool),
    ("observations", FieldKind::Int),
    ("oppositions", FieldKind::Int),
    ("orbit_type", FieldKind::Int),
    ("orbit_uncertainty", FieldKind::Flexible),
    ("epoch", FieldKind::Text),
    ("epoch_jd", FieldKind::Text),
    ("updated_at", FieldKind::Text),
    ("first_opposition_used", FieldKind::Text),
    ("last_opposition_used", FieldKind::Text),
    ("first_observation_date_used", FieldKind::Flexible),
    ("last_observation_date_used", FieldKind::Flexible),
];

/// Look up the declared kind of a catalog field.
pub fn field_kind(name: &str) -> Option<FieldKind> {
    CATALOG_FIELDS
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, kind)| *kind)
}

/// A normalized row of the distant-object catalog.
///
/// Instances are produced once by [`crate::normalize::normalize_catalog`] (fresh fetch) or
/// decoded from the cache, and are never mutated afterwards.
///
/// Serializing a record with `serde_json` gives back a row in canonical form: feeding it to
/// the normalizer again yields an identical record.
///
/// Equality treats a missing float (`NaN`) as equal to another missing float, so records
/// with null orbital elements compare equal to their cached copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    // --- identifiers ---
    pub number: Option<String>,
    pub name: Option<String>,
    pub designation: String,

    // --- orbital elements ---
    #[serde(deserialize_with = "nan_if_null")]
    pub absolute_magnitude: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub aphelion_distance: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub arc_length: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub argument_of_perihelion: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub ascending_node: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub eccentricity: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub inclination: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub mean_anomaly: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub mean_daily_motion: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub phase_slope: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub q_vector_x: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub q_vector_y: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub q_vector_z: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub residual_rms: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub semimajor_axis: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub tisserand_jupiter: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub delta_v: f64,

    // --- minimum orbit intersection distances ---
    pub mercury_moid: Option<String>,
    pub venus_moid: Option<String>,
    pub earth_moid: Option<String>,
    pub mars_moid: Option<String>,
    pub jupiter_moid: Option<String>,
    pub saturn_moid: Option<String>,
    pub uranus_moid: Option<String>,

    // --- flags ---
    pub critical_list_numbered_object: bool,
    pub km_neo: bool,
    pub neo: bool,
    pub pha: bool,

    // --- counters ---
    pub observations: i64,
    pub oppositions: i64,
    pub orbit_type: i64,

    // --- free-form ---
    pub orbit_uncertainty: Option<String>,
    pub epoch: String,
    pub epoch_jd: String,
    pub updated_at: String,
    pub first_opposition_used: String,
    pub last_opposition_used: String,
    pub first_observation_date_used: Option<String>,
    pub last_observation_date_used: Option<String>,
}

impl CatalogRecord {
    /// The MPC permanent number, if the object has a usable one.
    ///
    /// Return
    /// ----------
    /// * `None` when the number is missing or spelled with the `"None"` sentinel.
    pub fn usable_number(&self) -> Option<&str> {
        self.number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty() && *n != NONE_SENTINEL)
    }

    /// Human-readable name used in progress lines, falling back to the designation.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.designation)
    }
}

macro_rules! fields_eq {
    ($cmp:path, $a:expr, $b:expr; $($field:ident),+ $(,)?) => {
        $($cmp(&$a.$field, &$b.$field))&&+
    };
}

fn same_float(a: &f64, b: &f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for CatalogRecord {
    fn eq(&self, other: &Self) -> bool {
        fields_eq!(
            same_float, self, other;
            absolute_magnitude, aphelion_distance, arc_length, argument_of_perihelion,
            ascending_node, eccentricity, inclination, mean_anomaly, mean_daily_motion,
            phase_slope, q_vector_x, q_vector_y, q_vector_z, residual_rms, semimajor_axis,
            tisserand_jupiter, delta_v,
        ) && fields_eq!(
            PartialEq::eq, self, other;
            number, name, designation,
            mercury_moid, venus_moid, earth_moid, mars_moid, jupiter_moid, saturn_moid,
            uranus_moid,
            critical_list_numbered_object, km_neo, neo, pha,
            observations, oppositions, orbit_type,
            orbit_uncertainty, epoch, epoch_jd, updated_at, first_opposition_used,
            last_opposition_used, first_observation_date_used, last_observation_date_used,
        )
    }
}

fn nan_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or(f64::NAN))
}
