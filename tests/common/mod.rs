#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};

use camino::Utf8PathBuf;
use mpc_xmatch::{
    catalog_record::{RawCatalog, RawRow},
    CacheStore, MpcQuery, ObservationBatch, XmatchConfig, XmatchError,
};
use serde_json::{json, Value};
use tempfile::TempDir;

/// In-memory stand-in for the MPC service, recording every call it receives.
#[derive(Default)]
pub struct ScriptedMpc {
    pub catalog: RawCatalog,
    pub observations: HashMap<String, ObservationBatch>,
    /// Numbers whose observation request fails with a transport-like error.
    pub failing: HashSet<String>,
    pub calls: RefCell<Vec<String>>,
}

impl ScriptedMpc {
    pub fn new(catalog: RawCatalog) -> Self {
        ScriptedMpc {
            catalog,
            ..Default::default()
        }
    }

    pub fn with_observations(mut self, number: &str, batch: ObservationBatch) -> Self {
        self.observations.insert(number.to_string(), batch);
        self
    }

    pub fn failing_on(mut self, number: &str) -> Self {
        self.failing.insert(number.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl MpcQuery for ScriptedMpc {
    fn list_objects(&self, object_class: &str, orbit_type: i64) -> Result<RawCatalog, XmatchError> {
        self.calls
            .borrow_mut()
            .push(format!("objects:{object_class}:{orbit_type}"));
        Ok(self.catalog.clone())
    }

    fn list_observations(&self, number: &str) -> Result<ObservationBatch, XmatchError> {
        self.calls.borrow_mut().push(format!("obs:{number}"));
        if self.failing.contains(number) {
            return Err(XmatchError::UpstreamStatus {
                url: format!("https://example.invalid/{number}.txt"),
                status: 503,
            });
        }
        Ok(self
            .observations
            .get(number)
            .cloned()
            .unwrap_or_else(|| json!([])))
    }
}

/// A service that must never be reached, used to prove cache hits.
pub struct Offline;

impl MpcQuery for Offline {
    fn list_objects(&self, _: &str, _: i64) -> Result<RawCatalog, XmatchError> {
        Err(XmatchError::UpstreamPayload("offline".into()))
    }

    fn list_observations(&self, _: &str) -> Result<ObservationBatch, XmatchError> {
        Err(XmatchError::UpstreamPayload("offline".into()))
    }
}

/// A catalog row as the orbit search returns it, with the usual type noise.
pub fn catalog_row(number: Value, name: Value, designation: &str) -> RawRow {
    let mut row = RawRow::new();
    row.insert("number".to_string(), number);
    row.insert("name".to_string(), name);
    for (key, value) in [
        ("designation", Value::from(designation)),
        ("absolute_magnitude", json!(6.5)),
        ("aphelion_distance", json!("18.87")),
        ("arc_length", json!(46021)),
        ("argument_of_perihelion", json!(339.5)),
        ("ascending_node", json!(209.2)),
        ("eccentricity", json!(0.3789)),
        ("inclination", json!(6.94)),
        ("mean_anomaly", json!(212.1)),
        ("mean_daily_motion", json!(0.01939)),
        ("phase_slope", json!(0.15)),
        ("q_vector_x", json!(1.1)),
        ("q_vector_y", json!(-2.2)),
        ("q_vector_z", json!(0.3)),
        ("residual_rms", json!(0.6)),
        ("semimajor_axis", json!(13.69)),
        ("tisserand_jupiter", json!(3.35)),
        ("delta_v", json!(null)),
        ("mercury_moid", json!("None")),
        ("venus_moid", json!(null)),
        ("earth_moid", json!(7.38)),
        ("mars_moid", json!("6.9")),
        ("jupiter_moid", json!("None")),
        ("saturn_moid", json!(0.1)),
        ("uranus_moid", json!("1.2")),
        ("critical_list_numbered_object", json!(false)),
        ("km_neo", json!(false)),
        ("neo", json!(0)),
        ("pha", json!("False")),
        ("observations", json!(3125)),
        ("oppositions", json!("49")),
        ("orbit_type", json!(10)),
        ("orbit_uncertainty", json!("E")),
        ("epoch", json!("2024-10-17.0")),
        ("epoch_jd", json!("2460600.5")),
        ("updated_at", json!("2024-10-20T12:00:00")),
        ("first_opposition_used", json!("1895")),
        ("last_opposition_used", json!("2024")),
        ("first_observation_date_used", json!("1895-08-01")),
        ("last_observation_date_used", json!(null)),
    ] {
        row.insert(key.to_string(), value);
    }
    row
}

pub fn observed_from(codes: &[&str]) -> ObservationBatch {
    Value::Array(
        codes
            .iter()
            .map(|code| json!({ "observatory": code, "date": "2010 01 16.27330" }))
            .collect(),
    )
}

pub fn temp_cache() -> (TempDir, CacheStore, XmatchConfig) {
    let dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().join("cache")).unwrap();
    let cache = CacheStore::new(root.clone()).unwrap();
    let config = XmatchConfig::builder().cache_root(root).build().unwrap();
    (dir, cache, config)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
