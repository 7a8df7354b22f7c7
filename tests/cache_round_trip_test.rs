mod common;

use approx::assert_relative_eq;
use common::{catalog_row, temp_cache, Offline, ScriptedMpc};
use mpc_xmatch::{
    normalize::normalize_catalog,
    sources::{CatalogSource, ObservationSource},
};
use serde_json::json;

#[test]
fn test_catalog_round_trip_matches_fresh_normalization() {
    let (_dir, cache, config) = temp_cache();
    let rows = vec![
        catalog_row(json!(2060), json!("Chiron"), "1977 UB"),
        catalog_row(json!(null), json!("None"), "2014 UZ224"),
    ];
    let expected = normalize_catalog(rows.clone()).unwrap();

    let mpc = ScriptedMpc::new(rows);
    let fresh = CatalogSource::new(&mpc, cache.clone(), &config)
        .fetch_catalog()
        .unwrap();
    let cached = CatalogSource::new(Offline, cache, &config)
        .fetch_catalog()
        .unwrap();

    assert_eq!(fresh, expected);
    assert_eq!(cached, expected);
    assert_eq!(cached[1].number, None);
    assert_eq!(cached[0].orbit_uncertainty.as_deref(), Some("E"));
    assert_relative_eq!(cached[0].aphelion_distance, 18.87, epsilon = 1e-12);
    assert_relative_eq!(cached[0].q_vector_y, -2.2, epsilon = 1e-12);
}

#[test]
fn test_observation_round_trip_by_number() {
    let (_dir, cache, _config) = temp_cache();
    let batch = json!([
        { "observatory": "C51", "date": "2010 01 16.27330" },
        { "observatory": "691", "date": "2014 12 20.35463" }
    ]);
    let mpc = ScriptedMpc::default().with_observations("2060", batch.clone());

    let fresh = ObservationSource::new(&mpc, cache.clone())
        .fetch_observations("2060")
        .unwrap();
    let cached = ObservationSource::new(Offline, cache.clone())
        .fetch_observations("2060")
        .unwrap();

    assert_eq!(fresh, batch);
    assert_eq!(cached, batch);
    assert!(cache.root().join("2060.parquet").exists());
}

#[test]
fn test_cached_observations_keep_numbers_and_nulls() {
    let (_dir, cache, _config) = temp_cache();
    let batch = json!([{ "observatory": 704, "mag": null, "ra": 12.5 }]);
    let mpc = ScriptedMpc::default().with_observations("10199", batch.clone());

    let fresh = ObservationSource::new(&mpc, cache.clone())
        .fetch_observations("10199")
        .unwrap();
    let cached = ObservationSource::new(Offline, cache)
        .fetch_observations("10199")
        .unwrap();

    assert_eq!(fresh, batch);
    assert_eq!(cached, fresh);
}

#[test]
fn test_catalog_with_missing_floats_round_trips() {
    let (_dir, cache, config) = temp_cache();
    let mpc = ScriptedMpc::new(vec![catalog_row(json!(2060), json!("Chiron"), "1977 UB")]);

    let fresh = CatalogSource::new(&mpc, cache.clone(), &config)
        .fetch_catalog()
        .unwrap();
    let cached = CatalogSource::new(Offline, cache, &config)
        .fetch_catalog()
        .unwrap();

    assert!(cached[0].delta_v.is_nan());
    assert_eq!(cached, fresh);
}
