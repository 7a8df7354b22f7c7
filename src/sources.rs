//! # Cache-backed catalog and observation sources
//!
//! Both sources go through the same [`CacheStore`]:
//!
//! * [`CatalogSource`] – the distant-object catalog under a fixed key (`"distant_objects"` by
//!   default). A fresh fetch is normalized once, before it is persisted; a cache hit is returned
//!   as stored.
//! * [`ObservationSource`] – the raw observation batch of one object, keyed by its MPC number.
//!   Observation batches are persisted without any normalization.
use tracing::{debug, info};

use crate::{
    cache_store::CacheStore,
    catalog_record::CatalogRecord,
    config::XmatchConfig,
    constants::NONE_SENTINEL,
    mpc_service::MpcQuery,
    normalize::normalize_catalog,
    observation::ObservationBatch,
    table_codec::{CatalogParquet, ObservationParquet},
    xmatch_errors::XmatchError,
};

/// Distant-object catalog, fetched at most once per cache root.
#[derive(Debug)]
pub struct CatalogSource<Q> {
    query: Q,
    cache: CacheStore,
    object_class: String,
    orbit_type: i64,
    key: String,
}

impl<Q: MpcQuery> CatalogSource<Q> {
    pub fn new(query: Q, cache: CacheStore, config: &XmatchConfig) -> Self {
        CatalogSource {
            query,
            cache,
            object_class: config.object_class.clone(),
            orbit_type: config.orbit_type,
            key: config.catalog_key.clone(),
        }
    }

    /// Return the normalized catalog, querying the upstream service only on a cache miss.
    ///
    /// Return
    /// ----------
    /// * The catalog in upstream order.
    /// * [`XmatchError::Normalization`] if a fresh batch cannot be normalized; nothing is
    ///   written to the cache in that case.
    pub fn fetch_catalog(&self) -> Result<Vec<CatalogRecord>, XmatchError> {
        self.cache.get_or_fetch_with(&self.key, &CatalogParquet, || {
            let raw = self.query.list_objects(&self.object_class, self.orbit_type)?;
            info!(
                rows = raw.len(),
                object_class = %self.object_class,
                orbit_type = self.orbit_type,
                "fetched catalog from upstream"
            );
            normalize_catalog(raw)
        })
    }
}

/// Reference to the object whose observations are requested.
#[derive(Debug, Clone, Copy)]
pub enum ObjectRef<'a> {
    /// Bare MPC number, e.g. `"2060"`.
    Number(&'a str),
    /// Catalog record, the number is taken from its `number` field.
    Record(&'a CatalogRecord),
}

impl<'a> From<&'a str> for ObjectRef<'a> {
    fn from(number: &'a str) -> Self {
        ObjectRef::Number(number)
    }
}

impl<'a> From<&'a String> for ObjectRef<'a> {
    fn from(number: &'a String) -> Self {
        ObjectRef::Number(number)
    }
}

impl<'a> From<&'a CatalogRecord> for ObjectRef<'a> {
    fn from(record: &'a CatalogRecord) -> Self {
        ObjectRef::Record(record)
    }
}

impl<'a> ObjectRef<'a> {
    /// The MPC number used both as query argument and as cache key.
    ///
    /// Return
    /// ----------
    /// * The trimmed number.
    /// * [`XmatchError::UnresolvableIdentifier`] for an empty number, the `"None"` sentinel,
    ///   or a record without a usable number.
    pub fn number(&self) -> Result<&'a str, XmatchError> {
        match *self {
            ObjectRef::Number(number) => Some(number.trim())
                .filter(|n| !n.is_empty() && *n != NONE_SENTINEL)
                .ok_or_else(|| XmatchError::UnresolvableIdentifier(number.to_string())),
            ObjectRef::Record(record) => record
                .usable_number()
                .ok_or_else(|| XmatchError::UnresolvableIdentifier(record.designation.clone())),
        }
    }
}

/// Per-object observation batches, each fetched at most once per cache root.
#[derive(Debug)]
pub struct ObservationSource<Q> {
    query: Q,
    cache: CacheStore,
}

impl<Q: MpcQuery> ObservationSource<Q> {
    pub fn new(query: Q, cache: CacheStore) -> Self {
        ObservationSource { query, cache }
    }

    /// Return the observation batch of an object, querying the upstream service only on a
    /// cache miss.
    ///
    /// Arguments
    /// -----------------
    /// * `object`: a bare MPC number or a [`CatalogRecord`].
    ///
    /// Return
    /// ----------
    /// * The raw batch, in whatever shape the service produced it.
    /// * [`XmatchError::UnresolvableIdentifier`] if a record has no usable number.
    pub fn fetch_observations<'r>(
        &self,
        object: impl Into<ObjectRef<'r>>,
    ) -> Result<ObservationBatch, XmatchError> {
        let number = object.into().number()?;
        self.cache
            .get_or_fetch_with(number, &ObservationParquet, || {
                debug!(number, "fetching observations from upstream");
                self.query.list_observations(number)
            })
    }
}

#[cfg(test)]
mod sources_test {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        catalog_record::RawCatalog,
        normalize::{normalize_row, normalize_test::raw_row},
    };
    use camino::Utf8PathBuf;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        catalog: RawCatalog,
        calls: RefCell<Vec<String>>,
    }

    impl MpcQuery for Recorder {
        fn list_objects(&self, object_class: &str, orbit_type: i64) -> Result<RawCatalog, XmatchError> {
            self.calls
                .borrow_mut()
                .push(format!("objects:{object_class}:{orbit_type}"));
            Ok(self.catalog.clone())
        }

        fn list_observations(&self, number: &str) -> Result<ObservationBatch, XmatchError> {
            self.calls.borrow_mut().push(format!("obs:{number}"));
            Ok(json!([{ "observatory": "C51", "number": number }]))
        }
    }

    fn cache(dir: &TempDir) -> CacheStore {
        CacheStore::new(Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()).unwrap()
    }

    #[test]
    fn test_catalog_is_normalized_then_cached() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder {
            catalog: vec![raw_row(json!(2060), json!("Chiron"))],
            ..Default::default()
        };
        let source = CatalogSource::new(&recorder, cache(&dir), &XmatchConfig::default());

        let first = source.fetch_catalog().unwrap();
        let second = source.fetch_catalog().unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].number.as_deref(), Some("2060"));
        assert_eq!(second[0].number, first[0].number);
        assert_eq!(second[0].earth_moid, first[0].earth_moid);
        assert_eq!(*recorder.calls.borrow(), vec!["objects:asteroid:10".to_string()]);
        assert!(dir.path().join("distant_objects.parquet").exists());
    }

    #[test]
    fn test_failed_normalization_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let mut row = raw_row(json!(2060), json!("Chiron"));
        row.insert("orbit_type".into(), json!("ten"));
        let recorder = Recorder {
            catalog: vec![row],
            ..Default::default()
        };
        let source = CatalogSource::new(&recorder, cache(&dir), &XmatchConfig::default());

        let err = source.fetch_catalog().unwrap_err();
        assert!(matches!(err, XmatchError::Normalization { ref field, .. } if field == "orbit_type"));
        assert!(!dir.path().join("distant_objects.parquet").exists());
    }

    #[test]
    fn test_observations_by_number_or_record() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let source = ObservationSource::new(&recorder, cache(&dir));

        let by_number = source.fetch_observations("2060").unwrap();
        let record = normalize_row(&raw_row(json!("2060"), json!("Chiron"))).unwrap();
        let by_record = source.fetch_observations(&record).unwrap();

        assert_eq!(by_number, by_record);
        assert_eq!(by_record[0]["observatory"], "C51");
        assert_eq!(*recorder.calls.borrow(), vec!["obs:2060".to_string()]);

        let unnumbered = normalize_row(&raw_row(Value::Null, json!("None"))).unwrap();
        assert_eq!(
            source.fetch_observations(&unnumbered),
            Err(XmatchError::UnresolvableIdentifier("1977 UB".into()))
        );
    }

    #[test]
    fn test_bare_numbers_are_trimmed_and_checked() {
        let dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let source = ObservationSource::new(&recorder, cache(&dir));

        assert_eq!(
            source.fetch_observations("None"),
            Err(XmatchError::UnresolvableIdentifier("None".into()))
        );
        assert_eq!(
            source.fetch_observations("  "),
            Err(XmatchError::UnresolvableIdentifier("  ".into()))
        );
        assert!(recorder.calls.borrow().is_empty());

        source.fetch_observations(" 5145 ").unwrap();
        source.fetch_observations("5145").unwrap();
        assert_eq!(*recorder.calls.borrow(), vec!["obs:5145".to_string()]);
        assert!(dir.path().join("5145.parquet").exists());
    }
}
