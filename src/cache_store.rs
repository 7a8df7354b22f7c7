//! # Write-once file cache
//!
//! [`CacheStore`] is a get-or-fetch cache keyed by a string. Each key maps to exactly one file
//! `<cache_root>/<key>.parquet`:
//!
//! 1. If the file exists, it is loaded and returned; the fetch function is **not** called.
//! 2. Otherwise the value is fetched, persisted, and returned.
//!
//! Files are never refreshed, overwritten, or invalidated by this crate. A value is first
//! written to `<key>.parquet.partial` and then renamed into place, so an interrupted write never
//! leaves a file that a later run would mistake for a cache hit.
//!
//! There is no locking: the store is meant for a single process issuing one request at a time.
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::{constants::CACHE_EXTENSION, table_codec::TableCodec, xmatch_errors::XmatchError};

/// Get-or-fetch cache rooted in a directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: Utf8PathBuf,
}

impl CacheStore {
    /// Open a cache rooted at `root`, creating the directory if needed.
    ///
    /// Arguments
    /// -----------------
    /// * `root`: cache directory.
    ///
    /// Return
    /// ----------
    /// * The store, or an I/O error if the directory cannot be created.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Result<Self, XmatchError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(CacheStore { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Deterministic file path of a cache key.
    ///
    /// Keys are object numbers or fixed names; anything that could leave the cache root
    /// (path separators, `.`/`..`, empty key) is rejected.
    pub fn path_for(&self, key: &str) -> Result<Utf8PathBuf, XmatchError> {
        let invalid = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\', '\0']);
        if invalid {
            return Err(XmatchError::InvalidCacheKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.{CACHE_EXTENSION}")))
    }

    /// Whether a value is already cached under `key`.
    pub fn contains(&self, key: &str) -> Result<bool, XmatchError> {
        Ok(self.path_for(key)?.exists())
    }

    /// Load the value cached under `key`, or fetch and persist it.
    ///
    /// Arguments
    /// -----------------
    /// * `key`: cache key.
    /// * `fetch`: produces the value on a cache miss.
    /// * `persist`: writes a fetched value to the given path.
    /// * `load`: reads a cached value from the given path.
    ///
    /// Return
    /// ----------
    /// * The cached or freshly fetched value. Errors from `fetch`, `persist` or `load` are
    ///   propagated unchanged; a failed fetch or persist leaves no file behind.
    pub fn get_or_fetch<T, F, P, L>(
        &self,
        key: &str,
        fetch: F,
        persist: P,
        load: L,
    ) -> Result<T, XmatchError>
    where
        F: FnOnce() -> Result<T, XmatchError>,
        P: FnOnce(&Utf8Path, &T) -> Result<(), XmatchError>,
        L: FnOnce(&Utf8Path) -> Result<T, XmatchError>,
    {
        let path = self.path_for(key)?;
        if path.exists() {
            debug!(key, %path, "cache hit");
            return load(&path);
        }

        debug!(key, %path, "cache miss");
        let value = fetch()?;

        let partial = Utf8PathBuf::from(format!("{path}.partial"));
        if let Err(err) = persist(&partial, &value) {
            let _ = fs::remove_file(&partial);
            return Err(err);
        }
        fs::rename(&partial, &path)?;
        Ok(value)
    }

    /// [`CacheStore::get_or_fetch`] with persistence delegated to a [`TableCodec`].
    pub fn get_or_fetch_with<T, C, F>(&self, key: &str, codec: &C, fetch: F) -> Result<T, XmatchError>
    where
        C: TableCodec<T>,
        F: FnOnce() -> Result<T, XmatchError>,
    {
        self.get_or_fetch(
            key,
            fetch,
            |path, value| codec.write(path, value),
            |path| codec.read(path),
        )
    }
}

#[cfg(test)]
mod cache_store_test {
    use std::cell::Cell;

    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> CacheStore {
        CacheStore::new(Utf8PathBuf::from_path_buf(dir.path().join("cache")).unwrap()).unwrap()
    }

    fn persist_text(path: &Utf8Path, value: &String) -> Result<(), XmatchError> {
        fs::write(path, value)?;
        Ok(())
    }

    fn load_text(path: &Utf8Path) -> Result<String, XmatchError> {
        Ok(fs::read_to_string(path)?)
    }

    #[test]
    fn test_second_call_is_a_cache_hit() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let calls = Cell::new(0);

        let fetch = || {
            calls.set(calls.get() + 1);
            if calls.get() > 1 {
                return Err(XmatchError::UpstreamPayload("fetched twice".into()));
            }
            Ok("payload".to_string())
        };

        let first = store.get_or_fetch("2060", fetch, persist_text, load_text).unwrap();
        let second = store.get_or_fetch("2060", fetch, persist_text, load_text).unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert!(store.root().join("2060.parquet").exists());
    }

    #[test]
    fn test_failed_fetch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let err = store
            .get_or_fetch(
                "5145",
                || Err(XmatchError::UpstreamPayload("offline".into())),
                persist_text,
                load_text,
            )
            .unwrap_err();
        assert_eq!(err, XmatchError::UpstreamPayload("offline".into()));
        assert!(!store.contains("5145").unwrap());
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_persist_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let result = store.get_or_fetch(
            "10199",
            || Ok("payload".to_string()),
            |path, value: &String| {
                fs::write(path, value)?;
                Err(XmatchError::UpstreamPayload("disk full".into()))
            },
            load_text,
        );
        assert!(result.is_err());
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_keys() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        for key in ["", ".", "..", "../escape", "a/b", "a\\b"] {
            assert_eq!(
                store.path_for(key),
                Err(XmatchError::InvalidCacheKey(key.to_string()))
            );
        }
        assert_eq!(
            store.path_for("distant_objects").unwrap(),
            store.root().join("distant_objects.parquet")
        );
    }
}
