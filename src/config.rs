//! # Cross-match configuration
//!
//! [`XmatchConfig`] gathers every tunable of a run: where the cache lives, which observatory is
//! looked for, which catalog is pulled, and how the upstream service is reached. It is passed
//! explicitly to [`CacheStore::new`](crate::cache_store::CacheStore::new),
//! [`MpcWebService::new`](crate::mpc_service::MpcWebService::new) and
//! [`run_with_config`](crate::pipeline::run_with_config); nothing in the crate reads a global.
//!
//! ## Defaults
//! -----------------
//! | Field                | Default |
//! |----------------------|---------|
//! | `cache_root`         | `<user cache dir>/mpc_xmatch_cache` (or `./data/mpc_wise_xmatch_cache`) |
//! | `target_observatory` | `"C51"` (WISE) |
//! | `object_class`       | `"asteroid"` |
//! | `orbit_type`         | `10` (distant objects) |
//! | `catalog_key`        | `"distant_objects"` |
//! | `http_timeout`       | 60 s |
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use mpc_xmatch::config::XmatchConfig;
//!
//! let config = XmatchConfig::builder()
//!     .cache_root("./data/xmatch")
//!     .target_observatory("C51")
//!     .build()
//!     .unwrap();
//! ```
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::{
    constants::{
        MpcCode, ASTEROID_CLASS, CACHE_DIR_NAME, DISTANT_OBJECTS_KEY, DISTANT_ORBIT_TYPE,
        FALLBACK_CACHE_DIR, WISE_OBS_CODE,
    },
    xmatch_errors::XmatchError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct XmatchConfig {
    /// Directory holding one cache file per key.
    pub cache_root: Utf8PathBuf,
    /// Observatory code an object must have been observed from to be kept.
    pub target_observatory: MpcCode,
    /// Object class of the catalog query (`"asteroid"` or `"comet"`).
    pub object_class: String,
    /// `orbit_type` filter of the catalog query.
    pub orbit_type: i64,
    /// Cache key of the catalog.
    pub catalog_key: String,
    pub http_timeout: Duration,
    pub orbits_url: String,
    pub comet_orbits_url: String,
    pub observations_url: String,
}

/// Default cache directory: the user cache dir when it can be resolved, a relative
/// directory otherwise.
pub fn default_cache_root() -> Utf8PathBuf {
    BaseDirs::new()
        .and_then(|dirs| Utf8Path::from_path(dirs.cache_dir()).map(|p| p.join(CACHE_DIR_NAME)))
        .unwrap_or_else(|| Utf8PathBuf::from(FALLBACK_CACHE_DIR))
}

impl Default for XmatchConfig {
    fn default() -> Self {
        XmatchConfig {
            cache_root: default_cache_root(),
            target_observatory: WISE_OBS_CODE.to_string(),
            object_class: ASTEROID_CLASS.to_string(),
            orbit_type: DISTANT_ORBIT_TYPE,
            catalog_key: DISTANT_OBJECTS_KEY.to_string(),
            http_timeout: Duration::from_secs(60),
            orbits_url: "https://minorplanetcenter.net/web_service/search_orbits".to_string(),
            comet_orbits_url: "https://minorplanetcenter.net/web_service/search_comet_orbits"
                .to_string(),
            observations_url: "https://minorplanetcenter.net/tmp2".to_string(),
        }
    }
}

impl XmatchConfig {
    pub fn builder() -> XmatchConfigBuilder {
        XmatchConfigBuilder::new()
    }
}

/// Builder for [`XmatchConfig`], with validation.
#[derive(Debug, Clone, Default)]
pub struct XmatchConfigBuilder {
    config: XmatchConfig,
}

impl XmatchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_root(mut self, v: impl Into<Utf8PathBuf>) -> Self {
        self.config.cache_root = v.into();
        self
    }
    pub fn target_observatory(mut self, v: impl Into<MpcCode>) -> Self {
        self.config.target_observatory = v.into();
        self
    }
    pub fn object_class(mut self, v: impl Into<String>) -> Self {
        self.config.object_class = v.into();
        self
    }
    pub fn orbit_type(mut self, v: i64) -> Self {
        self.config.orbit_type = v;
        self
    }
    pub fn catalog_key(mut self, v: impl Into<String>) -> Self {
        self.config.catalog_key = v.into();
        self
    }
    pub fn http_timeout(mut self, v: Duration) -> Self {
        self.config.http_timeout = v;
        self
    }
    pub fn orbits_url(mut self, v: impl Into<String>) -> Self {
        self.config.orbits_url = v.into();
        self
    }
    pub fn comet_orbits_url(mut self, v: impl Into<String>) -> Self {
        self.config.comet_orbits_url = v.into();
        self
    }
    pub fn observations_url(mut self, v: impl Into<String>) -> Self {
        self.config.observations_url = v.into();
        self
    }

    /// Finalize the builder.
    ///
    /// Return
    /// ----------
    /// * `Err(XmatchError::InvalidConfig)` for an empty target code, an empty catalog key,
    ///   an empty cache root or a zero HTTP timeout.
    pub fn build(self) -> Result<XmatchConfig, XmatchError> {
        let c = &self.config;

        if c.target_observatory.trim().is_empty() {
            return Err(XmatchError::InvalidConfig(
                "target_observatory must not be empty".into(),
            ));
        }
        if c.catalog_key.trim().is_empty() {
            return Err(XmatchError::InvalidConfig(
                "catalog_key must not be empty".into(),
            ));
        }
        if c.cache_root.as_str().is_empty() {
            return Err(XmatchError::InvalidConfig(
                "cache_root must not be empty".into(),
            ));
        }
        if c.http_timeout.is_zero() {
            return Err(XmatchError::InvalidConfig(
                "http_timeout must be > 0".into(),
            ));
        }

        Ok(self.config)
    }
}
