//! # Constants and type definitions for mpc_xmatch
//!
//! This module centralizes the **well-known values** of the MPC cross-match: the default target
//! observatory, the orbit-type filter of the distant-object catalog, cache naming and the
//! sentinel string the upstream service uses in place of a true null.

// -------------------------------------------------------------------------------------------------
// Upstream conventions
// -------------------------------------------------------------------------------------------------

/// MPC observatory code of the WISE / NEOWISE space survey.
pub const WISE_OBS_CODE: &str = "C51";

/// MPC `orbit_type` enumeration value of the distant objects.
pub const DISTANT_ORBIT_TYPE: i64 = 10;

/// Object class passed to the catalog query.
pub const ASTEROID_CLASS: &str = "asteroid";

/// Textual stand-in the upstream service sometimes returns instead of `null`.
pub const NONE_SENTINEL: &str = "None";

// -------------------------------------------------------------------------------------------------
// Cache layout
// -------------------------------------------------------------------------------------------------

/// Cache key of the distant-object catalog.
pub const DISTANT_OBJECTS_KEY: &str = "distant_objects";

/// Extension of every cache file (Apache Parquet table).
pub const CACHE_EXTENSION: &str = "parquet";

/// Cache directory name created under the user cache dir.
pub const CACHE_DIR_NAME: &str = "mpc_xmatch_cache";

/// Cache directory used when no user cache dir can be resolved.
pub const FALLBACK_CACHE_DIR: &str = "./data/mpc_wise_xmatch_cache";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// MPC code identifying an observatory (3 characters)
pub type MpcCode = String;

/// MPC permanent number of an object, kept in its textual form (e.g. `"2060"`).
pub type ObjectNumber = String;
