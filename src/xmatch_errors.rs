use arrow_schema::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmatchError {
    #[error("Can not cast field '{field}': {reason}")]
    Normalization { field: String, reason: String },

    #[error("Object {0} has no usable MPC number")]
    UnresolvableIdentifier(String),

    #[error("Invalid cache key: {0:?}")]
    InvalidCacheKey(String),

    #[error("Corrupt cache file at {path}: {reason}")]
    CorruptCacheFile { path: String, reason: String },

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] ArrowError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Upstream service answered {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("Unexpected upstream payload: {0}")]
    UpstreamPayload(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl XmatchError {
    pub(crate) fn normalization(field: &str, reason: impl Into<String>) -> Self {
        XmatchError::Normalization {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl PartialEq for XmatchError {
    fn eq(&self, other: &Self) -> bool {
        use XmatchError::*;
        match (self, other) {
            (
                Normalization {
                    field: fa,
                    reason: ra,
                },
                Normalization {
                    field: fb,
                    reason: rb,
                },
            ) => fa == fb && ra == rb,
            (UnresolvableIdentifier(a), UnresolvableIdentifier(b)) => a == b,
            (InvalidCacheKey(a), InvalidCacheKey(b)) => a == b,
            (
                CorruptCacheFile {
                    path: pa,
                    reason: ra,
                },
                CorruptCacheFile {
                    path: pb,
                    reason: rb,
                },
            ) => pa == pb && ra == rb,
            (
                UpstreamStatus {
                    url: ua,
                    status: sa,
                },
                UpstreamStatus {
                    url: ub,
                    status: sb,
                },
            ) => ua == ub && sa == sb,
            (UpstreamPayload(a), UpstreamPayload(b)) => a == b,
            (InvalidConfig(a), InvalidConfig(b)) => a == b,

            // payloads are not comparable, same variant is enough
            (IoError(_), IoError(_)) => true,
            (ParquetError(_), ParquetError(_)) => true,
            (ArrowError(_), ArrowError(_)) => true,
            (JsonError(_), JsonError(_)) => true,
            (ReqwestError(_), ReqwestError(_)) => true,

            _ => false,
        }
    }
}
