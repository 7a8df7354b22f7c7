pub mod cache_store;
pub mod catalog_record;
pub mod config;
pub mod constants;
pub mod matcher;
pub mod mpc_service;
pub mod normalize;
pub mod observation;
pub mod pipeline;
pub mod sources;
pub mod table_codec;
pub mod xmatch_errors;

pub use cache_store::CacheStore;
pub use catalog_record::CatalogRecord;
pub use config::XmatchConfig;
pub use matcher::{MatchOutcome, SkipReason};
pub use mpc_service::{MpcQuery, MpcWebService};
pub use observation::ObservationBatch;
pub use pipeline::{run_with_config, MatchPipeline, MatchReport};
pub use xmatch_errors::XmatchError;
