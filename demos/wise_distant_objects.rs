//! List the distant objects (MPC orbit type 10) with at least one WISE (C51) observation.
//!
//! ```text
//! cargo run --example wise_distant_objects -- [cache_dir] [observatory_code]
//! ```
//!
//! Catalog and observation files are cached under `cache_dir`; a second run only queries the
//! MPC for objects whose observations are not cached yet.
use mpc_xmatch::{run_with_config, XmatchConfig, XmatchError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), XmatchError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mut builder = XmatchConfig::builder();
    if let Some(cache_dir) = args.next() {
        builder = builder.cache_root(cache_dir);
    }
    if let Some(code) = args.next() {
        builder = builder.target_observatory(code);
    }
    let config = builder.build()?;

    let report = run_with_config(&config)?;
    println!("{}", report.summary);
    Ok(())
}
