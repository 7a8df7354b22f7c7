//! # Catalog / observatory cross-match pipeline
//!
//! [`MatchPipeline`] wires the pieces of the crate together:
//!
//! ```text
//! CatalogSource ──► for each record (catalog order)
//!                     ├─ no usable number ─────────────► Skipped(NoUsableNumber)
//!                     └─ ObservationSource ─► matcher ─► Included / Excluded / Skipped
//! ```
//!
//! Processing is strictly sequential: one upstream request at a time, in catalog order. A skip
//! never stops the run; a normalization, cache or transport error does, and everything cached
//! before it is kept for the next run.
//!
//! ## Reporting
//! -----------------
//! Every object gets a progress line (`tracing` at `INFO`), every skip a `WARN` line with its
//! reason. The run returns a [`MatchReport`]: the matched observation batches and a
//! [`MatchSummary`] whose `Display` gives the human-readable summary.
//!
//! With the `progress` feature, an `indicatif` progress bar is drawn over the catalog loop.
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use mpc_xmatch::{config::XmatchConfig, pipeline::run_with_config};
//!
//! # fn run() -> Result<(), mpc_xmatch::xmatch_errors::XmatchError> {
//! let config = XmatchConfig::builder().cache_root("./data/xmatch").build()?;
//! let report = run_with_config(&config)?;
//! println!("{}", report.summary);
//! # Ok(()) }
//! ```
use std::fmt;

use itertools::Itertools;
use tracing::{debug, info, warn};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    cache_store::CacheStore,
    catalog_record::CatalogRecord,
    config::XmatchConfig,
    constants::{MpcCode, ObjectNumber},
    matcher::{matches, MatchOutcome, SkipReason},
    mpc_service::{MpcQuery, MpcWebService},
    observation::ObservationBatch,
    sources::{CatalogSource, ObservationSource},
    xmatch_errors::XmatchError,
};

/// An object with at least one observation from the target observatory.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedObject {
    pub number: ObjectNumber,
    pub name: Option<String>,
    pub observations: ObservationBatch,
}

/// A catalog entry left out without being classified.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedObject {
    /// Position in the catalog.
    pub index: usize,
    pub designation: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchSummary {
    pub target: MpcCode,
    /// Number of catalog entries processed.
    pub total: usize,
    /// Numbers of the included objects, in catalog order.
    pub matched_numbers: Vec<ObjectNumber>,
    pub excluded: usize,
    pub skipped: Vec<SkippedObject>,
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Found {} distant objects detected by {}.",
            self.matched_numbers.len(),
            self.target
        )?;
        writeln!(f, "    [{}]", self.matched_numbers.iter().join(", "))?;
        write!(
            f,
            "    ({} processed, {} excluded, {} skipped)",
            self.total,
            self.excluded,
            self.skipped.len()
        )
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchReport {
    pub matched: Vec<MatchedObject>,
    pub summary: MatchSummary,
}

/// Sequential cross-match of a catalog against an observatory code.
#[derive(Debug)]
pub struct MatchPipeline<Q> {
    query: Q,
    cache: CacheStore,
    config: XmatchConfig,
}

impl<Q: MpcQuery> MatchPipeline<Q> {
    pub fn new(query: Q, cache: CacheStore, config: XmatchConfig) -> Self {
        MatchPipeline {
            query,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &XmatchConfig {
        &self.config
    }

    pub fn catalog_source(&self) -> CatalogSource<&Q> {
        CatalogSource::new(&self.query, self.cache.clone(), &self.config)
    }

    pub fn observation_source(&self) -> ObservationSource<&Q> {
        ObservationSource::new(&self.query, self.cache.clone())
    }

    /// Classify one catalog record.
    ///
    /// Return
    /// ----------
    /// * The outcome and, when the observations could be fetched, the batch.
    /// * Upstream or cache errors are propagated.
    pub fn process_record(
        &self,
        observations: &ObservationSource<&Q>,
        record: &CatalogRecord,
        target: &str,
    ) -> Result<(MatchOutcome, Option<ObservationBatch>), XmatchError> {
        if record.usable_number().is_none() {
            return Ok((MatchOutcome::Skipped(SkipReason::NoUsableNumber), None));
        }
        let batch = observations.fetch_observations(record)?;
        let outcome = matches(&batch, target);
        Ok((outcome, Some(batch)))
    }

    /// Run the cross-match against `target`.
    ///
    /// Arguments
    /// -----------------
    /// * `target`: MPC observatory code an object must have been observed from.
    ///
    /// Return
    /// ----------
    /// * A [`MatchReport`] with the matched batches in catalog order and the run summary.
    /// * The first normalization, cache or upstream error, which aborts the run.
    pub fn run(&self, target: &str) -> Result<MatchReport, XmatchError> {
        let catalog = self.catalog_source().fetch_catalog()?;
        let observations = self.observation_source();
        let total = catalog.len();

        let mut report = MatchReport {
            matched: Vec::new(),
            summary: MatchSummary {
                target: target.to_string(),
                total,
                ..Default::default()
            },
        };

        #[cfg(feature = "progress")]
        let pb = {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} [{elapsed}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb
        };

        for (idx, record) in catalog.iter().enumerate() {
            let number = record.number.as_deref().unwrap_or("None");
            info!(
                "Fetching {}/{}: Obj(name={}, number={})",
                idx,
                total,
                record.name.as_deref().unwrap_or("None"),
                number
            );

            let (outcome, batch) = self.process_record(&observations, record, target)?;
            match (outcome, batch) {
                (MatchOutcome::Included, Some(batch)) => {
                    debug!(number, "included");
                    report.summary.matched_numbers.push(number.to_string());
                    report.matched.push(MatchedObject {
                        number: number.to_string(),
                        name: record.name.clone(),
                        observations: batch,
                    });
                }
                (MatchOutcome::Skipped(reason), _) => {
                    warn!(
                        index = idx,
                        designation = %record.designation,
                        number,
                        "Object {} skipped: {}",
                        record.display_name(),
                        reason
                    );
                    report.summary.skipped.push(SkippedObject {
                        index: idx,
                        designation: record.designation.clone(),
                        reason,
                    });
                }
                _ => {
                    debug!(number, "excluded");
                    report.summary.excluded += 1;
                }
            }

            #[cfg(feature = "progress")]
            {
                pb.set_message(record.display_name().to_string());
                pb.inc(1);
            }
        }

        #[cfg(feature = "progress")]
        pb.finish_and_clear();

        info!(
            matched = report.summary.matched_numbers.len(),
            excluded = report.summary.excluded,
            skipped = report.summary.skipped.len(),
            "{}",
            report.summary
        );
        Ok(report)
    }

    /// [`MatchPipeline::run`] against the configured target observatory.
    pub fn run_configured(&self) -> Result<MatchReport, XmatchError> {
        self.run(&self.config.target_observatory)
    }
}

/// Entry point: build the cache and the MPC web client from `config` and run the cross-match.
pub fn run_with_config(config: &XmatchConfig) -> Result<MatchReport, XmatchError> {
    let cache = CacheStore::new(config.cache_root.clone())?;
    let service = MpcWebService::new(config)?;
    MatchPipeline::new(service, cache, config.clone()).run_configured()
}
