//! The assembled experiment dataset

use super::{ExperimentInfo, FactorTable};
use crate::metrics::TrackMetrics;
use crate::{Error, Result};
use indexmap::IndexMap;

/// Aligned metrics and metadata for every usable track.
///
/// Built once by reconciliation and read-only afterwards. Metric keys and
/// factor row names are the same ids in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    metrics: IndexMap<String, TrackMetrics>,
    factors: FactorTable,
    summary_variables: Vec<String>,
    info: ExperimentInfo,
    dropped: usize,
}

impl Experiment {
    /// Assemble an experiment from aligned parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Other`] if the metric keys and factor rows differ.
    pub fn new(
        metrics: IndexMap<String, TrackMetrics>,
        factors: FactorTable,
        summary_variables: Vec<String>,
        info: ExperimentInfo,
        dropped: usize,
    ) -> Result<Self> {
        if !metrics.keys().map(String::as_str).eq(factors.row_names()) {
            return Err(Error::Other(
                "Metric tracks and factor rows are not aligned".to_string(),
            ));
        }

        Ok(Self {
            metrics,
            factors,
            summary_variables,
            info,
            dropped,
        })
    }

    /// Metrics keyed by track id.
    #[must_use]
    pub const fn metrics(&self) -> &IndexMap<String, TrackMetrics> {
        &self.metrics
    }

    /// Metrics of one track.
    #[must_use]
    pub fn track(&self, id: &str) -> Option<&TrackMetrics> {
        self.metrics.get(id)
    }

    /// Factor table, one row per track.
    #[must_use]
    pub const fn factors(&self) -> &FactorTable {
        &self.factors
    }

    /// Summary variable names.
    #[must_use]
    pub fn summary_variables(&self) -> &[String] {
        &self.summary_variables
    }

    /// Provenance.
    #[must_use]
    pub const fn info(&self) -> &ExperimentInfo {
        &self.info
    }

    /// Tracks excluded as unusable.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    /// Track ids, in order.
    pub fn track_ids(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    /// Number of tracks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether there are no tracks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
