//! Reconciliation of per-track outcomes into an experiment

use super::{Experiment, ExperimentInfo, FactorTable};
use crate::execution::TrackOutcome;
use crate::{Error, Result};
use indexmap::IndexMap;

/// Drop unusable tracks and align the factor table with the survivors.
///
/// `outcomes` must hold one entry per factor-table row. Summary variables
/// are taken from the first surviving track.
///
/// # Errors
///
/// Returns [`Error::EmptyExperiment`] if no track survived.
pub fn reconcile(
    outcomes: Vec<TrackOutcome>,
    factors: &FactorTable,
    author_note: &str,
    verbose: bool,
) -> Result<Experiment> {
    let total = outcomes.len();
    let metrics: IndexMap<_, _> = outcomes
        .into_iter()
        .filter_map(TrackOutcome::into_metrics)
        .map(|m| (m.id().to_string(), m))
        .collect();
    let dropped = total - metrics.len();

    if verbose {
        tracing::info!(dropped, total, "dropped unusable tracks");
    } else {
        tracing::debug!(dropped, total, "dropped unusable tracks");
    }

    let Some(first) = metrics.values().next() else {
        return Err(Error::EmptyExperiment { dropped });
    };
    let summary_variables = first.summary().keys().cloned().collect();

    let survivors: Vec<&str> = metrics.keys().map(String::as_str).collect();
    let factors = factors.reindex(survivors.as_slice())?;

    Experiment::new(
        metrics,
        factors,
        summary_variables,
        ExperimentInfo::new(author_note),
        dropped,
    )
}
