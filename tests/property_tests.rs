//! Property-based tests for trackset
//!
//! - Reconciliation keeps metrics and factors aligned for any survival mask
//! - Cleaned paths are finite, time-ordered and within the trial length
//! - Resampling stays inside the recorded time span and value range

use indexmap::IndexMap;
use proptest::prelude::*;
use std::sync::Arc;
use trackset::arena::{parse_description, ArenaGeometry};
use trackset::execution::{TrackOutcome, UnusableReason, UnusableTrack};
use trackset::experiment::{reconcile, FactorTable};
use trackset::metrics::{Metrics, TrackMetrics};
use trackset::track::{
    clean_samples, interpolate_samples, ArenaSource, Identity, PathSource, RawPath, Sample,
    TrackRecord,
};
use trackset::Error;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

fn arena() -> Arc<ArenaGeometry> {
    let description = parse_description("pool", "arena.bounds = circle 0 0 100").unwrap();
    Arc::new(ArenaGeometry::from_description("pool", &description).unwrap())
}

fn record(id: &str, factor: usize) -> TrackRecord {
    let mut factors = IndexMap::new();
    factors.insert("Group".to_string(), Some(format!("g{}", factor % 3)));
    TrackRecord {
        id: id.to_string(),
        identity: Identity {
            target: Some(format!("m{factor}")),
            ..Identity::default()
        },
        factors,
        path: PathSource::File {
            reference: None,
            format: None,
            index: None,
        },
        arena: ArenaSource::Missing,
    }
}

fn outcome(id: &str, usable: bool, arena: &Arc<ArenaGeometry>) -> TrackOutcome {
    if usable {
        let mut metrics = Metrics::default();
        metrics.summary.insert("latency".to_string(), 1.0);
        TrackOutcome::Metrics(TrackMetrics::new(
            id,
            Arc::clone(arena),
            RawPath::new(id, Vec::new(), Vec::new(), false),
            metrics,
        ))
    } else {
        TrackOutcome::Unusable(UnusableTrack::new(
            id,
            UnusableReason::DegeneratePath { samples: 1 },
        ))
    }
}

/// Time values, with an occasional non-finite entry
fn arb_time() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -10.0f64..200.0,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
    ]
}

fn arb_samples() -> impl Strategy<Value = Vec<Sample>> {
    proptest::collection::vec(
        (arb_time(), -100.0f64..100.0, -100.0f64..100.0).prop_map(|(t, x, y)| Sample::new(t, x, y)),
        0..60,
    )
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: survivors keep input order in both metrics and factors
    #[test]
    fn prop_reconcile_keeps_alignment(mask in proptest::collection::vec(any::<bool>(), 1..40)) {
        let ids: Vec<String> = (0..mask.len()).map(|i| format!("Track_{}", i + 1)).collect();
        let records: Vec<TrackRecord> =
            ids.iter().enumerate().map(|(i, id)| record(id, i)).collect();
        let factors = FactorTable::from_records(&records);
        let arena = arena();
        let outcomes: Vec<TrackOutcome> = ids
            .iter()
            .zip(&mask)
            .map(|(id, &usable)| outcome(id, usable, &arena))
            .collect();

        let expected: Vec<&str> = ids
            .iter()
            .zip(&mask)
            .filter(|(_, usable)| **usable)
            .map(|(id, _)| id.as_str())
            .collect();

        match reconcile(outcomes, &factors, "", false) {
            Ok(experiment) => {
                prop_assert_eq!(experiment.track_ids().collect::<Vec<_>>(), expected.clone());
                prop_assert_eq!(
                    experiment.factors().row_names().collect::<Vec<_>>(),
                    expected.clone()
                );
                prop_assert_eq!(experiment.dropped(), mask.len() - expected.len());
                for id in &expected {
                    prop_assert_eq!(
                        experiment.factors().row(id).unwrap(),
                        factors.row(id).unwrap()
                    );
                }
            }
            Err(Error::EmptyExperiment { dropped }) => {
                prop_assert!(expected.is_empty());
                prop_assert_eq!(dropped, mask.len());
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    /// Property: cleaned samples are finite, strictly time-ordered and bounded
    #[test]
    fn prop_clean_samples_ordered_and_bounded(
        raw in arb_samples(),
        limit in proptest::option::of(0.0f64..150.0),
    ) {
        let cleaned = clean_samples(&raw, limit);

        prop_assert!(cleaned.len() <= raw.len());
        prop_assert!(cleaned.iter().all(|s| s.t.is_finite() && s.x.is_finite() && s.y.is_finite()));
        prop_assert!(cleaned.windows(2).all(|w| w[0].t < w[1].t));
        if let Some(limit) = limit {
            prop_assert!(cleaned.iter().all(|s| s.t <= limit));
        }
    }

    /// Property: resampling never leaves the recorded span or value range
    #[test]
    fn prop_interpolation_stays_in_range(raw in arb_samples()) {
        let cleaned = clean_samples(&raw, None);
        let resampled = interpolate_samples(&cleaned);

        if cleaned.len() >= 2 {
            let (first, last) = (cleaned[0].t, cleaned[cleaned.len() - 1].t);
            let tolerance = 1e-9 * (last - first).abs().max(1.0);
            let (min_x, max_x) = cleaned
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| (lo.min(s.x), hi.max(s.x)));

            prop_assert!(!resampled.is_empty());
            prop_assert!((resampled[0].t - first).abs() <= tolerance);
            prop_assert!(resampled.windows(2).all(|w| w[0].t < w[1].t));
            prop_assert!(resampled.iter().all(|s| s.t <= last + tolerance));
            prop_assert!(resampled
                .iter()
                .all(|s| s.x >= min_x - tolerance && s.x <= max_x + tolerance));
        } else {
            prop_assert_eq!(resampled, cleaned);
        }
    }
}
