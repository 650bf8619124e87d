//! Per-track metrics and the metric-computation seam

use crate::arena::ArenaGeometry;
use crate::track::{RawPath, Sample};
use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Output of a metric computation.
///
/// `summary` holds the per-track summary variables; its key set (from the
/// first surviving track) names the experiment's summary variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Additional named values
    pub values: IndexMap<String, f64>,
    /// Summary variables
    pub summary: IndexMap<String, f64>,
}

/// Metric-computation seam.
pub trait MetricComputer: Send + Sync {
    /// Compute metrics for a non-degenerate path.
    ///
    /// # Errors
    ///
    /// Any error aborts the batch.
    fn compute(&self, path: &RawPath, arena: &ArenaGeometry) -> Result<Metrics>;
}

/// Metrics of one surviving track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackMetrics {
    id: String,
    arena: Arc<ArenaGeometry>,
    path: RawPath,
    metrics: Metrics,
}

impl TrackMetrics {
    /// Tag computed metrics with their track.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        arena: Arc<ArenaGeometry>,
        path: RawPath,
        metrics: Metrics,
    ) -> Self {
        Self {
            id: id.into(),
            arena,
            path,
            metrics,
        }
    }

    /// Track id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Arena the track was recorded in.
    #[must_use]
    pub const fn arena(&self) -> &Arc<ArenaGeometry> {
        &self.arena
    }

    /// Path the metrics were computed from.
    #[must_use]
    pub const fn path(&self) -> &RawPath {
        &self.path
    }

    /// Additional named values.
    #[must_use]
    pub const fn values(&self) -> &IndexMap<String, f64> {
        &self.metrics.values
    }

    /// Summary variables.
    #[must_use]
    pub const fn summary(&self) -> &IndexMap<String, f64> {
        &self.metrics.summary
    }

    /// Look up a metric by name, summary first.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics
            .summary
            .get(name)
            .or_else(|| self.metrics.values.get(name))
            .copied()
    }
}

/// Fraction of the arena half-width treated as the wall zone.
const DEFAULT_WALL_ZONE: f64 = 0.1;

/// Small geometric metric set.
///
/// Summary variables, in order: `latency`, `path_length`, `velocity`,
/// `goal_distance`, `goal_crossings`, `wall_zone_fraction`. Distances are
/// multiplied by the arena scale. Goal metrics are `NaN` when the arena has
/// no goal.
#[derive(Debug, Clone, Copy)]
pub struct BasicMetrics {
    wall_zone: f64,
}

impl BasicMetrics {
    /// Create with the default wall zone.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            wall_zone: DEFAULT_WALL_ZONE,
        }
    }

    /// Set the wall zone width as a fraction of the arena half-width.
    #[must_use]
    pub const fn wall_zone(mut self, fraction: f64) -> Self {
        self.wall_zone = fraction;
        self
    }
}

impl BasicMetrics {
    /// Summary variable names, in output order.
    pub const SUMMARY_VARIABLES: [&'static str; 6] = [
        "latency",
        "path_length",
        "velocity",
        "goal_distance",
        "goal_crossings",
        "wall_zone_fraction",
    ];

    /// Every summary variable as `NaN`, for paths with no finite position.
    fn without_coordinates() -> Metrics {
        let mut metrics = Metrics::default();
        for name in Self::SUMMARY_VARIABLES {
            metrics.summary.insert(name.to_string(), f64::NAN);
        }
        metrics.values.insert("samples".to_string(), 0.0);
        metrics
    }
}

impl Default for BasicMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::cast_precision_loss)]
impl MetricComputer for BasicMetrics {
    fn compute(&self, path: &RawPath, arena: &ArenaGeometry) -> Result<Metrics> {
        let samples: Vec<Sample> = path
            .cleaned()
            .iter()
            .copied()
            .filter(|s| s.t.is_finite() && s.x.is_finite() && s.y.is_finite())
            .collect();
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            return Ok(Self::without_coordinates());
        };

        let scale = arena.scale();
        let duration = last.t - first.t;
        let path_length = samples
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .sum::<f64>()
            * scale;

        let goal = arena.goal();
        let latency = goal
            .and_then(|g| samples.iter().find(|s| g.contains(s.x, s.y)))
            .map_or(duration, |s| s.t - first.t);
        let goal_distance = goal.map_or(f64::NAN, |g| {
            samples.iter().map(|s| g.distance(s.x, s.y)).sum::<f64>() / samples.len() as f64 * scale
        });
        let goal_crossings = goal.map_or(f64::NAN, |g| {
            samples
                .windows(2)
                .filter(|w| !g.contains(w[0].x, w[0].y) && g.contains(w[1].x, w[1].y))
                .count() as f64
        });

        let bounds = arena.bounds();
        let zone = bounds.half_width() * self.wall_zone;
        let in_wall_zone = samples
            .iter()
            .filter(|s| bounds.distance_to_edge(s.x, s.y) <= zone)
            .count();

        let mut metrics = Metrics::default();
        metrics.summary.insert("latency".to_string(), latency);
        metrics.summary.insert("path_length".to_string(), path_length);
        metrics.summary.insert(
            "velocity".to_string(),
            if duration > 0.0 { path_length / duration } else { 0.0 },
        );
        metrics.summary.insert("goal_distance".to_string(), goal_distance);
        metrics.summary.insert("goal_crossings".to_string(), goal_crossings);
        metrics.summary.insert(
            "wall_zone_fraction".to_string(),
            in_wall_zone as f64 / samples.len() as f64,
        );
        metrics.values.insert("samples".to_string(), samples.len() as f64);
        metrics.values.insert("initial_x".to_string(), first.x);
        metrics.values.insert("initial_y".to_string(), first.y);
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(points: &[(f64, f64, f64)]) -> RawPath {
        let samples: Vec<Sample> = points.iter().map(|&(t, x, y)| Sample::new(t, x, y)).collect();
        RawPath::new("t", samples.clone(), samples, false)
    }

    #[test]
    fn test_basic_metrics_straight_swim_to_goal() {
        // Arena radius 100, goal at (50, 0) radius 10.
        let arena = ArenaGeometry::test_circle();
        let p = path(&[(0.0, 0.0, 0.0), (1.0, 20.0, 0.0), (2.0, 45.0, 0.0), (3.0, 50.0, 0.0)]);
        let metrics = BasicMetrics::new().compute(&p, &arena).unwrap();

        assert!((metrics.summary["latency"] - 2.0).abs() < 1e-12);
        assert!((metrics.summary["path_length"] - 50.0).abs() < 1e-12);
        assert!((metrics.summary["velocity"] - 50.0 / 3.0).abs() < 1e-12);
        assert!((metrics.summary["goal_crossings"] - 1.0).abs() < f64::EPSILON);
        assert!(metrics.summary["wall_zone_fraction"].abs() < f64::EPSILON);
        assert_eq!(
            metrics.summary.keys().map(String::as_str).collect::<Vec<_>>(),
            BasicMetrics::SUMMARY_VARIABLES
        );
    }

    #[test]
    fn test_basic_metrics_without_goal() {
        let mut description = ArenaGeometry::test_circle().to_description();
        description.shift_remove("goal");
        let arena = ArenaGeometry::from_description("open", &description).unwrap();

        let p = path(&[(0.0, 95.0, 0.0), (4.0, 0.0, 95.0)]);
        let metrics = BasicMetrics::new().compute(&p, &arena).unwrap();

        assert!((metrics.summary["latency"] - 4.0).abs() < f64::EPSILON);
        assert!(metrics.summary["goal_distance"].is_nan());
        assert!((metrics.summary["wall_zone_fraction"] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_track_metrics_lookup() {
        let arena = Arc::new(ArenaGeometry::test_circle());
        let p = path(&[(0.0, 0.0, 0.0), (1.0, 1.0, 0.0)]);
        let metrics = BasicMetrics::new().compute(&p, &arena).unwrap();
        let tracked = TrackMetrics::new("t", arena, p, metrics);

        assert_eq!(tracked.get("samples"), Some(2.0));
        assert!(tracked.get("path_length").is_some());
        assert!(tracked.get("heading_error").is_none());
    }

    #[test]
    fn test_basic_metrics_without_finite_positions() {
        let arena = ArenaGeometry::test_circle();
        let p = path(&[(0.0, f64::NAN, 0.0), (1.0, f64::NAN, 1.0)]);
        let metrics = BasicMetrics::new().compute(&p, &arena).unwrap();

        assert_eq!(
            metrics.summary.keys().map(String::as_str).collect::<Vec<_>>(),
            BasicMetrics::SUMMARY_VARIABLES
        );
        assert!(metrics.summary.values().all(|v| v.is_nan()));
        assert!(metrics.values["samples"].abs() < f64::EPSILON);
    }
}
