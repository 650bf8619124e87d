//! Per-track execution driver
//!
//! Each track is independent: acquire its path, apply the degenerate-path
//! policy, compute metrics. Tracks run sequentially or on a caller-supplied
//! worker pool; outcomes always come back in record order.
//!
//! Workers see only the [`Broadcast`] bundle, built once per batch:
//!
//! ```text
//! Broadcast { arenas, data_dir, records, interpolate }
//!     │
//!     ├── worker 1 ─► TrackOutcome
//!     ├── worker 2 ─► TrackOutcome      (no shared mutable state)
//!     └── worker N ─► TrackOutcome
//! ```

mod outcome;

pub use outcome::{TrackOutcome, UnusableReason, UnusableTrack};

use crate::arena::{ArenaGeometry, ArenaMap, ArenaReader};
use crate::metrics::{MetricComputer, TrackMetrics};
use crate::track::{ArenaSource, EmbeddedPath, PathReader, PathSource, RawPath, TrackRecord};
use crate::{Error, Result};
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Progress callback: `(completed, total)` after every finished track.
pub type ProgressFn = dyn Fn(usize, usize) + Send + Sync;

/// Everything a worker needs, shipped once per batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broadcast {
    /// Shared arena geometry by reference
    pub arenas: ArenaMap,
    /// Directory raw file references are relative to
    pub data_dir: PathBuf,
    /// Normalized track records, in descriptor order
    pub records: Vec<TrackRecord>,
    /// Whether raw paths are resampled
    pub interpolate: bool,
}

/// Execution strategy.
#[derive(Debug, Clone, Copy)]
pub enum Mode<'a> {
    /// Single thread, descriptor order
    Sequential,
    /// Fixed-size worker pool
    Pool(&'a ThreadPool),
}

impl Mode<'_> {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Pool(_) => "pool",
        }
    }
}

/// Runs tracks against the configured collaborators.
pub struct TrackDriver<'a> {
    path_reader: &'a dyn PathReader,
    arena_reader: &'a dyn ArenaReader,
    metrics: &'a dyn MetricComputer,
    progress: Option<&'a (dyn Fn(usize, usize) + Send + Sync + 'a)>,
}

impl<'a> TrackDriver<'a> {
    /// Create a driver.
    #[must_use]
    pub fn new(
        path_reader: &'a dyn PathReader,
        arena_reader: &'a dyn ArenaReader,
        metrics: &'a dyn MetricComputer,
    ) -> Self {
        Self {
            path_reader,
            arena_reader,
            metrics,
            progress: None,
        }
    }

    /// Report progress after every track.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a (dyn Fn(usize, usize) + Send + Sync + 'a)) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run every record in `bundle`, returning one outcome per record in
    /// record order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerFailure`] for the first track that fails
    /// unrecoverably; no partial results are returned.
    pub fn run(&self, bundle: &Broadcast, mode: Mode<'_>) -> Result<Vec<TrackOutcome>> {
        let total = bundle.records.len();
        let completed = AtomicUsize::new(0);
        let run_one = |record: &TrackRecord| {
            let outcome = self.run_track(bundle, record);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(progress) = self.progress {
                progress(done, total);
            }
            outcome
        };

        match mode {
            Mode::Sequential => bundle.records.iter().map(run_one).collect(),
            Mode::Pool(pool) => pool.install(|| bundle.records.par_iter().map(run_one).collect()),
        }
    }

    /// Run a single track.
    ///
    /// # Errors
    ///
    /// Track-local failures (missing file, malformed row) become
    /// [`TrackOutcome::Unusable`]; anything else is [`Error::WorkerFailure`].
    pub fn run_track(&self, bundle: &Broadcast, record: &TrackRecord) -> Result<TrackOutcome> {
        let acquired = match &record.path {
            PathSource::File { .. } => self.acquire_file(bundle, record),
            PathSource::Embedded(embedded) => self.acquire_embedded(record, embedded),
        };

        let (path, arena) = match acquired {
            Ok(acquired) => acquired,
            Err(e) if e.is_track_local() => {
                let unusable = UnusableTrack::from_error(&record.id, e);
                tracing::warn!(track = %record.id, reason = %unusable.reason, "track unusable");
                return Ok(TrackOutcome::Unusable(unusable));
            }
            Err(e) => return Err(worker_failure(&record.id, &e)),
        };

        if path.is_degenerate() {
            let samples = path.usable_samples();
            tracing::warn!(track = %record.id, samples, "degenerate path");
            return Ok(TrackOutcome::Unusable(UnusableTrack::new(
                &record.id,
                UnusableReason::DegeneratePath { samples },
            )));
        }

        let metrics = self
            .metrics
            .compute(&path, &arena)
            .map_err(|e| worker_failure(&record.id, &e))?;
        tracing::debug!(track = %record.id, samples = path.usable_samples(), "track complete");
        Ok(TrackOutcome::Metrics(TrackMetrics::new(
            &record.id, arena, path, metrics,
        )))
    }

    fn acquire_file(
        &self,
        bundle: &Broadcast,
        record: &TrackRecord,
    ) -> Result<(RawPath, Arc<ArenaGeometry>)> {
        let PathSource::File {
            reference, format, ..
        } = &record.path
        else {
            return Err(Error::MalformedTrack(format!(
                "track '{}' has no track file",
                record.id
            )));
        };
        let malformed =
            |what: &str| Error::MalformedTrack(format!("track '{}' has no {what}", record.id));

        let arena = match &record.arena {
            ArenaSource::Shared(reference) => bundle
                .arenas
                .get(reference)
                .cloned()
                .ok_or_else(|| malformed("resolved arena"))?,
            ArenaSource::Inline(description) => {
                Arc::new(self.arena_reader.read_arena(None, Some(description))?)
            }
            ArenaSource::Missing => return Err(malformed("arena reference")),
        };
        let reference = reference.as_deref().ok_or_else(|| malformed("track file"))?;
        let format = format.as_deref().ok_or_else(|| malformed("track file format"))?;
        let index = record.track_index()?;

        let file = bundle.data_dir.join(reference);
        let path = self.path_reader.read_path(
            &file,
            &arena,
            &record.id,
            format,
            index,
            bundle.interpolate,
        )?;
        Ok((path, arena))
    }

    fn acquire_embedded(
        &self,
        record: &TrackRecord,
        embedded: &EmbeddedPath,
    ) -> Result<(RawPath, Arc<ArenaGeometry>)> {
        let ArenaSource::Inline(description) = &record.arena else {
            return Err(Error::MalformedTrack(format!(
                "archive track '{}' has no arena description",
                record.id
            )));
        };
        let arena = self.arena_reader.read_arena(None, Some(description))?;
        Ok((RawPath::from_embedded(&record.id, embedded), Arc::new(arena)))
    }
}

fn worker_failure(track_id: &str, error: &Error) -> Error {
    Error::WorkerFailure {
        track_id: track_id.to_string(),
        message: error.to_string(),
    }
}
