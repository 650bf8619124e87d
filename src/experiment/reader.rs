//! Configured entry point for reading experiments

use super::{reconcile, Experiment, FactorTable};
use crate::arena::{resolve_shared, ArenaMap, ArenaReader, DescriptionArenaReader};
use crate::descriptor::{schema, tabular};
use crate::execution::{Broadcast, Mode, ProgressFn, TrackDriver};
use crate::metrics::{BasicMetrics, MetricComputer};
use crate::track::{PathReader, TextPathReader, TrackRecord};
use crate::{archive, DescriptorFormat, Result};
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Reader options.
///
/// Every field has a default, so partial option sets deserialize:
///
/// ```rust
/// use trackset::ExperimentOptions;
///
/// let options: ExperimentOptions = serde_json::from_str(r#"{"interpolate": true}"#).unwrap();
/// assert!(options.interpolate);
/// assert!(options.format.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentOptions {
    /// Explicit format token, overriding the extension
    pub format: Option<String>,
    /// Directory arena references are relative to (default: descriptor's directory)
    pub project_dir: Option<PathBuf>,
    /// Directory raw file references are relative to (default: descriptor's directory)
    pub data_dir: Option<PathBuf>,
    /// Resample raw paths at a uniform step
    pub interpolate: bool,
    /// Note recorded in the experiment's provenance
    pub author_note: String,
    /// Log dropped tracks at info level
    pub verbose: bool,
}

/// Reads descriptors into experiments.
///
/// Collaborators default to [`TextPathReader`], [`DescriptionArenaReader`]
/// and [`BasicMetrics`]. Without a worker pool, tracks run sequentially.
#[derive(Clone)]
pub struct ExperimentReader {
    options: ExperimentOptions,
    path_reader: Arc<dyn PathReader>,
    arena_reader: Arc<dyn ArenaReader>,
    metrics: Arc<dyn MetricComputer>,
    pool: Option<Arc<ThreadPool>>,
    progress: Option<Arc<ProgressFn>>,
}

impl ExperimentReader {
    /// Reader with default collaborators.
    #[must_use]
    pub fn new(options: ExperimentOptions) -> Self {
        Self::builder().options(options).build()
    }

    /// Create a reader builder.
    #[must_use]
    pub fn builder() -> ExperimentReaderBuilder {
        ExperimentReaderBuilder::default()
    }

    /// Reader options.
    #[must_use]
    pub const fn options(&self) -> &ExperimentOptions {
        &self.options
    }

    /// Read a descriptor into an experiment.
    ///
    /// # Errors
    ///
    /// - [`Error::UnrecognizedFormat`](crate::Error::UnrecognizedFormat) if the format cannot
    ///   be determined
    /// - [`Error::MissingRequiredColumns`](crate::Error::MissingRequiredColumns) for an
    ///   incomplete tabular descriptor
    /// - [`Error::Arena`](crate::Error::Arena) if a shared arena cannot be loaded
    /// - [`Error::WorkerFailure`](crate::Error::WorkerFailure) if a track fails unrecoverably
    /// - [`Error::EmptyExperiment`](crate::Error::EmptyExperiment) if no track is usable
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Experiment> {
        let path = path.as_ref();
        let started = Instant::now();
        let format = DescriptorFormat::detect(path, self.options.format.as_deref())?;
        let base = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
        let project_dir = self.options.project_dir.clone().unwrap_or_else(|| base.clone());
        let data_dir = self.options.data_dir.clone().unwrap_or(base);

        let (records, arenas, author_note) = match format {
            DescriptorFormat::Archive => {
                let document = archive::load(path)?;
                let note = if self.options.author_note.is_empty() {
                    document.info.author_note
                } else {
                    self.options.author_note.clone()
                };
                (document.records, ArenaMap::default(), note)
            }
            tabular_format => {
                let (records, arenas) = self.load_tabular(path, tabular_format, &project_dir)?;
                (records, arenas, self.options.author_note.clone())
            }
        };

        let mode = self
            .pool
            .as_deref()
            .map_or(Mode::Sequential, Mode::Pool);
        tracing::info!(
            path = %path.display(),
            %format,
            tracks = records.len(),
            arenas = arenas.len(),
            mode = mode.name(),
            "processing experiment"
        );

        let factors = FactorTable::from_records(&records);
        let bundle = Arc::new(Broadcast {
            arenas,
            data_dir,
            records,
            interpolate: self.options.interpolate,
        });

        let mut driver = TrackDriver::new(
            self.path_reader.as_ref(),
            self.arena_reader.as_ref(),
            self.metrics.as_ref(),
        );
        if let Some(progress) = self.progress.as_deref() {
            driver = driver.with_progress(progress);
        }
        let outcomes = driver.run(&bundle, mode)?;

        let experiment = reconcile(outcomes, &factors, &author_note, self.options.verbose)?;
        tracing::info!(
            tracks = experiment.len(),
            dropped = experiment.dropped(),
            elapsed = ?started.elapsed(),
            "experiment ready"
        );
        Ok(experiment)
    }

    fn load_tabular(
        &self,
        path: &Path,
        format: DescriptorFormat,
        project_dir: &Path,
    ) -> Result<(Vec<TrackRecord>, ArenaMap)> {
        let table = tabular::load(path, format)?;
        schema::validate(&table, path)?;
        let records = schema::track_records(&table)?;
        let cache = resolve_shared(
            &records,
            project_dir,
            self.arena_reader.as_ref(),
            self.pool.as_deref(),
        )?;
        tracing::debug!(arenas = cache.len(), loads = cache.loads(), "arena cache filled");
        Ok((records, cache.snapshot()))
    }
}

/// Builder for [`ExperimentReader`].
pub struct ExperimentReaderBuilder {
    options: ExperimentOptions,
    path_reader: Arc<dyn PathReader>,
    arena_reader: Arc<dyn ArenaReader>,
    metrics: Arc<dyn MetricComputer>,
    pool: Option<Arc<ThreadPool>>,
    progress: Option<Arc<ProgressFn>>,
}

impl Default for ExperimentReaderBuilder {
    fn default() -> Self {
        Self {
            options: ExperimentOptions::default(),
            path_reader: Arc::new(TextPathReader::new()),
            arena_reader: Arc::new(DescriptionArenaReader::new()),
            metrics: Arc::new(BasicMetrics::new()),
            pool: None,
            progress: None,
        }
    }
}

impl ExperimentReaderBuilder {
    /// Replace all options.
    #[must_use]
    pub fn options(mut self, options: ExperimentOptions) -> Self {
        self.options = options;
        self
    }

    /// Set an explicit format token.
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.options.format = Some(format.into());
        self
    }

    /// Set the directory arena references are relative to.
    #[must_use]
    pub fn project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.project_dir = Some(dir.into());
        self
    }

    /// Set the directory raw file references are relative to.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.data_dir = Some(dir.into());
        self
    }

    /// Resample raw paths at a uniform step.
    #[must_use]
    pub const fn interpolate(mut self, interpolate: bool) -> Self {
        self.options.interpolate = interpolate;
        self
    }

    /// Set the author note.
    #[must_use]
    pub fn author_note(mut self, note: impl Into<String>) -> Self {
        self.options.author_note = note.into();
        self
    }

    /// Log dropped tracks at info level.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.options.verbose = verbose;
        self
    }

    /// Use a custom raw path reader.
    #[must_use]
    pub fn path_reader(mut self, reader: impl PathReader + 'static) -> Self {
        self.path_reader = Arc::new(reader);
        self
    }

    /// Use a custom arena reader.
    #[must_use]
    pub fn arena_reader(mut self, reader: impl ArenaReader + 'static) -> Self {
        self.arena_reader = Arc::new(reader);
        self
    }

    /// Use a custom metric computation.
    #[must_use]
    pub fn metrics(mut self, metrics: impl MetricComputer + 'static) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    /// Run tracks and arena loads on a worker pool.
    #[must_use]
    pub fn pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Report `(completed, total)` after every track.
    #[must_use]
    pub fn progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Build the reader.
    #[must_use]
    pub fn build(self) -> ExperimentReader {
        ExperimentReader {
            options: self.options,
            path_reader: self.path_reader,
            arena_reader: self.arena_reader,
            metrics: self.metrics,
            pool: self.pool,
            progress: self.progress,
        }
    }
}

/// Read a descriptor with default collaborators, sequentially.
///
/// # Errors
///
/// See [`ExperimentReader::read`].
pub fn read_experiment(path: impl AsRef<Path>, options: ExperimentOptions) -> Result<Experiment> {
    ExperimentReader::new(options).read(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_options() {
        let reader = ExperimentReader::builder()
            .format("csv")
            .interpolate(true)
            .author_note("n")
            .verbose(true)
            .data_dir("raw")
            .build();

        assert_eq!(reader.options().format.as_deref(), Some("csv"));
        assert!(reader.options().interpolate);
        assert!(reader.options().verbose);
        assert_eq!(reader.options().author_note, "n");
        assert_eq!(reader.options().data_dir, Some(PathBuf::from("raw")));
        assert!(reader.options().project_dir.is_none());
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: ExperimentOptions =
            serde_json::from_str(r#"{"format": "tab", "author_note": "pilot"}"#).unwrap();
        assert_eq!(options.format.as_deref(), Some("tab"));
        assert_eq!(options.author_note, "pilot");
        assert!(!options.interpolate);
    }

    #[test]
    fn test_unknown_extension_fails_before_reading() {
        let err =
            read_experiment("does/not/exist.parquet", ExperimentOptions::default()).unwrap_err();
        assert!(matches!(err, crate::Error::UnrecognizedFormat { .. }));
    }
}
