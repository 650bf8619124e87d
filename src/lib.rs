//! # Trackset: Experiment Datasets from Navigation Tracks
//!
//! **Version**: 0.1.0
//!
//! Trackset assembles one aligned [`Experiment`] from many independently
//! recorded spatial-navigation trials. Tracks are declared either in a
//! tabular descriptor (CSV, tab-delimited or spreadsheet) that points into a
//! raw-data directory tree, or in a self-contained archive document with the
//! paths and arena geometry embedded.
//!
//! ## Pipeline
//!
//! ```text
//! descriptor ─► format detection ─► {tabular | archive} loader
//!            ─► schema validation / factor split ─► TrackRecord list
//!            ─► arena cache ─► per-track execution (sequential | pool)
//!            ─► reconciliation ─► Experiment
//! ```
//!
//! The central invariant: the metrics collection and the factor table carry
//! the same track ids in the same order, whichever tracks were dropped.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trackset::experiment::ExperimentReader;
//!
//! let reader = ExperimentReader::builder()
//!     .interpolate(true)
//!     .author_note("Cohort 3, reversal phase")
//!     .build();
//!
//! let experiment = reader.read("data/experiment.csv")?;
//! for id in experiment.track_ids() {
//!     println!("{id}: {:?}", experiment.factors().get(id, "_Day"));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod archive;
pub mod arena;
pub mod descriptor;
pub mod error;
pub mod execution;
pub mod experiment;
pub mod format;
pub mod metrics;
pub mod track;

pub use error::{Error, Result};
pub use experiment::{read_experiment, Experiment, ExperimentOptions, ExperimentReader};
pub use format::DescriptorFormat;

/// Crate version stamped into processing notes
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
