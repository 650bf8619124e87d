//! Experiment dataset and the reader that builds it
//!
//! ## Structure
//!
//! ```text
//! Experiment
//!   ├── metrics:  track id ─► TrackMetrics     ┐ same ids,
//!   ├── factors:  track id ─► FactorRow        ┘ same order
//!   ├── summary_variables (from the first surviving track)
//!   └── info: author note, processing note, export note
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trackset::experiment::{ExperimentOptions, read_experiment};
//!
//! let options = ExperimentOptions {
//!     data_dir: Some("raw".into()),
//!     ..ExperimentOptions::default()
//! };
//! let experiment = read_experiment("descriptor.tab", options)?;
//! println!("{} tracks, {} dropped", experiment.len(), experiment.dropped());
//! # Ok::<(), trackset::Error>(())
//! ```

mod dataset;
mod factors;
mod info;
mod reader;
mod reconcile;

pub use dataset::Experiment;
pub use factors::{FactorRow, FactorTable};
pub use info::{ExperimentInfo, ExperimentInfoBuilder};
pub use reader::{read_experiment, ExperimentOptions, ExperimentReader, ExperimentReaderBuilder};
pub use reconcile::reconcile;
