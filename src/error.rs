//! Error types for trackset
//!
//! Fatal errors name the offending file, column or track so the descriptor
//! can be fixed without reading the source.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trackset error types
#[derive(Error, Debug)]
pub enum Error {
    /// Descriptor format could not be determined from the override or extension
    #[error(
        "Unrecognized descriptor format for {}{}\nExpected one of: json, xls, xlsx, csv, tab, tsv, txt",
        .path.display(),
        hint_suffix(.hint)
    )]
    UnrecognizedFormat {
        /// Descriptor path
        path: PathBuf,
        /// Explicit format token, if one was given
        hint: Option<String>,
    },

    /// Reserved descriptor columns are absent
    #[error("Descriptor {} is missing required columns: {}", .path.display(), .missing.join(", "))]
    MissingRequiredColumns {
        /// Descriptor path
        path: PathBuf,
        /// Every missing column, in canonical order
        missing: Vec<String>,
    },

    /// Two descriptor rows declare the same track id
    #[error("Duplicate track id '{0}' in descriptor")]
    DuplicateTrackId(String),

    /// No track produced usable data
    #[error("Experiment is empty: all {dropped} tracks were unusable")]
    EmptyExperiment {
        /// Number of tracks dropped
        dropped: usize,
    },

    /// A track failed in a way that aborts the whole batch
    #[error("Processing failed for track '{track_id}': {message}")]
    WorkerFailure {
        /// Track being processed
        track_id: String,
        /// Underlying failure
        message: String,
    },

    /// Arena geometry could not be loaded or parsed
    #[error("Arena '{reference}' could not be loaded: {message}")]
    Arena {
        /// Arena reference or name
        reference: String,
        /// Underlying failure
        message: String,
    },

    /// Tabular descriptor is malformed
    #[error("Descriptor error: {0}")]
    Descriptor(String),

    /// Archive document is malformed
    #[error("Archive error: {0}")]
    Archive(String),

    /// Raw track file does not exist
    #[error("Track file not found: {}", .0.display())]
    TrackFileNotFound(PathBuf),

    /// Raw track declaration or contents cannot be interpreted
    #[error("Malformed track: {0}")]
    MalformedTrack(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow CSV error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Spreadsheet decoding error
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!(" (format '{h}')"))
        .unwrap_or_default()
}

impl Error {
    /// Whether this error is local to one track and demotes it to unusable
    /// instead of aborting the batch.
    #[must_use]
    pub fn is_track_local(&self) -> bool {
        match self {
            Self::TrackFileNotFound(_) | Self::MalformedTrack(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
