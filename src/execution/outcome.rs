//! Per-track outcomes

use crate::metrics::TrackMetrics;
use crate::Error;
use std::fmt;
use std::path::PathBuf;

/// Why a track produced no usable data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnusableReason {
    /// Fewer than two usable time samples
    DegeneratePath {
        /// Usable samples found
        samples: usize,
    },
    /// The raw file does not exist
    MissingTrackFile(PathBuf),
    /// The row or recording could not be interpreted
    Malformed(String),
}

impl fmt::Display for UnusableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegeneratePath { samples } => {
                write!(f, "degenerate path ({samples} usable samples)")
            }
            Self::MissingTrackFile(path) => write!(f, "track file not found: {}", path.display()),
            Self::Malformed(message) => write!(f, "{message}"),
        }
    }
}

/// A track excluded from the experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusableTrack {
    /// Track id
    pub id: String,
    /// Reason for exclusion
    pub reason: UnusableReason,
}

impl UnusableTrack {
    /// Create an exclusion record.
    #[must_use]
    pub fn new(id: impl Into<String>, reason: UnusableReason) -> Self {
        Self {
            id: id.into(),
            reason,
        }
    }

    /// Classify a track-local error.
    #[must_use]
    pub fn from_error(id: impl Into<String>, error: Error) -> Self {
        let reason = match error {
            Error::TrackFileNotFound(path) => UnusableReason::MissingTrackFile(path),
            Error::MalformedTrack(message) => UnusableReason::Malformed(message),
            other => UnusableReason::Malformed(other.to_string()),
        };
        Self::new(id, reason)
    }
}

/// Result of running one track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    /// Metrics were computed
    Metrics(TrackMetrics),
    /// The track is excluded
    Unusable(UnusableTrack),
}

impl TrackOutcome {
    /// Track id of either variant.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Metrics(m) => m.id(),
            Self::Unusable(u) => &u.id,
        }
    }

    /// Whether metrics were computed.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        matches!(self, Self::Metrics(_))
    }

    /// Metrics, if usable.
    #[must_use]
    pub fn into_metrics(self) -> Option<TrackMetrics> {
        match self {
            Self::Metrics(m) => Some(m),
            Self::Unusable(_) => None,
        }
    }
}
