//! Normalized track records and raw paths
//!
//! Both descriptor shapes are adapted into the same [`TrackRecord`] list, so
//! execution and reconciliation have a single code path:
//!
//! ```text
//! tabular row ──┐
//!               ├──► TrackRecord { identity, factors, PathSource, ArenaSource }
//! archive rec ──┘
//! ```

pub mod blob;
mod path;

pub use path::{
    clean_samples, interpolate_samples, PathReader, RawPath, Sample, TextPathReader, TrackFormat,
};

use crate::arena::ArenaDescription;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved identity fields of a track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject identifier (`_TargetID`)
    pub target: Option<String>,
    /// Day (`_Day`)
    pub day: Option<String>,
    /// Trial (`_Trial`)
    pub trial: Option<String>,
    /// Arena reference or name (`_Arena`)
    pub arena: Option<String>,
}

/// Where a track's raw path comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathSource {
    /// Raw file under the data directory, read by a [`PathReader`]
    File {
        /// `_TrackFile`, relative to the data directory
        reference: Option<String>,
        /// `_TrackFileFormat`
        format: Option<String>,
        /// `_TrackIndex` as written in the descriptor
        index: Option<String>,
    },
    /// Samples embedded in an archive record
    Embedded(EmbeddedPath),
}

/// Where a track's arena geometry comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArenaSource {
    /// Reference into the shared arena cache
    Shared(String),
    /// Description embedded in the record
    Inline(ArenaDescription),
    /// No arena was declared
    Missing,
}

/// Sample sequences carried by an archive record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedPath {
    /// Raw times
    pub raw_t: Vec<f64>,
    /// Raw x coordinates
    pub raw_x: Vec<f64>,
    /// Raw y coordinates
    pub raw_y: Vec<f64>,
    /// Cleaned times
    pub t: Vec<f64>,
    /// Cleaned x coordinates
    pub x: Vec<f64>,
    /// Cleaned y coordinates
    pub y: Vec<f64>,
}

/// One declared track, independent of the descriptor format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Track identifier (`_TrackID`)
    pub id: String,
    /// Reserved identity fields
    pub identity: Identity,
    /// User-defined factors in column order
    pub factors: IndexMap<String, Option<String>>,
    /// Raw path source
    pub path: PathSource,
    /// Arena geometry source
    pub arena: ArenaSource,
}

impl TrackRecord {
    /// Parse the declared `_TrackIndex`, if any.
    ///
    /// Spreadsheet cells such as `2.0` are accepted; the index is 1-based.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedTrack`] if the index is not a positive integer.
    pub fn track_index(&self) -> Result<Option<usize>> {
        let PathSource::File {
            index: Some(text), ..
        } = &self.path
        else {
            return Ok(None);
        };

        let malformed = || {
            Error::MalformedTrack(format!(
                "track '{}' has invalid _TrackIndex '{text}'",
                self.id
            ))
        };
        let value: f64 = text.trim().parse().map_err(|_| malformed())?;
        if value.fract() != 0.0 || value < 1.0 || !value.is_finite() {
            return Err(malformed());
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(Some(value as usize))
    }
}
