//! Self-contained archive documents
//!
//! An archive embeds everything a track needs, so it can be re-processed
//! without the original raw-data tree:
//!
//! ```text
//! [
//!   "trackset.experiment/1",
//!   { "author_note": …, "processing_note": …, "export_note": …,
//!     "summary_variables": [...] },
//!   [ { "id": …, "target": …, "day": …, "trial": …,
//!       "arena_name": …, "arena": { "arena.bounds": …, … },
//!       "raw.t": "0,0.5,…", "raw.x": …, "raw.y": …, "t": …, "x": …, "y": …,
//!       "factor_<name>": … }, … ]
//! ]
//! ```
//!
//! Sample sequences are comma-joined text (see [`crate::track::blob`]).
//! Scalar identity and factor values may be JSON strings or numbers.

mod export;

pub use export::{export, write};

use crate::arena::ArenaDescription;
use crate::track::blob::{parse_blob, parse_number};
use crate::track::{ArenaSource, EmbeddedPath, Identity, PathSource, TrackRecord};
use crate::{Error, Result};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Schema tag written as the first document element.
pub const SCHEMA_TAG: &str = "trackset.experiment/1";

/// Prefix marking user factors in track records.
pub const FACTOR_PREFIX: &str = "factor_";

/// Experiment-level notes stored in an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveInfo {
    /// Author note
    pub author_note: String,
    /// Processing note of the run that produced the archive
    pub processing_note: String,
    /// Export note
    pub export_note: String,
    /// Summary variable names
    pub summary_variables: Vec<String>,
}

/// A parsed archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveDocument {
    /// Schema tag as written
    pub schema: String,
    /// Experiment-level notes
    pub info: ArchiveInfo,
    /// One record per embedded track, in document order
    pub records: Vec<TrackRecord>,
}

/// Read and parse an archive file.
///
/// # Errors
///
/// Returns [`Error::Io`] or [`Error::Json`] if the file cannot be read as
/// JSON, and [`Error::Archive`] (naming the file) if the document shape is
/// wrong.
pub fn load(path: &Path) -> Result<ArchiveDocument> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    parse(&value).map_err(|e| match e {
        Error::Archive(message) => Error::Archive(format!("{}: {message}", path.display())),
        other => other,
    })
}

/// Parse an archive document.
///
/// Records without an `id` get `Track_<n>` from their 1-based position.
///
/// # Errors
///
/// Returns [`Error::Archive`] if the document is not a
/// `[schema, info, tracks]` triple, and [`Error::DuplicateTrackId`] if two
/// records share an id.
pub fn parse(value: &Value) -> Result<ArchiveDocument> {
    let parts = value
        .as_array()
        .filter(|parts| parts.len() == 3)
        .ok_or_else(|| Error::Archive("expected [schema, info, tracks]".to_string()))?;

    let schema = parts[0]
        .as_str()
        .ok_or_else(|| Error::Archive("schema tag must be a string".to_string()))?
        .to_string();
    if schema != SCHEMA_TAG {
        tracing::warn!(schema = %schema, expected = SCHEMA_TAG, "unknown archive schema tag");
    }

    if !parts[1].is_object() {
        return Err(Error::Archive("experiment info must be an object".to_string()));
    }
    let info: ArchiveInfo = serde_json::from_value(parts[1].clone())?;

    let tracks = parts[2]
        .as_array()
        .ok_or_else(|| Error::Archive("track records must be an array".to_string()))?;

    let mut seen = FxHashSet::default();
    let mut records = Vec::with_capacity(tracks.len());
    for (position, track) in tracks.iter().enumerate() {
        let object = track.as_object().ok_or_else(|| {
            Error::Archive(format!("track record {} is not an object", position + 1))
        })?;
        let record = track_record(object, position);
        if !seen.insert(record.id.clone()) {
            return Err(Error::DuplicateTrackId(record.id));
        }
        records.push(record);
    }

    Ok(ArchiveDocument {
        schema,
        info,
        records,
    })
}

fn track_record(object: &Map<String, Value>, position: usize) -> TrackRecord {
    let text = |key: &str| object.get(key).and_then(scalar_text);
    let arena_name = text("arena_name");

    let id = text("id").unwrap_or_else(|| format!("Track_{}", position + 1));

    let factors: IndexMap<String, Option<String>> = object
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(FACTOR_PREFIX)
                .map(|name| (name.to_string(), scalar_text(value)))
        })
        .collect();

    let arena = match object.get("arena").and_then(Value::as_object) {
        Some(fields) => {
            let mut description: ArenaDescription = fields
                .iter()
                .filter_map(|(key, value)| scalar_text(value).map(|v| (key.clone(), v)))
                .collect();
            if let Some(name) = &arena_name {
                description.entry("name".to_string()).or_insert_with(|| name.clone());
            }
            ArenaSource::Inline(description)
        }
        None => ArenaSource::Missing,
    };

    let blob = |key: &str| match object.get(key) {
        Some(Value::String(s)) => parse_blob(s),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| v.as_f64().unwrap_or_else(|| v.as_str().map_or(f64::NAN, parse_number)))
            .collect(),
        _ => Vec::new(),
    };
    let embedded = EmbeddedPath {
        raw_t: blob("raw.t"),
        raw_x: blob("raw.x"),
        raw_y: blob("raw.y"),
        t: blob("t"),
        x: blob("x"),
        y: blob("y"),
    };

    TrackRecord {
        identity: Identity {
            target: text("target"),
            day: text("day"),
            trial: text("trial"),
            arena: arena_name,
        },
        factors,
        path: PathSource::Embedded(embedded),
        arena,
        id,
    }
}

/// Text of a scalar JSON value; `null` and empty strings are absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
