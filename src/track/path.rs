//! Raw paths and the raw-path reader seam

use super::blob::parse_number;
use super::EmbeddedPath;
use crate::arena::ArenaGeometry;
use crate::descriptor::{tabular, DescriptorTable};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// One (time, x, y) observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Time
    pub t: f64,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Sample {
    /// Create a sample.
    #[must_use]
    pub const fn new(t: f64, x: f64, y: f64) -> Self {
        Self { t, x, y }
    }

    fn is_finite(&self) -> bool {
        self.t.is_finite() && self.x.is_finite() && self.y.is_finite()
    }
}

/// Raw and cleaned samples of one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPath {
    id: String,
    raw: Vec<Sample>,
    cleaned: Vec<Sample>,
    interpolated: bool,
}

impl RawPath {
    /// Create a path from already-cleaned samples.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        raw: Vec<Sample>,
        cleaned: Vec<Sample>,
        interpolated: bool,
    ) -> Self {
        Self {
            id: id.into(),
            raw,
            cleaned,
            interpolated,
        }
    }

    /// Build a path from raw samples, cleaning (and optionally resampling)
    /// them against the arena's trial length.
    #[must_use]
    pub fn from_samples(
        id: impl Into<String>,
        raw: Vec<Sample>,
        arena: &ArenaGeometry,
        interpolate: bool,
    ) -> Self {
        let mut cleaned = clean_samples(&raw, arena.trial_length());
        if interpolate {
            cleaned = interpolate_samples(&cleaned);
        }
        Self::new(id, raw, cleaned, interpolate)
    }

    /// Rebuild a path from archive sample lists, keeping unparsable values as
    /// `NaN`. Shorter lists are padded with `NaN`.
    #[must_use]
    pub fn from_embedded(id: impl Into<String>, embedded: &EmbeddedPath) -> Self {
        let id = id.into();
        let raw = zip_padded(&id, &embedded.raw_t, &embedded.raw_x, &embedded.raw_y);
        let cleaned = zip_padded(&id, &embedded.t, &embedded.x, &embedded.y);
        Self::new(id, raw, cleaned, false)
    }

    /// Track id this path belongs to.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Samples as recorded.
    #[must_use]
    pub fn raw(&self) -> &[Sample] {
        &self.raw
    }

    /// Cleaned samples used for metric computation.
    #[must_use]
    pub fn cleaned(&self) -> &[Sample] {
        &self.cleaned
    }

    /// Whether the cleaned samples were resampled.
    #[must_use]
    pub const fn interpolated(&self) -> bool {
        self.interpolated
    }

    /// Number of cleaned samples with a finite time.
    #[must_use]
    pub fn usable_samples(&self) -> usize {
        self.cleaned.iter().filter(|s| s.t.is_finite()).count()
    }

    /// A path with fewer than two usable samples carries no trajectory.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.usable_samples() < 2
    }
}

/// Zip sample columns, padding the shorter ones with `NaN`.
fn zip_padded(id: &str, t: &[f64], x: &[f64], y: &[f64]) -> Vec<Sample> {
    let len = t.len().max(x.len()).max(y.len());
    if t.len() != len || x.len() != len || y.len() != len {
        tracing::warn!(
            track = id,
            t = t.len(),
            x = x.len(),
            y = y.len(),
            "sample columns differ in length, padding with NaN"
        );
    }
    let at = |column: &[f64], i: usize| column.get(i).copied().unwrap_or(f64::NAN);
    (0..len)
        .map(|i| Sample::new(at(t, i), at(x, i), at(y, i)))
        .collect()
}

/// Drop non-finite samples and samples past `trial_length`, then order by
/// time keeping the first sample of each time point.
#[must_use]
pub fn clean_samples(raw: &[Sample], trial_length: Option<f64>) -> Vec<Sample> {
    let mut cleaned: Vec<Sample> = raw
        .iter()
        .copied()
        .filter(Sample::is_finite)
        .filter(|s| trial_length.map_or(true, |limit| s.t <= limit))
        .collect();
    cleaned.sort_by(|a, b| a.t.total_cmp(&b.t));
    cleaned.dedup_by(|later, earlier| later.t == earlier.t);
    cleaned
}

/// Upper bound on resampled length, as a multiple of the input length.
const MAX_RESAMPLE_FACTOR: usize = 16;

/// Linearly resample time-ordered samples at their median sampling interval.
///
/// Inputs with fewer than two samples are returned unchanged, as are inputs
/// whose grid would exceed `MAX_RESAMPLE_FACTOR` times their length.
#[must_use]
pub fn interpolate_samples(samples: &[Sample]) -> Vec<Sample> {
    if samples.len() < 2 {
        return samples.to_vec();
    }

    let mut steps: Vec<f64> = samples.windows(2).map(|w| w[1].t - w[0].t).collect();
    steps.sort_by(f64::total_cmp);
    let step = steps[steps.len() / 2];
    if step <= 0.0 || !step.is_finite() {
        return samples.to_vec();
    }

    let start = samples[0].t;
    let span = samples[samples.len() - 1].t - start;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = ((span / step).floor() as usize).saturating_add(1);
    let limit = samples.len().saturating_mul(MAX_RESAMPLE_FACTOR);
    if count > limit {
        tracing::warn!(
            samples = samples.len(),
            grid = count,
            step,
            "sampling interval too irregular to resample, keeping samples"
        );
        return samples.to_vec();
    }

    let mut out = Vec::with_capacity(count);
    let mut segment = 0;
    for i in 0..count {
        #[allow(clippy::cast_precision_loss)]
        let t = (i as f64).mul_add(step, start);
        while segment + 2 < samples.len() && samples[segment + 1].t < t {
            segment += 1;
        }
        let (a, b) = (samples[segment], samples[segment + 1]);
        let frac = ((t - a.t) / (b.t - a.t)).clamp(0.0, 1.0);
        out.push(Sample::new(
            t,
            frac.mul_add(b.x - a.x, a.x),
            frac.mul_add(b.y - a.y, a.y),
        ));
    }
    out
}

/// Raw-path reader seam.
///
/// Implementations must not fail for a merely short recording: return the
/// few samples present and let the caller apply the degenerate-path policy.
pub trait PathReader: Send + Sync {
    /// Read the track stored in `file`.
    ///
    /// # Errors
    ///
    /// [`Error::TrackFileNotFound`] and [`Error::MalformedTrack`] mark the
    /// track unusable; any other error aborts the batch.
    fn read_path(
        &self,
        file: &Path,
        arena: &ArenaGeometry,
        id: &str,
        format: &str,
        index: Option<usize>,
        interpolate: bool,
    ) -> Result<RawPath>;
}

/// Raw recording formats understood by [`TextPathReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFormat {
    /// Comma-delimited `Time,X,Y`
    RawCsv,
    /// Tab-delimited `Time,X,Y`
    RawTab,
    /// Comma-delimited `Track,Time,X,Y` holding several tracks
    IndexedCsv,
}

impl TrackFormat {
    const fn delimiter(self) -> u8 {
        match self {
            Self::RawCsv | Self::IndexedCsv => b',',
            Self::RawTab => b'\t',
        }
    }
}

impl FromStr for TrackFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw.csv" => Ok(Self::RawCsv),
            "raw.tab" | "raw.tsv" => Ok(Self::RawTab),
            "raw.indexed.csv" => Ok(Self::IndexedCsv),
            other => Err(Error::MalformedTrack(format!(
                "unknown track format '{other}'"
            ))),
        }
    }
}

/// Reader for delimited text recordings with a header row.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPathReader;

impl TextPathReader {
    /// Create a reader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn samples(table: &DescriptorTable, file: &Path, select: Option<usize>) -> Result<Vec<Sample>> {
        let column = |name: &str| {
            table
                .columns()
                .iter()
                .position(|c| c.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    Error::MalformedTrack(format!("{} has no '{name}' column", file.display()))
                })
        };
        let (t, x, y) = (column("time")?, column("x")?, column("y")?);
        let track = select.map(|_| column("track")).transpose()?;
        #[allow(clippy::cast_precision_loss)]
        let wanted = select.map(|index| index as f64);

        let number = |row: &[Option<String>], col: usize| {
            row.get(col)
                .and_then(Option::as_deref)
                .map_or(f64::NAN, parse_number)
        };

        Ok(table
            .rows()
            .iter()
            .filter(|row| match (track, wanted) {
                (Some(col), Some(wanted)) => number(row.as_slice(), col) == wanted,
                _ => true,
            })
            .map(|row| {
                let row = row.as_slice();
                Sample::new(number(row, t), number(row, x), number(row, y))
            })
            .collect())
    }
}

impl PathReader for TextPathReader {
    fn read_path(
        &self,
        file: &Path,
        arena: &ArenaGeometry,
        id: &str,
        format: &str,
        index: Option<usize>,
        interpolate: bool,
    ) -> Result<RawPath> {
        let format: TrackFormat = format.parse()?;
        if !file.is_file() {
            return Err(Error::TrackFileNotFound(file.to_path_buf()));
        }

        let table = tabular::read_delimited(file, format.delimiter()).map_err(|e| match e {
            Error::Arrow(e) => Error::MalformedTrack(format!("{}: {e}", file.display())),
            other => other,
        })?;

        let select = match format {
            TrackFormat::IndexedCsv => Some(index.unwrap_or(1)),
            TrackFormat::RawCsv | TrackFormat::RawTab => {
                if index.is_some() {
                    tracing::debug!(track = id, "ignoring _TrackIndex for single-track format");
                }
                None
            }
        };

        let raw = Self::samples(&table, file, select)?;
        Ok(RawPath::from_samples(id, raw, arena, interpolate))
    }
}
