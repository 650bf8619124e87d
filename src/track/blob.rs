//! Numeric text helpers
//!
//! Archive documents store sample sequences as comma-joined text. A value
//! that fails to parse becomes `NaN` so one bad entry never discards a track.

/// Text written for values that are not finite numbers.
pub const MISSING: &str = "NA";

/// Parse one numeric cell, yielding `NaN` when it is not a number.
#[must_use]
pub fn parse_number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse a comma-joined blob into a numeric sequence.
///
/// An empty (or all-whitespace) blob is an empty sequence.
///
/// # Example
///
/// ```rust
/// use trackset::track::blob::parse_blob;
///
/// let values = parse_blob("0, 0.5,x,1e1");
/// assert_eq!(values.len(), 4);
/// assert!(values[2].is_nan());
/// assert!((values[3] - 10.0).abs() < f64::EPSILON);
/// ```
#[must_use]
pub fn parse_blob(text: &str) -> Vec<f64> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(',').map(parse_number).collect()
}

/// Join values into a blob using the shortest round-trip representation.
#[must_use]
pub fn format_blob<I>(values: I) -> String
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .map(|v| if v.is_nan() { MISSING.to_string() } else { v.to_string() })
        .collect::<Vec<_>>()
        .join(",")
}
