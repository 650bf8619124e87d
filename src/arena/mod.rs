//! Arena geometry and the arena-reader seam
//!
//! An arena is described by `key = value` lines:
//!
//! ```text
//! # Morris water maze, pool B
//! type = mwm
//! time.units = s
//! trial.length = 120
//! arena.bounds = circle 133 103 95
//! goal = circle 121 52 10
//! old.goal = circle 160 150 10
//! scale = 0.5
//! ```
//!
//! The same keys form the inline [`ArenaDescription`] embedded in archives.

mod cache;

pub use cache::{resolve_shared, shared_references, ArenaCache, ArenaMap};

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Ordered `key -> text` arena description.
pub type ArenaDescription = IndexMap<String, String>;

/// Circular region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Centre x
    pub x: f64,
    /// Centre y
    pub y: f64,
    /// Radius
    pub radius: f64,
}

impl Circle {
    /// Distance from the centre.
    #[must_use]
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        (x - self.x).hypot(y - self.y)
    }

    /// Whether the point lies inside the circle.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.distance(x, y) <= self.radius
    }
}

/// Arena boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Circular pool
    Circle(Circle),
    /// Axis-aligned square given by centre and side length
    Square {
        /// Centre x
        x: f64,
        /// Centre y
        y: f64,
        /// Side length
        side: f64,
    },
}

impl Shape {
    /// Distance from a point to the boundary (positive inside).
    #[must_use]
    pub fn distance_to_edge(&self, x: f64, y: f64) -> f64 {
        match *self {
            Self::Circle(c) => c.radius - c.distance(x, y),
            Self::Square { x: cx, y: cy, side } => {
                let half = side / 2.0;
                (half - (x - cx).abs()).min(half - (y - cy).abs())
            }
        }
    }

    /// Half the characteristic width (radius, or half the side).
    #[must_use]
    pub fn half_width(&self) -> f64 {
        match *self {
            Self::Circle(c) => c.radius,
            Self::Square { side, .. } => side / 2.0,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Circle(c) => write!(f, "circle {} {} {}", c.x, c.y, c.radius),
            Self::Square { x, y, side } => write!(f, "square {x} {y} {side}"),
        }
    }
}

fn parse_numbers<const N: usize>(key: &str, parts: &[&str]) -> Result<[f64; N]> {
    let invalid = || Error::Arena {
        reference: key.to_string(),
        message: format!("expected {N} numbers, got '{}'", parts.join(" ")),
    };
    if parts.len() != N {
        return Err(invalid());
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.parse().map_err(|_| invalid())?;
    }
    Ok(out)
}

fn parse_shape(key: &str, text: &str) -> Result<Shape> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    match parts.split_first() {
        Some((kind, rest)) if kind.eq_ignore_ascii_case("circle") => {
            let [x, y, radius] = parse_numbers::<3>(key, rest)?;
            Ok(Shape::Circle(Circle { x, y, radius }))
        }
        Some((kind, rest)) if kind.eq_ignore_ascii_case("square") => {
            let [x, y, side] = parse_numbers::<3>(key, rest)?;
            Ok(Shape::Square { x, y, side })
        }
        _ => Err(Error::Arena {
            reference: key.to_string(),
            message: format!("unsupported shape '{text}'"),
        }),
    }
}

fn parse_circle(key: &str, text: &str) -> Result<Circle> {
    match parse_shape(key, text)? {
        Shape::Circle(c) => Ok(c),
        Shape::Square { .. } => Err(Error::Arena {
            reference: key.to_string(),
            message: "landmarks must be circles".to_string(),
        }),
    }
}

/// Immutable enclosure geometry shared by every track recorded in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaGeometry {
    name: String,
    kind: String,
    time_units: String,
    trial_length: Option<f64>,
    bounds: Shape,
    goal: Option<Circle>,
    old_goal: Option<Circle>,
    scale: f64,
}

impl ArenaGeometry {
    /// Build geometry from a description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Arena`] if `arena.bounds` is absent or any value is
    /// malformed.
    pub fn from_description(
        name: impl Into<String>,
        description: &ArenaDescription,
    ) -> Result<Self> {
        let name = name.into();
        let wrap = |e: Error| match e {
            Error::Arena { reference, message } => Error::Arena {
                reference: name.clone(),
                message: format!("{reference}: {message}"),
            },
            other => other,
        };
        let number = |key: &str| -> Result<Option<f64>> {
            description
                .get(key)
                .map(|v| {
                    v.trim().parse::<f64>().map_err(|_| Error::Arena {
                        reference: name.clone(),
                        message: format!("{key}: '{v}' is not a number"),
                    })
                })
                .transpose()
        };

        let bounds = description
            .get("arena.bounds")
            .ok_or_else(|| Error::Arena {
                reference: name.clone(),
                message: "missing arena.bounds".to_string(),
            })
            .and_then(|text| parse_shape("arena.bounds", text).map_err(wrap))?;
        let goal = description
            .get("goal")
            .map(|text| parse_circle("goal", text).map_err(wrap))
            .transpose()?;
        let old_goal = description
            .get("old.goal")
            .map(|text| parse_circle("old.goal", text).map_err(wrap))
            .transpose()?;

        let trial_length = number("trial.length")?;
        let scale = number("scale")?.unwrap_or(1.0);

        Ok(Self {
            kind: description.get("type").cloned().unwrap_or_else(|| "open".to_string()),
            time_units: description.get("time.units").cloned().unwrap_or_else(|| "s".to_string()),
            trial_length,
            scale,
            bounds,
            goal,
            old_goal,
            name,
        })
    }

    /// Render the geometry back to its description form.
    #[must_use]
    pub fn to_description(&self) -> ArenaDescription {
        let mut description = ArenaDescription::new();
        description.insert("name".to_string(), self.name.clone());
        description.insert("type".to_string(), self.kind.clone());
        description.insert("time.units".to_string(), self.time_units.clone());
        if let Some(length) = self.trial_length {
            description.insert("trial.length".to_string(), length.to_string());
        }
        description.insert("arena.bounds".to_string(), self.bounds.to_string());
        if let Some(goal) = self.goal {
            description.insert("goal".to_string(), Shape::Circle(goal).to_string());
        }
        if let Some(old_goal) = self.old_goal {
            description.insert("old.goal".to_string(), Shape::Circle(old_goal).to_string());
        }
        description.insert("scale".to_string(), self.scale.to_string());
        description
    }

    /// Arena name (the reference it was loaded from).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arena type tag, e.g. `mwm`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Time units of the recordings.
    #[must_use]
    pub fn time_units(&self) -> &str {
        &self.time_units
    }

    /// Maximum trial duration, if declared.
    #[must_use]
    pub const fn trial_length(&self) -> Option<f64> {
        self.trial_length
    }

    /// Arena boundary.
    #[must_use]
    pub const fn bounds(&self) -> Shape {
        self.bounds
    }

    /// Goal landmark.
    #[must_use]
    pub const fn goal(&self) -> Option<Circle> {
        self.goal
    }

    /// Previous goal landmark (reversal trials).
    #[must_use]
    pub const fn old_goal(&self) -> Option<Circle> {
        self.old_goal
    }

    /// Distance units per coordinate unit.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    #[cfg(test)]
    pub(crate) fn test_circle() -> Self {
        let mut description = ArenaDescription::new();
        description.insert("arena.bounds".to_string(), "circle 0 0 100".to_string());
        description.insert("goal".to_string(), "circle 50 0 10".to_string());
        Self::from_description("test", &description).unwrap()
    }
}

/// Parse `key = value` description text. `#` starts a comment.
///
/// # Errors
///
/// Returns [`Error::Arena`] for a non-blank line without `=`.
pub fn parse_description(reference: &str, text: &str) -> Result<ArenaDescription> {
    let mut description = ArenaDescription::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| Error::Arena {
            reference: reference.to_string(),
            message: format!("line {}: expected 'key = value'", number + 1),
        })?;
        description.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }
    Ok(description)
}

/// Arena-reader seam.
pub trait ArenaReader: Send + Sync {
    /// Load geometry from `file`, or reconstruct it from `description`
    /// without file access when no file is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Arena`] if neither source yields valid geometry.
    fn read_arena(
        &self,
        file: Option<&Path>,
        description: Option<&ArenaDescription>,
    ) -> Result<ArenaGeometry>;
}

/// Reader for description files and inline descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptionArenaReader;

impl DescriptionArenaReader {
    /// Create a reader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ArenaReader for DescriptionArenaReader {
    fn read_arena(
        &self,
        file: Option<&Path>,
        description: Option<&ArenaDescription>,
    ) -> Result<ArenaGeometry> {
        match (file, description) {
            (Some(file), _) => {
                let reference = file.file_name().map_or_else(
                    || file.display().to_string(),
                    |n| n.to_string_lossy().into_owned(),
                );
                let text = std::fs::read_to_string(file).map_err(|e| Error::Arena {
                    reference: reference.clone(),
                    message: format!("{}: {e}", file.display()),
                })?;
                let description = parse_description(&reference, &text)?;
                ArenaGeometry::from_description(reference, &description)
            }
            (None, Some(description)) => {
                let name = description.get("name").cloned().unwrap_or_else(|| "arena".to_string());
                ArenaGeometry::from_description(name, description)
            }
            (None, None) => Err(Error::Arena {
                reference: "<none>".to_string(),
                message: "no arena file or description given".to_string(),
            }),
        }
    }
}
