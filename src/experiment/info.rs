//! Experiment provenance notes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance of an experiment.
///
/// The author note is passed through from the caller; the processing note is
/// stamped with the processing time and crate version; the export note stays
/// empty until an export stage fills it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperimentInfo {
    author_note: String,
    processed_at: DateTime<Utc>,
    version: String,
    export_note: String,
}

impl ExperimentInfo {
    /// Create info stamped with the current time and crate version.
    #[must_use]
    pub fn new(author_note: impl Into<String>) -> Self {
        Self::builder(author_note).build()
    }

    /// Create a builder for info with explicit fields.
    #[must_use]
    pub fn builder(author_note: impl Into<String>) -> ExperimentInfoBuilder {
        ExperimentInfoBuilder::new(author_note)
    }

    /// Get the author note.
    #[must_use]
    pub fn author_note(&self) -> &str {
        &self.author_note
    }

    /// Get the processing note.
    #[must_use]
    pub fn processing_note(&self) -> String {
        format!(
            "Processed by trackset {} at {}",
            self.version,
            self.processed_at.to_rfc3339()
        )
    }

    /// Get the processing timestamp.
    #[must_use]
    pub const fn processed_at(&self) -> DateTime<Utc> {
        self.processed_at
    }

    /// Get the version that processed the experiment.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get the export note (empty unless exported).
    #[must_use]
    pub fn export_note(&self) -> &str {
        &self.export_note
    }

    /// Copy of this info with the export note filled in.
    #[must_use]
    pub fn with_export_note(&self, note: impl Into<String>) -> Self {
        Self {
            export_note: note.into(),
            ..self.clone()
        }
    }
}

/// Builder for `ExperimentInfo`.
#[derive(Debug)]
pub struct ExperimentInfoBuilder {
    author_note: String,
    processed_at: DateTime<Utc>,
    version: String,
    export_note: String,
}

impl ExperimentInfoBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(author_note: impl Into<String>) -> Self {
        Self {
            author_note: author_note.into(),
            processed_at: Utc::now(),
            version: crate::VERSION.to_string(),
            export_note: String::new(),
        }
    }

    /// Set a custom processing timestamp (useful for testing).
    #[must_use]
    pub const fn processed_at(mut self, processed_at: DateTime<Utc>) -> Self {
        self.processed_at = processed_at;
        self
    }

    /// Set the version string.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Build the `ExperimentInfo`.
    #[must_use]
    pub fn build(self) -> ExperimentInfo {
        ExperimentInfo {
            author_note: self.author_note,
            processed_at: self.processed_at,
            version: self.version,
            export_note: self.export_note,
        }
    }
}
