//! Descriptor format detection
//!
//! An explicit format token always wins over the file extension. Both are
//! matched case-insensitively.

use crate::{Error, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Serialization kind of an experiment descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorFormat {
    /// Self-contained archive document (`.json`)
    Archive,
    /// Spreadsheet workbook (`.xls`, `.xlsx`)
    Spreadsheet,
    /// Comma-delimited text (`.csv`)
    Csv,
    /// Tab-delimited text (`.tab`, `.tsv`, `.txt`)
    Delimited,
}

impl DescriptorFormat {
    /// Detect the format of `path`, honouring an explicit override.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnrecognizedFormat`] if the override is unknown, or if
    /// no override is given and the extension is not in the extension table.
    pub fn detect(path: &Path, explicit: Option<&str>) -> Result<Self> {
        let unrecognized = || Error::UnrecognizedFormat {
            path: path.to_path_buf(),
            hint: explicit.map(str::to_string),
        };

        if let Some(token) = explicit {
            return token.parse().map_err(|()| unrecognized());
        }

        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(unrecognized)
    }

    /// Map a file extension (without the dot) to a format.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Archive),
            "xls" | "xlsx" => Some(Self::Spreadsheet),
            "csv" => Some(Self::Csv),
            "tab" | "tsv" | "txt" => Some(Self::Delimited),
            _ => None,
        }
    }

    /// Whether the descriptor is a table (as opposed to an archive).
    #[must_use]
    pub const fn is_tabular(self) -> bool {
        !matches!(self, Self::Archive)
    }

    /// Field delimiter for text formats.
    #[must_use]
    pub const fn delimiter(self) -> Option<u8> {
        match self {
            Self::Csv => Some(b','),
            Self::Delimited => Some(b'\t'),
            Self::Archive | Self::Spreadsheet => None,
        }
    }
}

impl FromStr for DescriptorFormat {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "archive" => Ok(Self::Archive),
            "excel" | "spreadsheet" | "xls" | "xlsx" => Ok(Self::Spreadsheet),
            "csv" => Ok(Self::Csv),
            "tab" | "tsv" | "txt" | "delimited" => Ok(Self::Delimited),
            _ => Err(()),
        }
    }
}

impl fmt::Display for DescriptorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Archive => "archive",
            Self::Spreadsheet => "spreadsheet",
            Self::Csv => "csv",
            Self::Delimited => "delimited",
        };
        f.write_str(name)
    }
}
