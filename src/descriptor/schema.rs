//! Reserved descriptor columns, validation and the factor split
//!
//! Column names starting with [`RESERVED_PREFIX`] belong to the system; every
//! other column is a user factor carried through verbatim.

use super::DescriptorTable;
use crate::track::{ArenaSource, Identity, PathSource, TrackRecord};
use crate::{Error, Result};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use std::path::Path;

/// Leading marker of reserved columns.
pub const RESERVED_PREFIX: char = '_';

/// Track identifier column.
pub const TRACK_ID: &str = "_TrackID";
/// Subject identifier column.
pub const TARGET_ID: &str = "_TargetID";
/// Day column.
pub const DAY: &str = "_Day";
/// Trial column.
pub const TRIAL: &str = "_Trial";
/// Arena reference column.
pub const ARENA: &str = "_Arena";
/// Raw file reference column.
pub const TRACK_FILE: &str = "_TrackFile";
/// Raw file format column.
pub const TRACK_FILE_FORMAT: &str = "_TrackFileFormat";
/// Optional sub-index into a multi-track raw file.
pub const TRACK_INDEX: &str = "_TrackIndex";

/// Columns every tabular descriptor must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 6] =
    [TARGET_ID, DAY, TRIAL, ARENA, TRACK_FILE, TRACK_FILE_FORMAT];

/// Reserved columns that lead every factor table.
pub const IDENTITY_COLUMNS: [&str; 4] = [TARGET_ID, DAY, TRIAL, ARENA];

/// Whether a column name is reserved.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Check that every required column is present.
///
/// # Errors
///
/// Returns [`Error::MissingRequiredColumns`] naming every missing column.
pub fn validate(table: &DescriptorTable, path: &Path) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .map(|name| (*name).to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingRequiredColumns {
            path: path.to_path_buf(),
            missing,
        })
    }
}

/// Column positions split into reserved and user factor groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSplit {
    /// Reserved column positions, in file order
    pub reserved: Vec<usize>,
    /// User factor column positions, in file order
    pub factors: Vec<usize>,
}

/// Partition the table's columns by the reserved prefix.
#[must_use]
pub fn split_columns(table: &DescriptorTable) -> ColumnSplit {
    let (reserved, factors) =
        (0..table.columns().len()).partition(|&i| is_reserved(&table.columns()[i]));
    ColumnSplit { reserved, factors }
}

/// Adapt validated descriptor rows into normalized track records.
///
/// Rows without a `_TrackID` (or tables without the column) get the id
/// `Track_<n>` from their 1-based row number.
///
/// # Errors
///
/// Returns [`Error::DuplicateTrackId`] if two rows share an id.
pub fn track_records(table: &DescriptorTable) -> Result<Vec<TrackRecord>> {
    let split = split_columns(table);
    let mut seen = FxHashSet::default();
    let mut records = Vec::with_capacity(table.len());

    for (row, cells) in table.rows().iter().enumerate() {
        let text = |name: &str| table.value(row, name).map(str::to_string);

        let id = text(TRACK_ID)
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("Track_{}", row + 1));
        if !seen.insert(id.clone()) {
            return Err(Error::DuplicateTrackId(id));
        }

        let factors: IndexMap<String, Option<String>> = split
            .factors
            .iter()
            .map(|&col| (table.columns()[col].clone(), cells[col].clone()))
            .collect();

        let arena = text(ARENA).map_or(ArenaSource::Missing, ArenaSource::Shared);

        records.push(TrackRecord {
            identity: Identity {
                target: text(TARGET_ID),
                day: text(DAY),
                trial: text(TRIAL),
                arena: text(ARENA),
            },
            factors,
            path: PathSource::File {
                reference: text(TRACK_FILE),
                format: text(TRACK_FILE_FORMAT),
                index: text(TRACK_INDEX),
            },
            arena,
            id,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> DescriptorTable {
        DescriptorTable::new(
            columns.iter().map(|c| (*c).to_string()).collect(),
            rows.iter()
                .map(|r| {
                    r.iter()
                        .map(|v| (!v.is_empty()).then(|| (*v).to_string()))
                        .collect()
                })
                .collect(),
        )
    }

    #[test]
    fn test_validate_names_every_missing_column() {
        let t = table(&["_TrackID", "_TargetID", "_Trial", "_TrackFile"], &[]);
        let err = validate(&t, Path::new("d.csv")).unwrap_err();
        match err {
            Error::MissingRequiredColumns { missing, .. } => {
                assert_eq!(missing, ["_Day", "_Arena", "_TrackFileFormat"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_split_preserves_order() {
        let t = table(&["Strain", "_TrackID", "Sex", "_Day"], &[]);
        let split = split_columns(&t);
        assert_eq!(split.reserved, [1, 3]);
        assert_eq!(split.factors, [0, 2]);
    }

    #[test]
    fn test_track_records_factors_and_identity() {
        let t = table(
            &[
                "_TrackID",
                "_TargetID",
                "_Day",
                "_Trial",
                "_Arena",
                "_TrackFile",
                "_TrackFileFormat",
                "Strain",
                "Sex",
            ],
            &[
                &["a", "m1", "1", "1", "pool.txt", "a.csv", "raw.csv", "WT", "F"],
                &["", "m2", "1", "2", "", "b.csv", "raw.csv", "KO", ""],
            ],
        );
        let records = track_records(&t).unwrap();

        assert_eq!(records[0].id, "a");
        assert_eq!(records[1].id, "Track_2");
        assert_eq!(records[0].arena, ArenaSource::Shared("pool.txt".into()));
        assert_eq!(records[1].arena, ArenaSource::Missing);
        assert_eq!(records[0].factors.keys().collect::<Vec<_>>(), ["Strain", "Sex"]);
        assert_eq!(records[1].factors["Sex"], None);
        assert_eq!(records[1].identity.target.as_deref(), Some("m2"));
    }

    #[test]
    fn test_duplicate_track_id() {
        let t = table(&["_TrackID"], &[&["a"], &["a"]]);
        assert!(matches!(track_records(&t), Err(Error::DuplicateTrackId(id)) if id == "a"));
    }
}
