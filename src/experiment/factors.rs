//! Factor table: per-track identity and user factors

use crate::descriptor::schema::{ARENA, DAY, IDENTITY_COLUMNS, TARGET_ID, TRACK_ID, TRIAL};
use crate::track::{Identity, TrackRecord};
use crate::{Error, Result};
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One factor-table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorRow {
    /// Row name
    pub track_id: String,
    /// Reserved identity values
    pub identity: Identity,
    /// User factor values, in table column order
    pub extra: IndexMap<String, Option<String>>,
}

impl FactorRow {
    /// Value of a column, reserved or user.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        let value = match column {
            TARGET_ID => &self.identity.target,
            DAY => &self.identity.day,
            TRIAL => &self.identity.trial,
            ARENA => &self.identity.arena,
            other => self.extra.get(other)?,
        };
        value.as_deref()
    }
}

/// Per-track metadata keyed by track id.
///
/// Columns are `_TargetID, _Day, _Trial, _Arena` followed by user factors in
/// first-seen order. Row order follows the records the table was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorTable {
    factor_columns: Vec<String>,
    rows: IndexMap<String, FactorRow>,
}

impl FactorTable {
    /// Build one row per record.
    ///
    /// Records lacking a factor some other record declares get `None` for it.
    #[must_use]
    pub fn from_records(records: &[TrackRecord]) -> Self {
        let mut factor_columns: Vec<String> = Vec::new();
        for name in records.iter().flat_map(|r| r.factors.keys()) {
            if !factor_columns.contains(name) {
                factor_columns.push(name.clone());
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                let extra = factor_columns
                    .iter()
                    .map(|name| (name.clone(), record.factors.get(name).cloned().flatten()))
                    .collect();
                let row = FactorRow {
                    track_id: record.id.clone(),
                    identity: record.identity.clone(),
                    extra,
                };
                (record.id.clone(), row)
            })
            .collect();

        Self {
            factor_columns,
            rows,
        }
    }

    /// All column names, identity columns first.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        IDENTITY_COLUMNS
            .iter()
            .copied()
            .chain(self.factor_columns.iter().map(String::as_str))
            .collect()
    }

    /// User factor column names.
    #[must_use]
    pub fn factor_columns(&self) -> &[String] {
        &self.factor_columns
    }

    /// Track ids, in row order.
    pub fn row_names(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Row for a track.
    #[must_use]
    pub fn row(&self, track_id: &str) -> Option<&FactorRow> {
        self.rows.get(track_id)
    }

    /// Rows, in order.
    pub fn rows(&self) -> impl Iterator<Item = &FactorRow> {
        self.rows.values()
    }

    /// Cell value for a track and column.
    #[must_use]
    pub fn get(&self, track_id: &str, column: &str) -> Option<&str> {
        self.row(track_id)?.get(column)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep exactly the given tracks, in the given order.
    ///
    /// Factor columns are kept even when no surviving row has a value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Other`] if an id has no row.
    pub fn reindex<S: AsRef<str>>(&self, track_ids: &[S]) -> Result<Self> {
        let rows = track_ids
            .iter()
            .map(|id| {
                let id = id.as_ref();
                self.rows
                    .get(id)
                    .map(|row| (id.to_string(), row.clone()))
                    .ok_or_else(|| Error::Other(format!("No factor row for track '{id}'")))
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        Ok(Self {
            factor_columns: self.factor_columns.clone(),
            rows,
        })
    }

    /// Render as an Arrow batch of nullable Utf8 columns led by `_TrackID`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Arrow`] if the batch cannot be assembled.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let names = self.column_names();
        let mut fields = vec![Field::new(TRACK_ID, DataType::Utf8, false)];
        fields.extend(names.iter().map(|name| Field::new(*name, DataType::Utf8, true)));

        let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.len());
        columns.push(Arc::new(StringArray::from_iter_values(self.row_names())));
        for name in &names {
            let values: StringArray = self.rows().map(|row| row.get(name)).collect();
            columns.push(Arc::new(values));
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }
}
