//! Tabular experiment descriptors
//!
//! A descriptor is loaded as text ([`DescriptorTable`]), checked for the
//! reserved columns, then split into normalized
//! [`TrackRecord`](crate::track::TrackRecord)s.

pub mod schema;
pub mod tabular;

/// Row-oriented text table with verbatim column names.
///
/// Cells are kept as text; consumers coerce. Missing cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl DescriptorTable {
    /// Create a table, padding or truncating every row to the column count.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Column names in file order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell text at `row` in column `name`.
    #[must_use]
    pub fn value(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column_index(name)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }
}
