//! Tabular descriptor loader (delimited text and spreadsheets)
//!
//! Every cell is read as text. Delimited files go through the Arrow CSV
//! reader against an all-`Utf8` schema built from the header row, so no type
//! inference can strip leading zeros or round identifiers.

use super::DescriptorTable;
use crate::format::DescriptorFormat;
use crate::{Error, Result};
use arrow::array::{Array, StringArray};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use calamine::{open_workbook_auto, Data, Reader};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Load a tabular descriptor of the given format.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if `format` is
/// not tabular.
pub fn load(path: &Path, format: DescriptorFormat) -> Result<DescriptorTable> {
    match format {
        DescriptorFormat::Spreadsheet => read_spreadsheet(path),
        DescriptorFormat::Csv | DescriptorFormat::Delimited => {
            let delimiter = format.delimiter().unwrap_or(b',');
            read_delimited(path, delimiter)
        }
        DescriptorFormat::Archive => Err(Error::Descriptor(format!(
            "{} is an archive, not a table",
            path.display()
        ))),
    }
}

/// Read a delimited text file with a header row.
///
/// An empty file yields an empty table.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a row is malformed.
pub fn read_delimited(path: &Path, delimiter: u8) -> Result<DescriptorTable> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(DescriptorTable::default());
    }

    let format = Format::default()
        .with_header(true)
        .with_delimiter(delimiter);
    let (inferred, _) = format.infer_schema(&file, Some(0))?;

    let columns: Vec<String> = inferred
        .fields()
        .iter()
        .enumerate()
        .map(|(i, f)| {
            if i == 0 {
                f.name().trim_start_matches(BYTE_ORDER_MARK).to_string()
            } else {
                f.name().clone()
            }
        })
        .collect();
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    let reader = ReaderBuilder::new(schema)
        .with_header(true)
        .with_delimiter(delimiter)
        .build(File::open(path)?)?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        let arrays = batch
            .columns()
            .iter()
            .map(|col| {
                col.as_any().downcast_ref::<StringArray>().ok_or_else(|| {
                    Error::Descriptor(format!("{}: non-text column", path.display()))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            rows.push(
                arrays
                    .iter()
                    .map(|a| {
                        (!a.is_null(row) && !a.value(row).is_empty())
                            .then(|| a.value(row).to_string())
                    })
                    .collect(),
            );
        }
    }

    Ok(DescriptorTable::new(columns, rows))
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        other => Some(other.to_string()),
    }
}

/// Read the first worksheet of a spreadsheet, first row as header.
///
/// Fully empty rows are skipped.
///
/// # Errors
///
/// Returns an error if the workbook cannot be opened or has no worksheet.
pub fn read_spreadsheet(path: &Path) -> Result<DescriptorTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range_at(0).ok_or_else(|| {
        Error::Descriptor(format!("{} contains no worksheets", path.display()))
    })??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DescriptorTable::default());
    };
    let columns = header
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();

    let rows = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(Option::is_some))
        .collect();

    Ok(DescriptorTable::new(columns, rows))
}
