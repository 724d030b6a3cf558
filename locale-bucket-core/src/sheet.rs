//! Tabular source reader: opens a workbook, locates one sheet by exact name and
//! exposes its cells by 0-based absolute (row, column) position.
//!
//! The header map built here is informational. Language columns come from the
//! configured [`LanguageSpec`](crate::config::LanguageSpec), so blank header
//! cells are simply skipped and leave gaps in the map.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::cell::CellValue;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to open workbook {path}: {reason}")]
    Workbook { path: String, reason: String },

    #[error("Sheet '{name}' not found (available: {available:?})")]
    SheetNotFound { name: String, available: Vec<String> },

    #[error("Sheet '{0}' has no cells")]
    EmptySheet(String),
}

/// Read access to a grid of cells. Indices are 0-based and stable for the
/// lifetime of one read; cells outside the grid read as [`CellValue::Blank`].
pub trait TabularSource {
    fn row_count(&self) -> usize;
    fn column_count(&self) -> usize;
    fn cell(&self, row: usize, column: usize) -> CellValue;
}

/// One worksheet loaded from a workbook.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    range: Range<Data>,
}

impl Sheet {
    pub fn from_range(name: impl Into<String>, range: Range<Data>) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TabularSource for Sheet {
    fn row_count(&self) -> usize {
        self.range.end().map(|(r, _)| r as usize + 1).unwrap_or(0)
    }

    fn column_count(&self) -> usize {
        self.range.end().map(|(_, c)| c as usize + 1).unwrap_or(0)
    }

    fn cell(&self, row: usize, column: usize) -> CellValue {
        let (Ok(row), Ok(column)) = (u32::try_from(row), u32::try_from(column)) else {
            return CellValue::Blank;
        };
        match self.range.get_value((row, column)) {
            Some(data) => CellValue::from(data),
            None => CellValue::Blank,
        }
    }
}

/// Column label to column index, built from a single header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    columns: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn column(&self, label: &str) -> Option<usize> {
        self.columns.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Labels sorted by column index.
    pub fn labels(&self) -> Vec<(&str, usize)> {
        let mut labels: Vec<(&str, usize)> = self
            .columns
            .iter()
            .map(|(label, column)| (label.as_str(), *column))
            .collect();
        labels.sort_by_key(|(_, column)| *column);
        labels
    }
}

/// Opens `path` and returns the sheet named exactly `sheet_name`.
pub fn open_sheet(path: impl AsRef<Path>, sheet_name: &str) -> Result<Sheet, SheetError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    if !path.exists() {
        error!(path = %path_str, "Spreadsheet file does not exist");
        return Err(SheetError::FileNotFound(path_str));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| {
        error!(path = %path_str, error = %e, "Failed to open workbook");
        SheetError::Workbook {
            path: path_str.clone(),
            reason: e.to_string(),
        }
    })?;

    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet_name) {
        error!(sheet = sheet_name, ?available, "Sheet not found in workbook");
        return Err(SheetError::SheetNotFound {
            name: sheet_name.to_string(),
            available,
        });
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| SheetError::Workbook {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;

    if range.is_empty() {
        error!(sheet = sheet_name, "Sheet is empty");
        return Err(SheetError::EmptySheet(sheet_name.to_string()));
    }

    let sheet = Sheet::from_range(sheet_name, range);
    info!(
        path = %path_str,
        sheet = sheet_name,
        rows = sheet.row_count(),
        columns = sheet.column_count(),
        "Opened sheet"
    );
    Ok(sheet)
}

/// Scans row `begin_row` from `begin_col` to the last column and maps every
/// non-blank cell's text to its column index.
pub fn extract_sheet_header<S: TabularSource + ?Sized>(
    sheet: &S,
    begin_row: usize,
    begin_col: usize,
) -> HeaderMap {
    let mut columns = HashMap::new();
    for column in begin_col..sheet.column_count() {
        let value = sheet.cell(begin_row, column);
        if value.is_blank() {
            debug!(row = begin_row, column, "Skipping blank header cell");
            continue;
        }
        columns.insert(value.to_text(), column);
    }
    HeaderMap { columns }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_from(rows: &[&[&str]]) -> Sheet {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    range.set_value((r as u32, c as u32), Data::String(value.to_string()));
                }
            }
        }
        Sheet::from_range("Translations", range)
    }

    #[test]
    fn header_skips_blank_cells_and_leading_columns() {
        let sheet = sheet_from(&[
            &["", "", "", "", ""],
            &["ignored", "", "key", "", "en"],
        ]);
        let header = extract_sheet_header(&sheet, 1, 2);

        assert_eq!(header.len(), 2);
        assert_eq!(header.column("key"), Some(2));
        assert_eq!(header.column("en"), Some(4));
        assert_eq!(header.column("ignored"), None);
        assert_eq!(header.labels(), vec![("key", 2), ("en", 4)]);
    }

    #[test]
    fn out_of_range_cells_are_blank() {
        let sheet = sheet_from(&[&["a", "b"]]);
        assert_eq!(sheet.row_count(), 1);
        assert_eq!(sheet.column_count(), 2);
        assert_eq!(sheet.cell(5, 5), CellValue::Blank);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn oversized_indices_do_not_wrap_onto_real_cells() {
        let sheet = sheet_from(&[&["a", "b", "c"]]);
        let wrapped = (1usize << 32) + 2;

        assert_eq!(sheet.cell(0, wrapped), CellValue::Blank);
        assert_eq!(sheet.cell(wrapped, 0), CellValue::Blank);
        assert_eq!(sheet.cell(0, 2).to_text(), "c");
    }

    #[test]
    fn missing_file_is_reported_not_panicked() {
        let err = open_sheet("/definitely/not/here.xlsx", "Translations").unwrap_err();
        assert!(matches!(err, SheetError::FileNotFound(_)));
    }
}
