//! Workbook sheets (xlsx, xls, ods) via calamine.
//!
//! Rows are addressed from the top of the sheet: calamine trims leading
//! empty rows and columns from a range, so they are restored here to keep
//! `skip_rows` offsets meaning the same thing as in a spreadsheet viewer.

use calamine::{open_workbook_auto, Data, Reader};
use serde_json::{Number, Value};
use std::path::Path;

use super::Table;
use crate::error::{LoadError, LoadResult};

/// List sheet names in workbook order.
pub fn sheet_names<P: AsRef<Path>>(path: P) -> LoadResult<Vec<String>> {
    let path = path.as_ref();
    let workbook = open_workbook_auto(path).map_err(|e| workbook_error(path, e))?;
    Ok(workbook.sheet_names().to_vec())
}

/// Read every row of a sheet as JSON cells, starting at spreadsheet row 1.
pub fn read_sheet_rows<P: AsRef<Path>>(path: P, sheet: &str) -> LoadResult<Vec<Vec<Value>>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        });
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(path, e))?;
    let names = workbook.sheet_names().to_vec();
    if !names.iter().any(|n| n == sheet) {
        return Err(LoadError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            available: names.join(", "),
        });
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| workbook_error(path, e))?;

    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Value>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Value::Null; col_offset];
        cells.extend(row.iter().map(cell_to_value));
        rows.push(cells);
    }

    tracing::debug!(
        sheet,
        rows = rows.len(),
        row_offset,
        col_offset,
        "read workbook sheet"
    );
    Ok(rows)
}

/// Load a sheet as a [`Table`]: drop `skip_rows` rows, the next row is the header.
pub fn load_sheet<P: AsRef<Path>>(path: P, sheet: &str, skip_rows: usize) -> LoadResult<Table> {
    let path = path.as_ref();
    let mut rows = read_sheet_rows(path, sheet)?;
    let name = sheet_label(path, sheet);

    if rows.len() <= skip_rows {
        return Err(LoadError::HeaderOutOfRange {
            source_name: name,
            rows: rows.len(),
            skip: skip_rows,
        });
    }
    rows.drain(..skip_rows);

    Table::from_rows(name, rows)
}

/// `file.xlsx#Sheet` label for logs and errors.
pub fn sheet_label(path: &Path, sheet: &str) -> String {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("{}#{}", file, sheet)
}

/// Convert a calamine cell to JSON.
///
/// Integer-valued floats become JSON integers; error cells and NaN become null.
pub fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => float_to_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Value::Null
            } else {
                Value::String(s.to_string())
            }
        }
        other => Value::String(other.to_string()),
    }
}

fn float_to_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn workbook_error(path: &Path, err: impl std::fmt::Display) -> LoadError {
    LoadError::Workbook {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
