//! Excel catalog reading using calamine
//!
//! Reads one worksheet into a [`CatalogTable`]: the first row becomes the
//! normalized header, every cell is stringified and cleaned, and fully empty
//! rows are dropped.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::{clean_cell, normalize_header, CatalogTable, IngestError, Result, SOURCE_COLUMN};

/// Convert a Data cell to string
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            // Format without unnecessary decimals
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                format!("{f}")
            }
        }
        Data::Int(i) => format!("{i}"),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#ERROR: {e:?}"),
        Data::DateTime(dt) => format!("{dt}"),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Read one worksheet of a workbook into a catalog table.
///
/// `sheet` selects a worksheet by name; `None` takes the first one. A
/// `__fuente__` column carrying the workbook file name is appended so the
/// origin of every row survives multi-source combination.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<CatalogTable> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| IngestError::ExcelError(e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_vec();

    let sheet_name = match sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(IngestError::SheetNotFound(name.to_string()));
            }
            name.to_string()
        }
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IngestError::ExcelError("workbook has no sheets".to_string()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::ExcelError(e.to_string()))?;

    let mut rows_iter = range.rows();

    let mut headers: Vec<String> = rows_iter
        .next()
        .map(|row| {
            row.iter()
                .map(|c| normalize_header(&cell_to_string(c)))
                .collect()
        })
        .unwrap_or_default();
    headers.push(SOURCE_COLUMN.to_string());

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let mut table = CatalogTable::new(headers);
    for row in rows_iter {
        let mut cells: Vec<String> = row
            .iter()
            .map(|c| clean_cell(&cell_to_string(c)))
            .collect();
        if cells.iter().all(|s| s.is_empty()) {
            continue;
        }
        cells.resize(table.headers.len() - 1, String::new());
        cells.push(file_name.clone());
        table.rows.push(cells);
    }

    Ok(table)
}
