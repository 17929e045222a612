//! CSV reading and writing for catalog tables
//!
//! The catalogs originate in spreadsheet tools that expect `utf-8-sig`:
//! a UTF-8 byte-order mark is tolerated (and stripped) on read and emitted
//! on write.

use std::io::Write;
use std::path::Path;

use crate::{clean_cell, normalize_header, CatalogTable, IngestError, Result, SOURCE_COLUMN};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Read a delimited file into a catalog table.
///
/// Headers are normalized like spreadsheet headers. A `__fuente__` column is
/// appended when the file does not already carry one, so raw CSV sources
/// behave like workbook sources under combination.
pub fn read_table(path: &Path) -> Result<CatalogTable> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    let content = bytes
        .strip_prefix(&UTF8_BOM)
        .unwrap_or(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content);

    let mut headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::CsvError(e.to_string()))?
        .iter()
        .map(normalize_header)
        .collect();

    let add_source = !headers.iter().any(|h| h == SOURCE_COLUMN);
    if add_source {
        headers.push(SOURCE_COLUMN.to_string());
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let mut table = CatalogTable::new(headers);
    for result in reader.records() {
        let record = result.map_err(|e| IngestError::CsvError(e.to_string()))?;
        let mut cells: Vec<String> = record.iter().map(clean_cell).collect();
        if cells.iter().all(|s| s.is_empty()) {
            continue;
        }
        if add_source {
            cells.resize(table.headers.len() - 1, String::new());
            cells.push(file_name.clone());
            table.rows.push(cells);
        } else {
            table.push_row(cells);
        }
    }

    Ok(table)
}

/// Write a catalog table as CSV, prefixed with a UTF-8 byte-order mark
pub fn write_table(path: &Path, table: &CatalogTable) -> Result<()> {
    let mut file = std::fs::File::create(path).map_err(|e| IngestError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    file.write_all(&UTF8_BOM).map_err(|e| IngestError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(&table.headers)
        .map_err(|e| IngestError::CsvError(e.to_string()))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| IngestError::CsvError(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| IngestError::CsvError(e.to_string()))?;

    Ok(())
}
