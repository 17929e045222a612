//! ARCA Ingest - Catalog ingestion for heterogeneous archival spreadsheets
//!
//! Reads Excel workbooks and delimited text files into a uniform tabular
//! shape, normalizes their headers to the standardized column names, and
//! combines multiple source files into one catalog keeping only the columns
//! every source shares.
//!
//! Each source file that cannot be read is skipped with a logged error; the
//! combination fails only when no source yielded data.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, warn};

use arca_core::{CatalogRecord, Category, EnrichedRecord};

pub mod csv_io;
pub mod excel;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during catalog ingestion
#[derive(Error, Debug)]
pub enum IngestError {
    /// IO error while reading a file
    #[error("IO error reading file: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Excel parsing error
    #[error("Excel parsing error: {0}")]
    ExcelError(String),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Requested sheet does not exist in the workbook
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// File format is not supported
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// No source file yielded any rows
    #[error("No catalog data could be loaded from any source")]
    NoData,
}

pub type Result<T> = std::result::Result<T, IngestError>;

// ============================================================================
// Catalog Table
// ============================================================================

/// Column name for the source-file marker added to every ingested table
pub const SOURCE_COLUMN: &str = "__fuente__";

/// A catalog as a header row plus string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogTable {
    /// Normalized column names
    pub headers: Vec<String>,

    /// Data rows; each row has exactly `headers.len()` cells
    pub rows: Vec<Vec<String>>,
}

impl CatalogTable {
    /// Create an empty table with the given headers
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell value by row index and column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).map(|s| s.as_str())
    }

    /// Number of data rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Append a row, padding or truncating it to the header width
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Project this table onto a subset of its columns, in the given order.
    /// Columns this table lacks become empty cells.
    pub fn project(&self, columns: &[String]) -> CatalogTable {
        let indices: Vec<Option<usize>> =
            columns.iter().map(|c| self.column_index(c)).collect();

        let mut projected = CatalogTable::new(columns.to_vec());
        for row in &self.rows {
            let cells = indices
                .iter()
                .map(|idx| idx.and_then(|i| row.get(i)).cloned().unwrap_or_default())
                .collect();
            projected.rows.push(cells);
        }
        projected
    }
}

// ============================================================================
// Header and cell normalization
// ============================================================================

/// Map a raw spreadsheet header to its standardized column name.
///
/// Known Spanish catalog headers get their fixed standardized form; anything
/// else is lowercased with spaces collapsed to underscores.
pub fn normalize_header(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "signatura" => "signatura".to_string(),
        "fecha crónica" | "fecha cronica" => "fecha_cronica".to_string(),
        "fecha tópica" | "fecha topica" => "fecha_topica".to_string(),
        "descripción" | "descripcion" => "descripcion".to_string(),
        "palabras claves" | "palabras clave" => "palabras_clave".to_string(),
        "folios" => "folios".to_string(),
        "observaciones" => "observaciones".to_string(),
        _ => lowered.split_whitespace().collect::<Vec<_>>().join("_"),
    }
}

/// Collapse runs of whitespace inside a cell and trim the ends
pub fn clean_cell(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Multi-source combination
// ============================================================================

/// One catalog source: a file plus an optional sheet name for workbooks
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub path: PathBuf,
    pub sheet: Option<String>,
}

impl SourceSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet: None,
        }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }
}

/// Read a single catalog source, dispatching on the file extension
pub fn read_catalog(source: &SourceSpec) -> Result<CatalogTable> {
    let ext = source
        .path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "xlsx" | "xls" => excel::read_workbook(&source.path, source.sheet.as_deref()),
        "csv" => csv_io::read_table(&source.path),
        other => Err(IngestError::UnsupportedFormat(other.to_string())),
    }
}

/// Combine several catalog sources into one table.
///
/// Unreadable or empty sources are skipped with a logged error. The result
/// keeps only the columns common to every surviving source, in the column
/// order of the first one. Fails with [`IngestError::NoData`] iff nothing
/// loaded.
pub fn combine_catalogs(sources: &[SourceSpec]) -> Result<CatalogTable> {
    let mut tables = Vec::new();

    for source in sources {
        match read_catalog(source) {
            Ok(table) if table.num_rows() > 0 => tables.push(table),
            Ok(_) => warn!(path = %source.path.display(), "source yielded no rows, skipping"),
            Err(e) => error!(path = %source.path.display(), error = %e, "failed to read source, skipping"),
        }
    }

    let Some(first) = tables.first() else {
        return Err(IngestError::NoData);
    };

    let common: Vec<String> = first
        .headers
        .iter()
        .filter(|h| tables.iter().all(|t| t.column_index(h.as_str()).is_some()))
        .cloned()
        .collect();

    let mut combined = CatalogTable::new(common.clone());
    for table in &tables {
        combined.rows.extend(table.project(&common).rows);
    }

    Ok(combined)
}

// ============================================================================
// Record conversion
// ============================================================================

fn opt_cell(table: &CatalogTable, row: usize, column: &str) -> Option<String> {
    table
        .cell(row, column)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Convert a standardized table into catalog records
pub fn to_records(table: &CatalogTable) -> Vec<CatalogRecord> {
    (0..table.num_rows())
        .map(|i| CatalogRecord {
            signatura: opt_cell(table, i, "signatura"),
            fecha_cronica: opt_cell(table, i, "fecha_cronica"),
            fecha_topica: opt_cell(table, i, "fecha_topica"),
            descripcion: opt_cell(table, i, "descripcion"),
            observaciones: opt_cell(table, i, "observaciones"),
            folios: opt_cell(table, i, "folios"),
            fuente: opt_cell(table, i, SOURCE_COLUMN),
            fecha_inicio: opt_cell(table, i, "fecha_inicio"),
            fecha_fin: opt_cell(table, i, "fecha_fin"),
        })
        .collect()
}

const RECORD_COLUMNS: [&str; 9] = [
    "signatura",
    "fecha_cronica",
    "fecha_topica",
    "descripcion",
    "observaciones",
    "folios",
    "fecha_inicio",
    "fecha_fin",
    SOURCE_COLUMN,
];

fn record_cells(record: &CatalogRecord) -> Vec<String> {
    [
        &record.signatura,
        &record.fecha_cronica,
        &record.fecha_topica,
        &record.descripcion,
        &record.observaciones,
        &record.folios,
        &record.fecha_inicio,
        &record.fecha_fin,
        &record.fuente,
    ]
    .into_iter()
    .map(|v| v.clone().unwrap_or_default())
    .collect()
}

/// Render catalog records back into a table for CSV output
pub fn records_to_table(records: &[CatalogRecord]) -> CatalogTable {
    let mut table =
        CatalogTable::new(RECORD_COLUMNS.iter().map(|s| s.to_string()).collect());
    for record in records {
        table.rows.push(record_cells(record));
    }
    table
}

// ============================================================================
// Enriched record conversion (JSON list cells)
// ============================================================================

/// Column holding the sanitized keyword list (JSON array of strings)
pub const KEYWORDS_COLUMN: &str = "keywords_extraidas";
/// Column holding the category list (JSON array of category tokens)
pub const TIPOS_COLUMN: &str = "tipo_keywords";
/// Column holding the URI list (JSON array of strings or nulls)
pub const URIS_COLUMN: &str = "uri_keywords";

/// Render enriched records into a table, encoding the parallel lists as JSON
/// arrays inside their cells.
pub fn enriched_to_table(records: &[EnrichedRecord]) -> CatalogTable {
    let mut headers: Vec<String> = RECORD_COLUMNS.iter().map(|s| s.to_string()).collect();
    headers.push(KEYWORDS_COLUMN.to_string());
    headers.push(TIPOS_COLUMN.to_string());
    headers.push(URIS_COLUMN.to_string());

    let mut table = CatalogTable::new(headers);
    for enriched in records {
        let mut cells = record_cells(&enriched.record);
        // serde_json cannot fail on these value types
        cells.push(serde_json::to_string(&enriched.keywords).unwrap_or_default());
        cells.push(serde_json::to_string(&enriched.tipos).unwrap_or_default());
        cells.push(serde_json::to_string(&enriched.uris).unwrap_or_default());
        table.rows.push(cells);
    }
    table
}

/// Parse enriched records out of a table previously written by
/// [`enriched_to_table`].
///
/// A row whose list cells fail to parse as JSON arrays is dropped entirely
/// (logged, not fatal); it must never be partially materialized downstream.
pub fn to_enriched_records(table: &CatalogTable) -> Vec<EnrichedRecord> {
    let base_records = to_records(table);

    base_records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let keywords = table.cell(i, KEYWORDS_COLUMN).unwrap_or("");
            let tipos = table.cell(i, TIPOS_COLUMN).unwrap_or("");
            let uris = table.cell(i, URIS_COLUMN).unwrap_or("");

            let parsed: Option<(Vec<String>, Vec<Category>, Vec<Option<String>>)> = (|| {
                Some((
                    serde_json::from_str(keywords).ok()?,
                    serde_json::from_str(tipos).ok()?,
                    serde_json::from_str(uris).ok()?,
                ))
            })();

            match parsed {
                Some((keywords, tipos, uris)) => Some(EnrichedRecord {
                    record,
                    keywords,
                    tipos,
                    uris,
                }),
                None => {
                    warn!(row = i + 1, "malformed enrichment lists, skipping row");
                    None
                }
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> CatalogTable {
        let mut table = CatalogTable::new(
            ["signatura", "fecha_cronica", "descripcion", SOURCE_COLUMN]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        table.push_row(vec![
            "A-1".to_string(),
            "1836".to_string(),
            "Carta de venta".to_string(),
            "tomo1.xlsx".to_string(),
        ]);
        table
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Fecha Crónica"), "fecha_cronica");
        assert_eq!(normalize_header("  DESCRIPCIÓN "), "descripcion");
        assert_eq!(normalize_header("Palabras Claves"), "palabras_clave");
        assert_eq!(normalize_header("Nota Marginal"), "nota_marginal");
    }

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell("  Carta   de\tventa \n"), "Carta de venta");
        assert_eq!(clean_cell(""), "");
    }

    #[test]
    fn test_push_row_pads_and_truncates() {
        let mut table = CatalogTable::new(vec!["a".to_string(), "b".to_string()]);
        table.push_row(vec!["1".to_string()]);
        table.push_row(vec!["1".to_string(), "2".to_string(), "3".to_string()]);
        assert_eq!(table.rows[0], vec!["1".to_string(), String::new()]);
        assert_eq!(table.rows[1], vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_project_keeps_order_and_fills_missing() {
        let table = sample_table();
        let projected = table.project(&[
            "descripcion".to_string(),
            "folios".to_string(),
            "signatura".to_string(),
        ]);
        assert_eq!(projected.headers.len(), 3);
        assert_eq!(
            projected.rows[0],
            vec![
                "Carta de venta".to_string(),
                String::new(),
                "A-1".to_string()
            ]
        );
    }

    #[test]
    fn test_to_records_maps_columns() {
        let records = to_records(&sample_table());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].signatura.as_deref(), Some("A-1"));
        assert_eq!(records[0].fecha_cronica.as_deref(), Some("1836"));
        assert_eq!(records[0].fuente.as_deref(), Some("tomo1.xlsx"));
        assert!(records[0].observaciones.is_none());
    }

    #[test]
    fn test_records_round_trip_through_table() {
        let records = to_records(&sample_table());
        let table = records_to_table(&records);
        let back = to_records(&table);
        assert_eq!(records, back);
    }

    #[test]
    fn test_enriched_round_trip() {
        let mut enriched = EnrichedRecord::new(to_records(&sample_table()).remove(0));
        enriched.keywords = vec!["Cusco".to_string(), "Nicolás de Piérola".to_string()];
        enriched.tipos = vec![Category::Lugar, Category::Persona];
        enriched.uris = vec![Some("http://example.org/c/42".to_string()), None];

        let table = enriched_to_table(std::slice::from_ref(&enriched));
        let parsed = to_enriched_records(&table);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].keywords, enriched.keywords);
        assert_eq!(parsed[0].tipos, enriched.tipos);
        assert_eq!(parsed[0].uris, enriched.uris);
    }

    #[test]
    fn test_malformed_list_cells_drop_the_row() {
        let mut enriched = EnrichedRecord::new(CatalogRecord::default());
        enriched.keywords = vec!["Lima".to_string()];
        enriched.tipos = vec![Category::Lugar];
        enriched.uris = vec![None];

        let mut table = enriched_to_table(&[enriched]);
        let idx = table.column_index(TIPOS_COLUMN).unwrap();
        table.rows[0][idx] = "['lugar'".to_string();

        assert!(to_enriched_records(&table).is_empty());
    }

    #[test]
    fn test_combine_skips_unreadable_and_intersects_columns() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();

        let a = dir.path().join("a.csv");
        let mut f = std::fs::File::create(&a).unwrap();
        writeln!(f, "signatura,descripcion,folios").unwrap();
        writeln!(f, "A-1,Carta,2").unwrap();

        let b = dir.path().join("b.csv");
        let mut f = std::fs::File::create(&b).unwrap();
        writeln!(f, "signatura,descripcion").unwrap();
        writeln!(f, "B-1,Testamento").unwrap();

        let sources = vec![
            SourceSpec::new(&a),
            SourceSpec::new(&b),
            SourceSpec::new(dir.path().join("missing.csv")),
        ];

        let combined = combine_catalogs(&sources).unwrap();
        // `folios` is missing from b.csv and drops out; the source marker
        // added on read is common to both
        assert_eq!(
            combined.headers,
            vec![
                "signatura".to_string(),
                "descripcion".to_string(),
                SOURCE_COLUMN.to_string()
            ]
        );
        assert_eq!(combined.num_rows(), 2);
        assert_eq!(combined.cell(0, SOURCE_COLUMN), Some("a.csv"));
        assert_eq!(combined.cell(1, SOURCE_COLUMN), Some("b.csv"));
    }

    #[test]
    fn test_combine_fails_when_nothing_loads() {
        let sources = vec![SourceSpec::new("/nonexistent/x.csv")];
        assert!(matches!(
            combine_catalogs(&sources),
            Err(IngestError::NoData)
        ));
    }
}
