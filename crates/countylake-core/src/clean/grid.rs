// Raw cell grids from delimited text and spreadsheets
//
// Both formats are flattened into rows of trimmed strings before any
// header detection happens, so the cleaners see one shape regardless of
// where the bytes came from.

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use std::io::Cursor;
use tracing::warn;

use crate::error::{PipelineError, Result};

/// Local file header signature of a ZIP container (XLSX is a ZIP archive)
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Rows of raw cells, header rows and metadata rows included
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<String>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse delimited text; ragged rows are accepted as-is
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for record in reader.byte_records() {
            match record {
                Ok(record) => rows.push(
                    record
                        .iter()
                        .map(|field| normalize_cell(&String::from_utf8_lossy(field)))
                        .collect(),
                ),
                Err(e) => {
                    skipped += 1;
                    warn!(error = %e, "Skipping unreadable CSV record");
                }
            }
        }

        if rows.is_empty() && skipped > 0 {
            return Err(PipelineError::encoding(
                "csv",
                format!("no readable records ({} skipped)", skipped),
            ));
        }

        Ok(Self { rows })
    }

    /// Parse the first worksheet of an XLSX workbook
    pub fn from_xlsx(bytes: &[u8]) -> Result<Self> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
            .map_err(|e| PipelineError::encoding("xlsx workbook", e))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| PipelineError::encoding("xlsx workbook", "workbook has no sheets"))?
            .map_err(|e| PipelineError::encoding("xlsx first sheet", e))?;

        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        Ok(Self { rows })
    }

    /// Spreadsheet when the bytes carry a ZIP signature, delimited text otherwise
    pub fn from_spreadsheet_or_csv(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(ZIP_SIGNATURE) {
            Self::from_xlsx(bytes)
        } else {
            Self::from_csv(bytes)
        }
    }
}

fn normalize_cell(value: &str) -> String {
    // Excel-exported CSVs often carry a BOM on the very first cell
    value.trim_start_matches('\u{feff}').trim().to_string()
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => normalize_cell(s),
        Data::Int(i) => i.to_string(),
        // Integral floats are ids and counts; render them without a fraction
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", *f as i64)
        }
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => normalize_cell(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_grid_trims_and_strips_bom() {
        let grid = RawGrid::from_csv("\u{feff}GEO_ID, NAME \n1,  Fulton County, Georgia\n".as_bytes())
            .unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.rows()[0], vec!["GEO_ID", "NAME"]);
        assert_eq!(grid.rows()[1], vec!["1", "Fulton County", "Georgia"]);
    }

    #[test]
    fn test_csv_grid_keeps_quoted_commas_and_ragged_rows() {
        let grid = RawGrid::from_csv(b"Title line\n\nA,B,C\n\"x, y\",2,3\n").unwrap();
        assert_eq!(grid.rows()[0], vec!["Title line"]);
        assert_eq!(grid.rows()[1], vec!["A", "B", "C"]);
        assert_eq!(grid.rows()[2][0], "x, y");
    }

    #[test]
    fn test_dispatch_falls_back_to_csv() {
        let grid = RawGrid::from_spreadsheet_or_csv(b"schoolid,schoolname\n1,A\n").unwrap();
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_corrupt_xlsx_is_encoding_error() {
        let err = RawGrid::from_spreadsheet_or_csv(b"PK\x03\x04garbage").unwrap_err();
        assert!(matches!(err, PipelineError::Encoding { .. }));
    }

    #[test]
    fn test_float_cells_render_as_integers() {
        assert_eq!(cell_to_string(&Data::Float(601.0)), "601");
        assert_eq!(cell_to_string(&Data::Float(78.25)), "78.25");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
