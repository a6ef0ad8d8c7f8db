// Expected raw columns and header binding
//
// Source files carry title lines and notes above the real header. The header
// row is the first row containing the dataset's marker column; every
// required column is then located by name, case-insensitively.

use std::collections::HashMap;

use super::coerce::{parse_count, parse_measure, Numeric};
use super::grid::RawGrid;
use crate::error::{PipelineError, Result};
use crate::partition::Dataset;

/// Rows scanned for the header before giving up
const MAX_HEADER_SCAN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Count,
    Measure,
}

/// A raw source column and the cleaned name it maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedColumn {
    pub raw: &'static str,
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

impl ExpectedColumn {
    pub const fn text(raw: &'static str, name: &'static str) -> Self {
        Self {
            raw,
            name,
            kind: ColumnKind::Text,
            required: true,
        }
    }

    pub const fn count(raw: &'static str, name: &'static str) -> Self {
        Self {
            raw,
            name,
            kind: ColumnKind::Count,
            required: true,
        }
    }

    pub const fn measure(raw: &'static str, name: &'static str) -> Self {
        Self {
            raw,
            name,
            kind: ColumnKind::Measure,
            required: true,
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }
}

/// Columns a raw source must provide
#[derive(Debug, Clone, Copy)]
pub struct RawSchema {
    pub dataset: Dataset,
    /// Raw column name whose presence identifies the header row
    pub header_marker: &'static str,
    pub columns: &'static [ExpectedColumn],
}

impl RawSchema {
    /// Locate the header row and every expected column
    pub fn bind<'g>(&self, grid: &'g RawGrid) -> Result<BoundTable<'g>> {
        let rows = grid.rows();
        let header_row = rows
            .iter()
            .take(MAX_HEADER_SCAN)
            .position(|row| row.iter().any(|c| c.eq_ignore_ascii_case(self.header_marker)))
            .ok_or_else(|| PipelineError::schema(self.dataset.as_str(), self.header_marker))?;

        let header = &rows[header_row];
        let mut positions = HashMap::with_capacity(self.columns.len());
        for column in self.columns {
            match header.iter().position(|c| c.eq_ignore_ascii_case(column.raw)) {
                Some(idx) => {
                    positions.insert(column.name, idx);
                }
                None if column.required => {
                    return Err(PipelineError::schema(self.dataset.as_str(), column.raw));
                }
                None => {}
            }
        }

        Ok(BoundTable {
            header_row,
            positions,
            rows: &rows[header_row + 1..],
        })
    }
}

/// Data rows of a grid with expected columns resolved to positions
#[derive(Debug)]
pub struct BoundTable<'g> {
    header_row: usize,
    positions: HashMap<&'static str, usize>,
    rows: &'g [Vec<String>],
}

impl<'g> BoundTable<'g> {
    /// Zero-based index of the header row within the grid
    pub fn header_row(&self) -> usize {
        self.header_row
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = BoundRow<'_>> + '_ {
        self.rows.iter().map(move |cells| BoundRow {
            cells,
            positions: &self.positions,
        })
    }
}

/// One data row, addressed by cleaned column name
#[derive(Debug, Clone, Copy)]
pub struct BoundRow<'a> {
    cells: &'a [String],
    positions: &'a HashMap<&'static str, usize>,
}

impl<'a> BoundRow<'a> {
    /// Raw trimmed cell; `None` when the column is unbound or the row is short
    pub fn raw(&self, name: &str) -> Option<&'a str> {
        let idx = *self.positions.get(name)?;
        self.cells.get(idx).map(String::as_str)
    }

    /// Non-empty text cell
    pub fn text(&self, name: &str) -> Option<String> {
        self.raw(name)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn count(&self, name: &str) -> Numeric<i64> {
        self.raw(name).map_or(Numeric::Missing, parse_count)
    }

    pub fn measure(&self, name: &str) -> Numeric<f64> {
        self.raw(name).map_or(Numeric::Missing, parse_measure)
    }

    /// True when every cell is empty
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ExpectedColumn] = &[
        ExpectedColumn::text("State LEA ID", "lea_id"),
        ExpectedColumn::count("Total", "total"),
        ExpectedColumn::measure("Share", "share").optional(),
    ];

    const SCHEMA: RawSchema = RawSchema {
        dataset: Dataset::SpecialEducation,
        header_marker: "State LEA ID",
        columns: COLUMNS,
    };

    fn grid(text: &str) -> RawGrid {
        RawGrid::from_csv(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_header_found_below_title_lines() {
        let g = grid("Report title\nGenerated 2023\nstate lea id,TOTAL\n601,12\n");
        let table = SCHEMA.bind(&g).unwrap();
        assert_eq!(table.header_row(), 2);
        assert_eq!(table.len(), 1);
        let row = table.rows().next().unwrap();
        assert_eq!(row.text("lea_id").as_deref(), Some("601"));
        assert_eq!(row.count("total"), Numeric::Value(12));
        assert!(!table.has_column("share"));
        assert_eq!(row.measure("share"), Numeric::Missing);
    }

    #[test]
    fn test_missing_marker_is_schema_error() {
        let g = grid("a,b\n1,2\n");
        let err = SCHEMA.bind(&g).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref column, .. } if column == "State LEA ID"));
    }

    #[test]
    fn test_missing_required_column_is_named() {
        let g = grid("State LEA ID,Share\n601,0.5\n");
        let err = SCHEMA.bind(&g).unwrap_err();
        assert!(err.to_string().contains("'Total'"));
    }

    #[test]
    fn test_short_rows_and_blank_rows() {
        let g = grid("State LEA ID,Total\n601\n,\n");
        let table = SCHEMA.bind(&g).unwrap();
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[0].count("total"), Numeric::Missing);
        assert!(!rows[0].is_blank());
        assert!(rows[1].is_blank());
    }
}
