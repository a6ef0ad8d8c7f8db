// CCRPI school performance cleaner (one row per school)

use arrow::array::{Float64Builder, RecordBatch, StringBuilder};
use std::sync::Arc;
use tracing::debug;

use super::coerce::normalize_county;
use super::expected::{ExpectedColumn, RawSchema};
use super::grid::RawGrid;
use crate::error::{PipelineError, Result};
use crate::partition::Dataset;
use crate::schema::{field, school_performance_schema_arc};
use crate::table::{float_column, opt_f64, opt_string, string_column};
use crate::CleanedTable;

const COLUMNS: &[ExpectedColumn] = &[
    ExpectedColumn::text("schoolid", field::SCHOOL_ID),
    ExpectedColumn::text("schoolname", field::SCHOOL_NAME),
    ExpectedColumn::text("systemid", field::LEA_ID),
    ExpectedColumn::text("systemname", field::DISTRICT_NAME),
    ExpectedColumn::measure("single_score_23", field::CCRPI_SCORE),
];

pub const SCHOOL_PERFORMANCE_RAW_SCHEMA: RawSchema = RawSchema {
    dataset: Dataset::SchoolPerformance,
    header_marker: "schoolid",
    columns: COLUMNS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SchoolRecord {
    pub school_id: Option<String>,
    pub school_name: Option<String>,
    pub lea_id: Option<String>,
    pub district_name: Option<String>,
    pub county: Option<String>,
    pub ccrpi_score: Option<f64>,
}

/// Parse and clean the school performance workbook (or its CSV export)
pub fn clean_school_performance(raw: &[u8]) -> Result<CleanedTable> {
    let grid = RawGrid::from_spreadsheet_or_csv(raw)?;
    let table = SCHOOL_PERFORMANCE_RAW_SCHEMA.bind(&grid)?;

    let mut malformed = 0usize;
    let records: Vec<SchoolRecord> = table
        .rows()
        .filter(|row| !row.is_blank())
        .map(|row| {
            let district_name = row.text(field::DISTRICT_NAME);
            SchoolRecord {
                school_id: row.text(field::SCHOOL_ID),
                school_name: row.text(field::SCHOOL_NAME),
                lea_id: row.text(field::LEA_ID),
                county: district_name.as_deref().and_then(normalize_county),
                district_name,
                ccrpi_score: row.measure(field::CCRPI_SCORE).tally(&mut malformed),
            }
        })
        .collect();

    debug!(
        dataset = %Dataset::SchoolPerformance,
        rows = records.len(),
        malformed_cells = malformed,
        "Cleaned school performance table"
    );

    Ok(CleanedTable::new(
        Dataset::SchoolPerformance,
        school_records_to_batch(&records)?,
    ))
}

pub fn school_records_to_batch(records: &[SchoolRecord]) -> Result<RecordBatch> {
    let n = records.len();
    let mut school_id = StringBuilder::with_capacity(n, n * 8);
    let mut school_name = StringBuilder::with_capacity(n, n * 32);
    let mut lea_id = StringBuilder::with_capacity(n, n * 8);
    let mut district_name = StringBuilder::with_capacity(n, n * 24);
    let mut county = StringBuilder::with_capacity(n, n * 12);
    let mut score = Float64Builder::with_capacity(n);

    for r in records {
        school_id.append_option(r.school_id.as_deref());
        school_name.append_option(r.school_name.as_deref());
        lea_id.append_option(r.lea_id.as_deref());
        district_name.append_option(r.district_name.as_deref());
        county.append_option(r.county.as_deref());
        score.append_option(r.ccrpi_score);
    }

    RecordBatch::try_new(
        school_performance_schema_arc(),
        vec![
            Arc::new(school_id.finish()),
            Arc::new(school_name.finish()),
            Arc::new(lea_id.finish()),
            Arc::new(district_name.finish()),
            Arc::new(county.finish()),
            Arc::new(score.finish()),
        ],
    )
    .map_err(|e| PipelineError::encoding("school performance record batch", e))
}

pub fn school_records_from_batch(batch: &RecordBatch) -> Result<Vec<SchoolRecord>> {
    let ds = Dataset::SchoolPerformance;
    let school_id = string_column(batch, ds, field::SCHOOL_ID)?;
    let school_name = string_column(batch, ds, field::SCHOOL_NAME)?;
    let lea_id = string_column(batch, ds, field::LEA_ID)?;
    let district_name = string_column(batch, ds, field::DISTRICT_NAME)?;
    let county = string_column(batch, ds, field::COUNTY)?;
    let score = float_column(batch, ds, field::CCRPI_SCORE)?;

    Ok((0..batch.num_rows())
        .map(|row| SchoolRecord {
            school_id: opt_string(school_id, row),
            school_name: opt_string(school_name, row),
            lea_id: opt_string(lea_id, row),
            district_name: opt_string(district_name, row),
            county: opt_string(county, row),
            ccrpi_score: opt_f64(score, row),
        })
        .collect())
}
