// IDEA educational environments cleaner (one row per LEA)

use arrow::array::{Float64Builder, Int64Builder, RecordBatch, StringBuilder};
use std::sync::Arc;
use tracing::debug;

use super::coerce::normalize_county;
use super::expected::{ExpectedColumn, RawSchema};
use super::grid::RawGrid;
use crate::error::{PipelineError, Result};
use crate::partition::Dataset;
use crate::schema::{field, special_education_schema_arc};
use crate::table::{float_column, int_column, opt_f64, opt_i64, opt_string, string_column};
use crate::CleanedTable;

const COLUMNS: &[ExpectedColumn] = &[
    ExpectedColumn::text("State LEA ID", field::LEA_ID),
    ExpectedColumn::text("LEA Name", field::DISTRICT_NAME),
    ExpectedColumn::count("School Age All Educational Environments", field::TOTAL_SWD),
    ExpectedColumn::count(
        "School Age Inside regular class 80% or more of the day",
        field::INCLUSIVE_80_PLUS,
    ),
    ExpectedColumn::text("School Year", field::SCHOOL_YEAR),
    // Some exports already carry the share; it wins over the derived value
    ExpectedColumn::measure(field::PCT_INCLUSIVE_80_PLUS, field::PCT_INCLUSIVE_80_PLUS).optional(),
];

pub const SPECIAL_EDUCATION_RAW_SCHEMA: RawSchema = RawSchema {
    dataset: Dataset::SpecialEducation,
    header_marker: "State LEA ID",
    columns: COLUMNS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SpecialEducationRecord {
    pub lea_id: Option<String>,
    pub district_name: Option<String>,
    pub county: Option<String>,
    pub total_swd: Option<i64>,
    pub inclusive_80_plus: Option<i64>,
    pub pct_inclusive_80_plus: Option<f64>,
    pub school_year: Option<String>,
}

/// `inclusive / total * 100`, null when either side is null or the total is zero
pub fn inclusive_pct(inclusive: Option<i64>, total: Option<i64>) -> Option<f64> {
    let total = total.filter(|t| *t != 0)?;
    Some(inclusive? as f64 / total as f64 * 100.0)
}

/// Parse and clean the raw special-education CSV
pub fn clean_special_education(raw: &[u8]) -> Result<CleanedTable> {
    let grid = RawGrid::from_csv(raw)?;
    let table = SPECIAL_EDUCATION_RAW_SCHEMA.bind(&grid)?;
    let has_raw_pct = table.has_column(field::PCT_INCLUSIVE_80_PLUS);

    let mut records = Vec::with_capacity(table.len());
    let mut malformed = 0usize;
    let mut unkeyed = 0usize;

    for row in table.rows() {
        let lea_id = row.text(field::LEA_ID);
        let district_name = row.text(field::DISTRICT_NAME);
        if row.is_blank() || (lea_id.is_none() && district_name.is_none()) {
            continue;
        }

        let county = district_name.as_deref().and_then(normalize_county);
        if county.is_none() {
            unkeyed += 1;
        }

        let total_swd = row.count(field::TOTAL_SWD).tally(&mut malformed);
        let inclusive = row.count(field::INCLUSIVE_80_PLUS).tally(&mut malformed);
        let pct = if has_raw_pct {
            row.measure(field::PCT_INCLUSIVE_80_PLUS).tally(&mut malformed)
        } else {
            inclusive_pct(inclusive, total_swd)
        };

        records.push(SpecialEducationRecord {
            lea_id,
            district_name,
            county,
            total_swd,
            inclusive_80_plus: inclusive,
            pct_inclusive_80_plus: pct,
            school_year: row.text(field::SCHOOL_YEAR),
        });
    }

    debug!(
        dataset = %Dataset::SpecialEducation,
        rows = records.len(),
        header_row = table.header_row(),
        malformed_cells = malformed,
        without_county = unkeyed,
        "Cleaned special education table"
    );

    Ok(CleanedTable::new(
        Dataset::SpecialEducation,
        special_education_records_to_batch(&records)?,
    ))
}

pub fn special_education_records_to_batch(records: &[SpecialEducationRecord]) -> Result<RecordBatch> {
    let n = records.len();
    let mut lea_id = StringBuilder::with_capacity(n, n * 8);
    let mut district_name = StringBuilder::with_capacity(n, n * 24);
    let mut county = StringBuilder::with_capacity(n, n * 12);
    let mut total_swd = Int64Builder::with_capacity(n);
    let mut inclusive = Int64Builder::with_capacity(n);
    let mut pct = Float64Builder::with_capacity(n);
    let mut school_year = StringBuilder::with_capacity(n, n * 8);

    for r in records {
        lea_id.append_option(r.lea_id.as_deref());
        district_name.append_option(r.district_name.as_deref());
        county.append_option(r.county.as_deref());
        total_swd.append_option(r.total_swd);
        inclusive.append_option(r.inclusive_80_plus);
        pct.append_option(r.pct_inclusive_80_plus);
        school_year.append_option(r.school_year.as_deref());
    }

    RecordBatch::try_new(
        special_education_schema_arc(),
        vec![
            Arc::new(lea_id.finish()),
            Arc::new(district_name.finish()),
            Arc::new(county.finish()),
            Arc::new(total_swd.finish()),
            Arc::new(inclusive.finish()),
            Arc::new(pct.finish()),
            Arc::new(school_year.finish()),
        ],
    )
    .map_err(|e| PipelineError::encoding("special education record batch", e))
}

pub fn special_education_records_from_batch(batch: &RecordBatch) -> Result<Vec<SpecialEducationRecord>> {
    let ds = Dataset::SpecialEducation;
    let lea_id = string_column(batch, ds, field::LEA_ID)?;
    let district_name = string_column(batch, ds, field::DISTRICT_NAME)?;
    let county = string_column(batch, ds, field::COUNTY)?;
    let total_swd = int_column(batch, ds, field::TOTAL_SWD)?;
    let inclusive = int_column(batch, ds, field::INCLUSIVE_80_PLUS)?;
    let pct = float_column(batch, ds, field::PCT_INCLUSIVE_80_PLUS)?;
    let school_year = string_column(batch, ds, field::SCHOOL_YEAR)?;

    Ok((0..batch.num_rows())
        .map(|row| SpecialEducationRecord {
            lea_id: opt_string(lea_id, row),
            district_name: opt_string(district_name, row),
            county: opt_string(county, row),
            total_swd: opt_i64(total_swd, row),
            inclusive_80_plus: opt_i64(inclusive, row),
            pct_inclusive_80_plus: opt_f64(pct, row),
            school_year: opt_string(school_year, row),
        })
        .collect())
}
