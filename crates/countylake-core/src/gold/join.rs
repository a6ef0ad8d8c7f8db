// Silver → gold join
//
// Housing is the anchor: every housing county produces exactly one gold row,
// and the school and special-education aggregates are attached when a
// county key matches. Unmatched counties keep nulls for that dataset.

use arrow::array::{ArrayRef, Float64Builder, Int64Builder, RecordBatch, StringBuilder};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::aggregate::{
    aggregate_schools, aggregate_special_education, SchoolAggregate, SpecialEducationAggregate,
};
use crate::clean::housing::housing_records_from_batch;
use crate::clean::school_performance::school_records_from_batch;
use crate::clean::special_education::special_education_records_from_batch;
use crate::clean::HousingRecord;
use crate::error::{PipelineError, Result};
use crate::partition::Dataset;
use crate::schema::{field, gold_schema_arc};
use crate::table::{float_column, int_column, opt_f64, opt_i64, opt_string, string_column};
use crate::CleanedTable;

/// One joined county row
#[derive(Debug, Clone, PartialEq)]
pub struct GoldRecord {
    pub housing: HousingRecord,
    pub school: Option<SchoolAggregate>,
    pub special_education: Option<SpecialEducationAggregate>,
}

impl GoldRecord {
    pub fn county(&self) -> &str {
        &self.housing.county
    }

    /// True when both the school and special-education sides matched
    pub fn is_fully_covered(&self) -> bool {
        self.school.is_some() && self.special_education.is_some()
    }
}

/// Result of the gold join
#[derive(Debug, Clone)]
pub struct GoldJoin {
    pub table: CleanedTable,
    /// Housing counties lacking a school or special-education match, sorted
    pub uncovered: Vec<String>,
}

/// Join decoded silver batches into the gold table
///
/// With `require_full_coverage`, any housing county lacking a school or
/// special-education match fails the join with a key mismatch error.
pub fn join_silver(
    housing: &RecordBatch,
    school: &RecordBatch,
    special_education: &RecordBatch,
    require_full_coverage: bool,
) -> Result<GoldJoin> {
    let housing = housing_records_from_batch(housing)?;
    let school = school_records_from_batch(school)?;
    let special = special_education_records_from_batch(special_education)?;

    let records = join_records(
        housing,
        aggregate_schools(&school),
        aggregate_special_education(&special),
    );

    let uncovered: Vec<String> = records
        .iter()
        .filter(|r| !r.is_fully_covered())
        .map(|r| r.county().to_string())
        .collect();

    if !uncovered.is_empty() {
        if require_full_coverage {
            return Err(PipelineError::join_key_mismatch(uncovered));
        }
        warn!(
            uncovered = uncovered.len(),
            counties = ?uncovered.iter().take(5).collect::<Vec<_>>(),
            "Housing counties without a school or special education match"
        );
    }

    info!(
        rows = records.len(),
        fully_covered = records.len() - uncovered.len(),
        "Joined county table"
    );

    Ok(GoldJoin {
        table: CleanedTable::new(Dataset::CountyAnalysis, gold_records_to_batch(&records)?),
        uncovered,
    })
}

/// Left-join the aggregates onto housing counties, sorted by county
///
/// The first housing row wins when a county key repeats.
pub fn join_records(
    housing: Vec<HousingRecord>,
    mut schools: BTreeMap<String, SchoolAggregate>,
    mut special: BTreeMap<String, SpecialEducationAggregate>,
) -> Vec<GoldRecord> {
    let mut anchors: BTreeMap<String, HousingRecord> = BTreeMap::new();
    let mut duplicates = 0usize;
    for record in housing {
        if anchors.contains_key(&record.county) {
            duplicates += 1;
            continue;
        }
        anchors.insert(record.county.clone(), record);
    }
    if duplicates > 0 {
        warn!(duplicates, "Duplicate housing county keys ignored");
    }

    anchors
        .into_iter()
        .map(|(county, housing)| GoldRecord {
            school: schools.remove(&county),
            special_education: special.remove(&county),
            housing,
        })
        .collect()
}

pub fn gold_records_to_batch(records: &[GoldRecord]) -> Result<RecordBatch> {
    let n = records.len();
    let mut county = StringBuilder::with_capacity(n, n * 12);
    let mut county_name = StringBuilder::with_capacity(n, n * 24);
    let mut geo_id = StringBuilder::with_capacity(n, n * 16);
    let mut occupied = Int64Builder::with_capacity(n);
    let mut tiers: Vec<Float64Builder> = (0..5).map(|_| Float64Builder::with_capacity(n)).collect();
    let mut total_pct = Float64Builder::with_capacity(n);
    let mut district_count = Int64Builder::with_capacity(n);
    let mut school_count = Int64Builder::with_capacity(n);
    let mut ccrpi_mean = Float64Builder::with_capacity(n);
    let mut total_swd = Int64Builder::with_capacity(n);
    let mut inclusive = Int64Builder::with_capacity(n);
    let mut pct_inclusive = Float64Builder::with_capacity(n);
    let mut school_year = StringBuilder::with_capacity(n, n * 8);

    for r in records {
        let h = &r.housing;
        county.append_value(&h.county);
        county_name.append_option(h.county_name.as_deref());
        geo_id.append_option(h.geo_id.as_deref());
        occupied.append_option(h.occupied_housing_units);
        for (builder, value) in tiers.iter_mut().zip(h.cost_burden) {
            builder.append_option(value);
        }
        total_pct.append_option(h.total_cost_burden_pct);

        let s = r.school.as_ref();
        district_count.append_option(s.map(|s| s.district_count));
        school_count.append_option(s.map(|s| s.school_count));
        ccrpi_mean.append_option(s.and_then(|s| s.ccrpi_score_mean));

        let e = r.special_education.as_ref();
        total_swd.append_option(e.and_then(|e| e.total_swd));
        inclusive.append_option(e.and_then(|e| e.inclusive_80_plus));
        pct_inclusive.append_option(e.and_then(|e| e.pct_inclusive_80_plus));
        school_year.append_option(e.and_then(|e| e.school_year.as_deref()));
    }

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(county.finish()),
        Arc::new(county_name.finish()),
        Arc::new(geo_id.finish()),
        Arc::new(occupied.finish()),
    ];
    columns.extend(tiers.iter_mut().map(|b| Arc::new(b.finish()) as ArrayRef));
    columns.extend([
        Arc::new(total_pct.finish()) as ArrayRef,
        Arc::new(district_count.finish()),
        Arc::new(school_count.finish()),
        Arc::new(ccrpi_mean.finish()),
        Arc::new(total_swd.finish()),
        Arc::new(inclusive.finish()),
        Arc::new(pct_inclusive.finish()),
        Arc::new(school_year.finish()),
    ]);

    RecordBatch::try_new(gold_schema_arc(), columns)
        .map_err(|e| PipelineError::encoding("gold record batch", e))
}

/// Flat view of one gold row, as read back for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct GoldRow {
    pub county: String,
    pub county_name: Option<String>,
    pub total_cost_burden_pct: Option<f64>,
    pub district_count: Option<i64>,
    pub school_count: Option<i64>,
    pub ccrpi_score_mean: Option<f64>,
    pub total_swd: Option<i64>,
    pub pct_inclusive_80_plus: Option<f64>,
    pub school_year: Option<String>,
}

/// Bind a decoded gold batch into rows
pub fn gold_rows_from_batch(batch: &RecordBatch) -> Result<Vec<GoldRow>> {
    let ds = Dataset::CountyAnalysis;
    let county = string_column(batch, ds, field::COUNTY)?;
    let county_name = string_column(batch, ds, field::COUNTY_NAME)?;
    let total_pct = float_column(batch, ds, field::TOTAL_COST_BURDEN_PCT)?;
    let district_count = int_column(batch, ds, field::DISTRICT_COUNT)?;
    let school_count = int_column(batch, ds, field::SCHOOL_COUNT)?;
    let ccrpi_mean = float_column(batch, ds, field::CCRPI_SCORE_MEAN)?;
    let total_swd = int_column(batch, ds, field::TOTAL_SWD)?;
    let pct_inclusive = float_column(batch, ds, field::PCT_INCLUSIVE_80_PLUS)?;
    let school_year = string_column(batch, ds, field::SCHOOL_YEAR)?;

    Ok((0..batch.num_rows())
        .filter_map(|row| {
            Some(GoldRow {
                county: opt_string(county, row)?,
                county_name: opt_string(county_name, row),
                total_cost_burden_pct: opt_f64(total_pct, row),
                district_count: opt_i64(district_count, row),
                school_count: opt_i64(school_count, row),
                ccrpi_score_mean: opt_f64(ccrpi_mean, row),
                total_swd: opt_i64(total_swd, row),
                pct_inclusive_80_plus: opt_f64(pct_inclusive, row),
                school_year: opt_string(school_year, row),
            })
        })
        .collect())
}
