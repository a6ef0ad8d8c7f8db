// ACS housing affordability cleaner (table S2503, one row per county)

use arrow::array::{ArrayRef, Float64Builder, Int64Builder, RecordBatch, StringBuilder};
use std::sync::Arc;
use tracing::{debug, warn};

use super::coerce::normalize_county;
use super::expected::{ExpectedColumn, RawSchema};
use super::grid::RawGrid;
use crate::error::{PipelineError, Result};
use crate::partition::Dataset;
use crate::schema::{field, housing_schema_arc};
use crate::table::{float_column, int_column, opt_f64, opt_i64, opt_string, string_column};
use crate::CleanedTable;

/// Value of `GEO_ID` on the ACS column-label row that follows the header
const ACS_LABEL_ROW: &str = "Geography";

const COLUMNS: &[ExpectedColumn] = &[
    ExpectedColumn::text("GEO_ID", field::GEO_ID),
    ExpectedColumn::text("NAME", field::COUNTY_NAME),
    ExpectedColumn::count("S2503_C01_001E", field::OCCUPIED_HOUSING_UNITS),
    ExpectedColumn::measure("S2503_C01_028E", field::INC_LT_20K),
    ExpectedColumn::measure("S2503_C01_032E", field::INC_20K_34_999),
    ExpectedColumn::measure("S2503_C01_036E", field::INC_35K_49_999),
    ExpectedColumn::measure("S2503_C01_040E", field::INC_50K_74_999),
    ExpectedColumn::measure("S2503_C01_044E", field::INC_75K_PLUS),
];

pub const HOUSING_RAW_SCHEMA: RawSchema = RawSchema {
    dataset: Dataset::HousingAffordability,
    header_marker: "GEO_ID",
    columns: COLUMNS,
};

/// One cleaned county row
#[derive(Debug, Clone, PartialEq)]
pub struct HousingRecord {
    pub geo_id: Option<String>,
    pub county_name: Option<String>,
    pub county: String,
    pub occupied_housing_units: Option<i64>,
    /// Cost-burdened unit counts, in `field::COST_BURDEN_TIERS` order
    pub cost_burden: [Option<f64>; 5],
    pub total_cost_burden_pct: Option<f64>,
}

/// Share of occupied units that are cost-burdened, as a percentage
///
/// Null tiers count as zero; the result is null when the unit count is null
/// or zero.
pub fn total_cost_burden_pct(tiers: &[Option<f64>; 5], occupied: Option<i64>) -> Option<f64> {
    let occupied = occupied.filter(|units| *units != 0)?;
    let burdened: f64 = tiers.iter().map(|t| t.unwrap_or(0.0)).sum();
    Some(burdened / occupied as f64 * 100.0)
}

/// Parse and clean the raw ACS housing CSV
pub fn clean_housing(raw: &[u8]) -> Result<CleanedTable> {
    let grid = RawGrid::from_csv(raw)?;
    let table = HOUSING_RAW_SCHEMA.bind(&grid)?;

    let mut records = Vec::with_capacity(table.len());
    let mut malformed = 0usize;
    let mut keyless = 0usize;

    for row in table.rows() {
        if row.is_blank() || row.raw(field::GEO_ID) == Some(ACS_LABEL_ROW) {
            continue;
        }

        let county_name = row.text(field::COUNTY_NAME);
        let Some(county) = county_name.as_deref().and_then(normalize_county) else {
            keyless += 1;
            continue;
        };

        let occupied = row.count(field::OCCUPIED_HOUSING_UNITS).tally(&mut malformed);
        let mut cost_burden = [None; 5];
        for (slot, name) in cost_burden.iter_mut().zip(field::COST_BURDEN_TIERS) {
            *slot = row.measure(name).tally(&mut malformed);
        }

        records.push(HousingRecord {
            geo_id: row.text(field::GEO_ID),
            county_name,
            county,
            occupied_housing_units: occupied,
            total_cost_burden_pct: total_cost_burden_pct(&cost_burden, occupied),
            cost_burden,
        });
    }

    if keyless > 0 {
        warn!(dataset = %Dataset::HousingAffordability, dropped = keyless, "Dropped housing rows without a county key");
    }
    debug!(
        dataset = %Dataset::HousingAffordability,
        rows = records.len(),
        malformed_cells = malformed,
        "Cleaned housing table"
    );

    Ok(CleanedTable::new(
        Dataset::HousingAffordability,
        housing_records_to_batch(&records)?,
    ))
}

pub fn housing_records_to_batch(records: &[HousingRecord]) -> Result<RecordBatch> {
    let n = records.len();
    let mut geo_id = StringBuilder::with_capacity(n, n * 24);
    let mut county_name = StringBuilder::with_capacity(n, n * 24);
    let mut county = StringBuilder::with_capacity(n, n * 12);
    let mut occupied = Int64Builder::with_capacity(n);
    let mut tiers: Vec<Float64Builder> = (0..5).map(|_| Float64Builder::with_capacity(n)).collect();
    let mut total = Float64Builder::with_capacity(n);

    for r in records {
        geo_id.append_option(r.geo_id.as_deref());
        county_name.append_option(r.county_name.as_deref());
        county.append_value(&r.county);
        occupied.append_option(r.occupied_housing_units);
        for (builder, value) in tiers.iter_mut().zip(r.cost_burden) {
            builder.append_option(value);
        }
        total.append_option(r.total_cost_burden_pct);
    }

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(geo_id.finish()),
        Arc::new(county_name.finish()),
        Arc::new(county.finish()),
        Arc::new(occupied.finish()),
    ];
    columns.extend(tiers.iter_mut().map(|b| Arc::new(b.finish()) as ArrayRef));
    columns.push(Arc::new(total.finish()));

    RecordBatch::try_new(housing_schema_arc(), columns)
        .map_err(|e| PipelineError::encoding("housing record batch", e))
}

/// Bind a decoded silver housing batch back into records
pub fn housing_records_from_batch(batch: &RecordBatch) -> Result<Vec<HousingRecord>> {
    let ds = Dataset::HousingAffordability;
    let geo_id = string_column(batch, ds, field::GEO_ID)?;
    let county_name = string_column(batch, ds, field::COUNTY_NAME)?;
    let county = string_column(batch, ds, field::COUNTY)?;
    let occupied = int_column(batch, ds, field::OCCUPIED_HOUSING_UNITS)?;
    let tiers = field::COST_BURDEN_TIERS
        .iter()
        .map(|name| float_column(batch, ds, name))
        .collect::<Result<Vec<_>>>()?;
    let total = float_column(batch, ds, field::TOTAL_COST_BURDEN_PCT)?;

    let mut records = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        // Null keys cannot be joined
        let Some(key) = opt_string(county, row) else {
            continue;
        };
        let mut cost_burden = [None; 5];
        for (slot, array) in cost_burden.iter_mut().zip(&tiers) {
            *slot = opt_f64(array, row);
        }
        records.push(HousingRecord {
            geo_id: opt_string(geo_id, row),
            county_name: opt_string(county_name, row),
            county: key,
            occupied_housing_units: opt_i64(occupied, row),
            cost_burden,
            total_cost_burden_pct: opt_f64(total, row),
        });
    }
    Ok(records)
}
