// Gold schema: one row per county, housing columns first, then the
// county-level school performance and special-education aggregates.

use arrow::datatypes::Schema;
use std::sync::{Arc, OnceLock};

use super::{count, field, measure, text, with_dataset_metadata};
use crate::partition::Dataset;

/// Returns a cached `Arc<Schema>` for the joined county table.
pub fn gold_schema_arc() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| Arc::new(build_schema())))
}

fn build_schema() -> Schema {
    let fields = vec![
        text(field::COUNTY, false),
        text(field::COUNTY_NAME, true),
        text(field::GEO_ID, true),
        count(field::OCCUPIED_HOUSING_UNITS),
        measure(field::INC_LT_20K),
        measure(field::INC_20K_34_999),
        measure(field::INC_35K_49_999),
        measure(field::INC_50K_74_999),
        measure(field::INC_75K_PLUS),
        measure(field::TOTAL_COST_BURDEN_PCT),
        // School performance aggregates
        count(field::DISTRICT_COUNT),
        count(field::SCHOOL_COUNT),
        measure(field::CCRPI_SCORE_MEAN),
        // Special-education aggregates
        count(field::TOTAL_SWD),
        count(field::INCLUSIVE_80_PLUS),
        measure(field::PCT_INCLUSIVE_80_PLUS),
        text(field::SCHOOL_YEAR, true),
    ];
    with_dataset_metadata(fields, Dataset::CountyAnalysis)
}
