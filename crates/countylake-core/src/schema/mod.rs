// Arrow schemas for the silver and gold tables
//
// Every table carries the normalized `county` key column. Count columns are
// Int64, measures and percentages are Float64, identifiers stay Utf8 so that
// leading zeros in LEA and school ids survive the round trip.

use arrow::datatypes::{DataType, Field, Schema};
use std::collections::HashMap;
use std::sync::Arc;

use crate::partition::Dataset;

pub mod gold;
pub mod housing;
pub mod school_performance;
pub mod special_education;

pub use gold::gold_schema_arc;
pub use housing::housing_schema_arc;
pub use school_performance::school_performance_schema_arc;
pub use special_education::special_education_schema_arc;

/// Version stamped into schema metadata of every table we write
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Column names shared across silver and gold tables
pub mod field {
    pub const COUNTY: &str = "county";
    pub const COUNTY_NAME: &str = "county_name";
    pub const GEO_ID: &str = "geo_id";
    pub const OCCUPIED_HOUSING_UNITS: &str = "occupied_housing_units";
    pub const INC_LT_20K: &str = "inc_lt_20k_cost_burden_30_plus";
    pub const INC_20K_34_999: &str = "inc_20k_34_999_cost_burden_30_plus";
    pub const INC_35K_49_999: &str = "inc_35k_49_999_cost_burden_30_plus";
    pub const INC_50K_74_999: &str = "inc_50k_74_999_cost_burden_30_plus";
    pub const INC_75K_PLUS: &str = "inc_75k_plus_cost_burden_30_plus";
    pub const TOTAL_COST_BURDEN_PCT: &str = "total_cost_burden_30_plus_pct";

    pub const LEA_ID: &str = "lea_id";
    pub const DISTRICT_NAME: &str = "district_name";
    pub const TOTAL_SWD: &str = "total_swd";
    pub const INCLUSIVE_80_PLUS: &str = "inclusive_80_plus";
    pub const PCT_INCLUSIVE_80_PLUS: &str = "pct_inclusive_80_plus";
    pub const SCHOOL_YEAR: &str = "school_year";

    pub const SCHOOL_ID: &str = "school_id";
    pub const SCHOOL_NAME: &str = "school_name";
    pub const CCRPI_SCORE: &str = "ccrpi_score_2023";

    pub const DISTRICT_COUNT: &str = "district_count";
    pub const SCHOOL_COUNT: &str = "school_count";
    pub const CCRPI_SCORE_MEAN: &str = "ccrpi_score_2023_mean";

    /// Income tiers summed into the total cost-burden percentage
    pub const COST_BURDEN_TIERS: [&str; 5] = [
        INC_LT_20K,
        INC_20K_34_999,
        INC_35K_49_999,
        INC_50K_74_999,
        INC_75K_PLUS,
    ];
}

pub(crate) fn text(name: &str, nullable: bool) -> Field {
    Field::new(name, DataType::Utf8, nullable)
}

pub(crate) fn count(name: &str) -> Field {
    Field::new(name, DataType::Int64, true)
}

pub(crate) fn measure(name: &str) -> Field {
    Field::new(name, DataType::Float64, true)
}

pub(crate) fn with_dataset_metadata(fields: Vec<Field>, dataset: Dataset) -> Schema {
    let metadata = HashMap::from([
        (
            "countylake.schema_version".to_string(),
            SCHEMA_VERSION.to_string(),
        ),
        ("countylake.dataset".to_string(), dataset.as_str().to_string()),
    ]);
    Schema::new_with_metadata(fields, metadata)
}

/// Cached schema of the table produced for `dataset`
pub fn schema_for(dataset: Dataset) -> Arc<Schema> {
    match dataset {
        Dataset::HousingAffordability => housing_schema_arc(),
        Dataset::SpecialEducation => special_education_schema_arc(),
        Dataset::SchoolPerformance => school_performance_schema_arc(),
        Dataset::CountyAnalysis => gold_schema_arc(),
    }
}
