// Silver schema for CCRPI school performance (one row per school)

use arrow::datatypes::Schema;
use std::sync::{Arc, OnceLock};

use super::{field, measure, text, with_dataset_metadata};
use crate::partition::Dataset;

pub fn school_performance_schema_arc() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| Arc::new(build_schema())))
}

fn build_schema() -> Schema {
    let fields = vec![
        text(field::SCHOOL_ID, true),
        text(field::SCHOOL_NAME, true),
        text(field::LEA_ID, true),
        text(field::DISTRICT_NAME, true),
        text(field::COUNTY, true),
        measure(field::CCRPI_SCORE),
    ];
    with_dataset_metadata(fields, Dataset::SchoolPerformance)
}
