// Silver schema for IDEA special-education environments (one row per LEA)

use arrow::datatypes::Schema;
use std::sync::{Arc, OnceLock};

use super::{count, field, measure, text, with_dataset_metadata};
use crate::partition::Dataset;

pub fn special_education_schema_arc() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| Arc::new(build_schema())))
}

fn build_schema() -> Schema {
    let fields = vec![
        text(field::LEA_ID, true),
        text(field::DISTRICT_NAME, true),
        // Null when the district name does not reduce to a county
        text(field::COUNTY, true),
        count(field::TOTAL_SWD),
        count(field::INCLUSIVE_80_PLUS),
        measure(field::PCT_INCLUSIVE_80_PLUS),
        text(field::SCHOOL_YEAR, true),
    ];
    with_dataset_metadata(fields, Dataset::SpecialEducation)
}
