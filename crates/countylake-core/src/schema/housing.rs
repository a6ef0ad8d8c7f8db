// Silver schema for the ACS housing affordability table (one row per county)

use arrow::datatypes::Schema;
use std::sync::{Arc, OnceLock};

use super::{count, field, measure, text, with_dataset_metadata};
use crate::partition::Dataset;

/// Returns a cached `Arc<Schema>` for the cleaned housing table.
pub fn housing_schema_arc() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| Arc::new(build_schema())))
}

fn build_schema() -> Schema {
    let fields = vec![
        text(field::GEO_ID, true),
        text(field::COUNTY_NAME, true),
        // Join key, guaranteed present for every housing row
        text(field::COUNTY, false),
        count(field::OCCUPIED_HOUSING_UNITS),
        measure(field::INC_LT_20K),
        measure(field::INC_20K_34_999),
        measure(field::INC_35K_49_999),
        measure(field::INC_50K_74_999),
        measure(field::INC_75K_PLUS),
        measure(field::TOTAL_COST_BURDEN_PCT),
    ];
    with_dataset_metadata(fields, Dataset::HousingAffordability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::DataType;

    #[test]
    fn test_housing_schema() {
        let schema = housing_schema_arc();
        assert_eq!(schema.fields().len(), 10);
        let county = schema.field_with_name(field::COUNTY).unwrap();
        assert!(!county.is_nullable());
        assert_eq!(
            schema
                .field_with_name(field::OCCUPIED_HOUSING_UNITS)
                .unwrap()
                .data_type(),
            &DataType::Int64
        );
    }
}
