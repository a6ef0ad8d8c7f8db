//! Bronze → silver cleaners
//!
//! Each source dataset declares the raw columns it needs (`RawSchema`). A
//! cleaner parses the raw bytes into a cell grid, binds the header row
//! against that declaration, coerces cells, and emits a `CleanedTable` with
//! the silver schema of its dataset. Malformed cells become nulls; missing
//! columns fail the whole run with a schema error.

pub mod coerce;
pub mod expected;
pub mod grid;
pub mod housing;
pub mod school_performance;
pub mod special_education;

pub use coerce::{normalize_county, Numeric};
pub use expected::{BoundRow, BoundTable, ColumnKind, ExpectedColumn, RawSchema};
pub use grid::RawGrid;
pub use housing::{clean_housing, HousingRecord, HOUSING_RAW_SCHEMA};
pub use school_performance::{
    clean_school_performance, SchoolRecord, SCHOOL_PERFORMANCE_RAW_SCHEMA,
};
pub use special_education::{
    clean_special_education, SpecialEducationRecord, SPECIAL_EDUCATION_RAW_SCHEMA,
};

use crate::error::{PipelineError, Result};
use crate::partition::Dataset;
use crate::CleanedTable;

/// Clean the raw bytes of a source dataset
pub fn clean(dataset: Dataset, raw: &[u8]) -> Result<CleanedTable> {
    match dataset {
        Dataset::HousingAffordability => clean_housing(raw),
        Dataset::SpecialEducation => clean_special_education(raw),
        Dataset::SchoolPerformance => clean_school_performance(raw),
        Dataset::CountyAnalysis => Err(PipelineError::invalid_config(
            "county_analysis is produced by the gold join and has no cleaner",
        )),
    }
}
