//! Silver → gold: county aggregation, the housing-anchored join, and the
//! highlight rankings reported by the viewer.

pub mod aggregate;
pub mod highlights;
pub mod join;

pub use aggregate::{
    aggregate_schools, aggregate_special_education, SchoolAggregate, SpecialEducationAggregate,
};
pub use highlights::{highlights, GoldHighlights, Highlight, OverallRank};
pub use join::{gold_records_to_batch, gold_rows_from_batch, join_silver, GoldJoin, GoldRecord, GoldRow};
