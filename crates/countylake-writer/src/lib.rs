// countylake-writer - Storage and pipeline orchestration
//
// Wires the pure transformations of countylake-core to object storage:
// - storage: `ObjectStore` trait over OpenDAL (local filesystem, ADLS Gen2)
// - silver: cleaned table → silver Parquet object
// - gold: silver objects → joined gold Parquet object
// - pipeline: one full run and its summary

pub mod error;
pub mod gold;
pub mod pipeline;
pub mod silver;
pub mod storage;

pub use error::{ErrorCode, PipelineError, Result};
pub use gold::{join_to_gold, read_gold};
pub use pipeline::{
    run_bronze_to_silver, run_pipeline, GoldSummary, PipelineContext, RunSummary, SilverSummary,
};
pub use silver::{write_silver, DatasetOutput};
pub use storage::{open_store, AdlsStore, LocalStore, ObjectStore};
