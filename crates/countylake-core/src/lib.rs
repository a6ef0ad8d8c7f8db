// countylake-core - Pure bronze → silver → gold logic
//
// Everything here is a transformation over bytes and Arrow batches: raw
// CSV/XLSX bytes → cleaned tables → Parquet bytes, and decoded silver
// batches → the joined county table. No I/O, no async, no runtime.
// Storage and orchestration live in countylake-writer.

pub mod clean;
pub mod error;
pub mod gold;
pub mod parquet;
pub mod partition;
pub mod schema;
pub mod table;

pub use clean::clean;
pub use error::{ErrorCode, PipelineError, Result};
pub use partition::{resolve, Dataset, DatasetFiles, IngestDate, Layer};
pub use table::CleanedTable;
