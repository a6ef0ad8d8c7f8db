// Silver writer: cleaned table → Parquet object under the silver layer

use serde::Serialize;
use tracing::info;

use countylake_core::parquet::{encode_table, ParquetOptions};
use countylake_core::{CleanedTable, DatasetFiles, IngestDate};

use crate::error::{PipelineError, Result};
use crate::storage::ObjectStore;

/// Shape and location of one written table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetOutput {
    pub rows: usize,
    pub columns: usize,
    pub output_path: String,
}

/// Encode `table` and write it to the silver path of its dataset
pub async fn write_silver(
    store: &dyn ObjectStore,
    files: &DatasetFiles,
    partition: &IngestDate,
    table: &CleanedTable,
    options: &ParquetOptions,
) -> Result<DatasetOutput> {
    let dataset = table.dataset();
    let path = files.silver_path(dataset, partition).ok_or_else(|| {
        PipelineError::invalid_config(format!("{} has no silver object", dataset))
    })?;

    let encoded = encode_table(table, options)?;
    let size = encoded.bytes.len();
    store.write_bytes(&path, encoded.bytes).await?;

    info!(
        dataset = %dataset,
        path = %path,
        rows = encoded.rows,
        columns = encoded.columns,
        bytes = size,
        "Wrote silver table"
    );

    Ok(DatasetOutput {
        rows: encoded.rows,
        columns: encoded.columns,
        output_path: path,
    })
}
