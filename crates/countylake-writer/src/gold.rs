// Gold stage: read the three silver objects of a partition, join, write

use arrow::array::RecordBatch;
use tracing::{info, warn};

use countylake_core::gold::join_silver;
use countylake_core::parquet::{decode_parquet, encode_table, ParquetOptions};
use countylake_core::{Dataset, DatasetFiles, IngestDate};

use crate::error::{PipelineError, Result};
use crate::silver::DatasetOutput;
use crate::storage::ObjectStore;

/// Silver inputs of the join, in the order `join_silver` takes them
const JOIN_INPUTS: [Dataset; 3] = [
    Dataset::HousingAffordability,
    Dataset::SchoolPerformance,
    Dataset::SpecialEducation,
];

fn silver_path(files: &DatasetFiles, dataset: Dataset, partition: &IngestDate) -> Result<String> {
    files.silver_path(dataset, partition).ok_or_else(|| {
        PipelineError::invalid_config(format!("{} has no silver object", dataset))
    })
}

/// Build the gold county table for `partition` from its silver objects
///
/// All three silver objects must exist; otherwise nothing is written and the
/// first missing input is reported.
pub async fn join_to_gold(
    store: &dyn ObjectStore,
    files: &DatasetFiles,
    partition: &IngestDate,
    options: &ParquetOptions,
    require_full_coverage: bool,
) -> Result<DatasetOutput> {
    let mut paths = Vec::with_capacity(JOIN_INPUTS.len());
    for dataset in JOIN_INPUTS {
        let path = silver_path(files, dataset, partition)?;
        if !store.exists(&path).await? {
            warn!(dataset = %dataset, path = %path, "Silver input missing, gold not written");
            return Err(PipelineError::missing_silver_input(dataset.as_str(), path));
        }
        paths.push(path);
    }

    let mut batches = Vec::with_capacity(paths.len());
    for path in &paths {
        let bytes = store.read_bytes(path).await?;
        batches.push(decode_parquet(bytes, path)?);
    }

    let joined = join_silver(&batches[0], &batches[1], &batches[2], require_full_coverage)?;
    let encoded = encode_table(&joined.table, options)?;
    let path = files.gold_path(partition);
    store.write_bytes(&path, encoded.bytes).await?;

    info!(
        path = %path,
        rows = encoded.rows,
        columns = encoded.columns,
        uncovered = joined.uncovered.len(),
        "Wrote gold table"
    );

    Ok(DatasetOutput {
        rows: encoded.rows,
        columns: encoded.columns,
        output_path: path,
    })
}

/// Read the gold table of a partition back into memory
pub async fn read_gold(
    store: &dyn ObjectStore,
    files: &DatasetFiles,
    partition: &IngestDate,
) -> Result<RecordBatch> {
    let path = files.gold_path(partition);
    let bytes = store.read_bytes(&path).await?;
    decode_parquet(bytes, &path)
}
