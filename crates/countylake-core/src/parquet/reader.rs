use arrow::array::RecordBatch;
use arrow::compute::concat_batches;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::{PipelineError, Result};

/// Decode a whole Parquet object into a single `RecordBatch`
///
/// Silver and gold tables are small (one row per county, LEA or school), so
/// row groups are concatenated rather than streamed.
pub fn decode_parquet(bytes: Bytes, context: &str) -> Result<RecordBatch> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)
        .map_err(|e| PipelineError::encoding(context, e))?;
    let schema = builder.schema().clone();
    let reader = builder
        .build()
        .map_err(|e| PipelineError::encoding(context, e))?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| PipelineError::encoding(context, e))?;

    concat_batches(&schema, &batches).map_err(|e| PipelineError::encoding(context, e))
}
