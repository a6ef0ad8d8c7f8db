// Cleaned tables and typed column access
//
// A `CleanedTable` is an Arrow `RecordBatch` tagged with the dataset it was
// produced for. Column accessors look columns up by name so that readers do
// not depend on column order, and report drift as schema errors.

use arrow::array::{Array, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::SchemaRef;

use crate::error::{PipelineError, Result};
use crate::partition::Dataset;

/// In-memory table produced by a cleaner or the gold join
#[derive(Debug, Clone)]
pub struct CleanedTable {
    dataset: Dataset,
    batch: RecordBatch,
}

impl CleanedTable {
    pub fn new(dataset: Dataset, batch: RecordBatch) -> Self {
        Self { dataset, batch }
    }

    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }
}

fn column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    dataset: Dataset,
    name: &str,
    expected: &str,
) -> Result<&'a T> {
    let array = batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::schema(dataset.as_str(), name))?;
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        PipelineError::encoding(
            format!("{} column '{}'", dataset, name),
            format!("expected {}, found {}", expected, array.data_type()),
        )
    })
}

pub(crate) fn string_column<'a>(
    batch: &'a RecordBatch,
    dataset: Dataset,
    name: &str,
) -> Result<&'a StringArray> {
    column(batch, dataset, name, "Utf8")
}

pub(crate) fn int_column<'a>(
    batch: &'a RecordBatch,
    dataset: Dataset,
    name: &str,
) -> Result<&'a Int64Array> {
    column(batch, dataset, name, "Int64")
}

pub(crate) fn float_column<'a>(
    batch: &'a RecordBatch,
    dataset: Dataset,
    name: &str,
) -> Result<&'a Float64Array> {
    column(batch, dataset, name, "Float64")
}

pub(crate) fn opt_string(array: &StringArray, row: usize) -> Option<String> {
    (!array.is_null(row)).then(|| array.value(row).to_string())
}

pub(crate) fn opt_i64(array: &Int64Array, row: usize) -> Option<i64> {
    (!array.is_null(row)).then(|| array.value(row))
}

pub(crate) fn opt_f64(array: &Float64Array, row: usize) -> Option<f64> {
    (!array.is_null(row)).then(|| array.value(row))
}
