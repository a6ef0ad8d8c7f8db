use arrow::array::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::io::Write;

use super::encoding::{writer_properties, ParquetOptions};
use crate::error::{PipelineError, Result};
use crate::CleanedTable;

/// Parquet bytes of one table plus what the run summary reports about it
#[derive(Debug, Clone)]
pub struct EncodedParquet {
    pub bytes: Vec<u8>,
    pub rows: usize,
    pub columns: usize,
}

/// Write a `RecordBatch` into an arbitrary `Write` sink.
pub fn write_parquet_into<W>(
    batch: &RecordBatch,
    properties: parquet::file::properties::WriterProperties,
    writer: &mut W,
) -> Result<()>
where
    W: Write + Send,
{
    let mut arrow_writer = ArrowWriter::try_new(writer, batch.schema(), Some(properties))
        .map_err(|e| PipelineError::encoding("parquet writer", e))?;

    arrow_writer
        .write(batch)
        .map_err(|e| PipelineError::encoding("parquet write", e))?;
    arrow_writer
        .close()
        .map_err(|e| PipelineError::encoding("parquet close", e))?;

    Ok(())
}

/// Encode a cleaned or joined table into an in-memory Parquet file
pub fn encode_table(table: &CleanedTable, options: &ParquetOptions) -> Result<EncodedParquet> {
    let mut bytes = Vec::new();
    write_parquet_into(
        table.batch(),
        writer_properties(table.dataset(), options),
        &mut bytes,
    )?;

    Ok(EncodedParquet {
        bytes,
        rows: table.num_rows(),
        columns: table.num_columns(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::housing::{housing_records_to_batch, HousingRecord};
    use crate::partition::Dataset;

    fn housing_table() -> CleanedTable {
        let record = HousingRecord {
            geo_id: Some("0500000US13121".to_string()),
            county_name: Some("Fulton County, Georgia".to_string()),
            county: "Fulton".to_string(),
            occupied_housing_units: Some(1000),
            cost_burden: [Some(100.0), None, None, None, None],
            total_cost_burden_pct: Some(10.0),
        };
        CleanedTable::new(
            Dataset::HousingAffordability,
            housing_records_to_batch(&[record]).unwrap(),
        )
    }

    #[test]
    fn test_encode_table() {
        let encoded = encode_table(&housing_table(), &ParquetOptions::default()).unwrap();
        assert_eq!(encoded.rows, 1);
        assert_eq!(encoded.columns, 10);
        // Parquet files start with "PAR1" magic bytes
        assert_eq!(&encoded.bytes[0..4], b"PAR1");
    }

    #[test]
    fn test_encode_empty_table() {
        let table = CleanedTable::new(
            Dataset::HousingAffordability,
            housing_records_to_batch(&[]).unwrap(),
        );
        let encoded = encode_table(&table, &ParquetOptions::default()).unwrap();
        assert_eq!(encoded.rows, 0);
        assert!(!encoded.bytes.is_empty());
    }
}
