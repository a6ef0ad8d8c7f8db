use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;

use crate::partition::Dataset;
use crate::schema::SCHEMA_VERSION;

pub const DEFAULT_ROW_GROUP_SIZE: usize = 32 * 1024;
const DEFAULT_ZSTD_LEVEL: i32 = 2;

/// Tunables for Parquet output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParquetOptions {
    /// Maximum rows per row group
    pub row_group_size: usize,
    pub zstd_level: i32,
}

impl Default for ParquetOptions {
    fn default() -> Self {
        Self {
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            zstd_level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

fn compression_setting(level: i32) -> Compression {
    Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default())
}

/// Writer properties for one table
///
/// - ZSTD compression
/// - Dictionary encoding enabled
/// - Page-level statistics
/// - `countylake.*` key/value metadata identifying the dataset
pub fn writer_properties(dataset: Dataset, options: &ParquetOptions) -> WriterProperties {
    let metadata = vec![
        KeyValue {
            key: "countylake.version".to_string(),
            value: Some(env!("CARGO_PKG_VERSION").to_string()),
        },
        KeyValue {
            key: "countylake.schema_version".to_string(),
            value: Some(SCHEMA_VERSION.to_string()),
        },
        KeyValue {
            key: "countylake.dataset".to_string(),
            value: Some(dataset.as_str().to_string()),
        },
    ];

    WriterProperties::builder()
        .set_dictionary_enabled(true)
        .set_statistics_enabled(EnabledStatistics::Page)
        .set_compression(compression_setting(options.zstd_level))
        .set_data_page_size_limit(256 * 1024)
        .set_write_batch_size(32 * 1024)
        .set_max_row_group_size(options.row_group_size.max(1))
        .set_dictionary_page_size_limit(128 * 1024)
        .set_key_value_metadata(Some(metadata))
        .build()
}
