// Parquet encoding for silver and gold tables
//
// Encoding and decoding are pure byte transformations; storage is handled by
// the writer crate.

pub mod encoding;
pub mod reader;
pub mod writer;

pub use encoding::{writer_properties, ParquetOptions, DEFAULT_ROW_GROUP_SIZE};
pub use reader::decode_parquet;
pub use writer::{encode_table, write_parquet_into, EncodedParquet};
