//! Error types for storage and pipeline stages
//!
//! The pipeline shares one error taxonomy with the core crate; this module
//! maps OpenDAL failures onto it.

pub use countylake_core::error::{ErrorCode, PipelineError, Result};

/// Map a failed read: absence becomes `NotFound`, anything else `StorageRead`
pub(crate) fn read_error(path: &str, err: opendal::Error) -> PipelineError {
    if err.kind() == opendal::ErrorKind::NotFound {
        PipelineError::not_found(path)
    } else {
        PipelineError::storage_read(path, err)
    }
}

pub(crate) fn write_error(path: &str, err: opendal::Error) -> PipelineError {
    PipelineError::storage_write(path, err)
}
