//! Error types shared by every pipeline stage

use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Input object does not exist
    E001NotFound,
    /// E002: Expected column absent from an input table
    E002Schema,
    /// E003: Storage backend rejected a write
    E003StorageWrite,
    /// E004: One of the silver inputs for the gold join is absent
    E004MissingSilverInput,
    /// E005: Join coverage incomplete while full coverage is required
    E005JoinKeyMismatch,
    /// E006: Configuration missing or invalid
    E006InvalidConfig,
    /// E007: Encoding or decoding a table failed
    E007Encoding,
    /// E008: Storage backend failed a read for a reason other than absence
    E008StorageRead,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001NotFound => "E001",
            Self::E002Schema => "E002",
            Self::E003StorageWrite => "E003",
            Self::E004MissingSilverInput => "E004",
            Self::E005JoinKeyMismatch => "E005",
            Self::E006InvalidConfig => "E006",
            Self::E007Encoding => "E007",
            Self::E008StorageRead => "E008",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a pipeline run
///
/// Row-level problems (a non-numeric cell in a numeric column) never surface
/// here; cleaners coerce them to null. Everything in this enum is fatal to
/// the current run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input object is absent from storage
    #[error("[E001] Object not found: '{path}'")]
    NotFound { path: String },

    /// Expected column absent in an input table
    #[error("[E002] Schema error in {dataset}: expected column '{column}' is missing")]
    Schema { dataset: String, column: String },

    /// Backend I/O failure while writing
    #[error("[E003] Failed to write '{path}': {reason}")]
    StorageWrite { path: String, reason: String },

    /// A silver input for the requested partition is absent
    #[error("[E004] Missing silver input for {dataset}: '{path}' does not exist; gold output not written")]
    MissingSilverInput { dataset: String, path: String },

    /// Full coverage required but some counties have no match
    #[error("[E005] Join coverage incomplete: {count} county key(s) unmatched ({sample})")]
    JoinKeyMismatch {
        count: usize,
        sample: String,
        counties: Vec<String>,
    },

    /// Invalid configuration value reached a pipeline component
    #[error("[E006] Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Parsing or serializing a table failed
    #[error("[E007] Encoding failure ({context}): {reason}")]
    Encoding { context: String, reason: String },

    /// Backend I/O failure while reading
    #[error("[E008] Failed to read '{path}': {reason}")]
    StorageRead { path: String, reason: String },
}

impl PipelineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::E001NotFound,
            Self::Schema { .. } => ErrorCode::E002Schema,
            Self::StorageWrite { .. } => ErrorCode::E003StorageWrite,
            Self::MissingSilverInput { .. } => ErrorCode::E004MissingSilverInput,
            Self::JoinKeyMismatch { .. } => ErrorCode::E005JoinKeyMismatch,
            Self::InvalidConfig { .. } => ErrorCode::E006InvalidConfig,
            Self::Encoding { .. } => ErrorCode::E007Encoding,
            Self::StorageRead { .. } => ErrorCode::E008StorageRead,
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn schema(dataset: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Schema {
            dataset: dataset.into(),
            column: column.into(),
        }
    }

    pub fn storage_write(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::StorageWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn storage_read(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::StorageRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn missing_silver_input(dataset: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MissingSilverInput {
            dataset: dataset.into(),
            path: path.into(),
        }
    }

    /// Build a coverage error; the message lists at most five counties
    pub fn join_key_mismatch(counties: Vec<String>) -> Self {
        let mut sample = counties
            .iter()
            .take(5)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if counties.len() > 5 {
            sample.push_str(", ...");
        }
        Self::JoinKeyMismatch {
            count: counties.len(),
            sample,
            counties,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn encoding(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::Encoding {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;
