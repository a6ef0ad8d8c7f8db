// countylake-config - Runtime configuration for the pipeline
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
//    - the pipeline's unprefixed names (PIPELINE_STORAGE_MODE, ADLS_*, INGEST_DATE, AZURE_CLIENT_ID)
//    - COUNTYLAKE_* overrides for everything else
// 2. Config file path from COUNTYLAKE_CONFIG
// 3. Config file contents from COUNTYLAKE_CONFIG_CONTENT
// 4. Default config file location (./countylake.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::Result;
use countylake_core::parquet::DEFAULT_ROW_GROUP_SIZE;
use countylake_core::{DatasetFiles, IngestDate};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};
pub use sources::StdEnvSource;

/// Main runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub datasets: DatasetsConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Run-level settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// `YYYY-MM-DD`; today's UTC date when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingest_date: Option<String>,

    /// Fail the gold join when a housing county lacks a school or
    /// special-education match
    #[serde(default)]
    pub require_full_coverage: bool,
}

impl PipelineConfig {
    /// Resolve the partition for this run
    pub fn ingest_date(&self) -> countylake_core::Result<IngestDate> {
        IngestDate::from_config(self.ingest_date.as_deref())
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub mode: StorageMode,

    /// Prefix applied to every lake path, in either backend
    #[serde(default)]
    pub base_path: String,

    #[serde(default = "default_parquet_row_group_size")]
    pub parquet_row_group_size: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adls: Option<AdlsConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::Local,
            base_path: String::new(),
            parquet_row_group_size: default_parquet_row_group_size(),
            local: Some(LocalConfig::default()),
            adls: None,
        }
    }
}

fn default_parquet_row_group_size() -> usize {
    DEFAULT_ROW_GROUP_SIZE
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    #[default]
    Local,
    Adls,
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::Local => write!(f, "local"),
            StorageMode::Adls => write!(f, "adls"),
        }
    }
}

impl std::str::FromStr for StorageMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "fs" | "filesystem" => Ok(StorageMode::Local),
            "adls" | "azure" => Ok(StorageMode::Adls),
            _ => anyhow::bail!("Unsupported storage mode: {}. Supported: local, adls", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Directory holding the bronze/silver/gold trees
    pub root: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            root: "./data".to_string(),
        }
    }
}

/// Azure Data Lake Storage Gen2 settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdlsConfig {
    /// e.g. `https://<account>.dfs.core.windows.net`
    pub account_url: String,
    /// Container (filesystem) name
    pub file_system: String,
    /// Client id of a user-assigned managed identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Shared account key; local development only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_key: Option<String>,
}

impl AdlsConfig {
    /// Storage account name: the first host label of `account_url`
    pub fn account_name(&self) -> Option<&str> {
        let url = self.account_url.trim();
        let host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url);
        let name = host.split(['.', '/']).next()?;
        (!name.is_empty()).then_some(name)
    }

    /// Endpoint without trailing slash
    pub fn endpoint(&self) -> &str {
        self.account_url.trim().trim_end_matches('/')
    }
}

/// Object names per dataset; see `DatasetFiles` for the defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetsConfig {
    pub housing_bronze: String,
    pub special_education_bronze: String,
    pub school_performance_bronze: String,
    pub housing_silver: String,
    pub special_education_silver: String,
    pub school_performance_silver: String,
    pub gold: String,
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        DatasetFiles::default().into()
    }
}

impl From<DatasetFiles> for DatasetsConfig {
    fn from(files: DatasetFiles) -> Self {
        Self {
            housing_bronze: files.housing_bronze,
            special_education_bronze: files.special_education_bronze,
            school_performance_bronze: files.school_performance_bronze,
            housing_silver: files.housing_silver,
            special_education_silver: files.special_education_silver,
            school_performance_silver: files.school_performance_silver,
            gold: files.gold,
        }
    }
}

impl DatasetsConfig {
    pub fn to_files(&self) -> DatasetFiles {
        DatasetFiles {
            housing_bronze: self.housing_bronze.clone(),
            special_education_bronze: self.special_education_bronze.clone(),
            school_performance_bronze: self.school_performance_bronze.clone(),
            housing_silver: self.housing_silver.clone(),
            special_education_silver: self.special_education_silver.clone(),
            school_performance_silver: self.school_performance_silver.clone(),
            gold: self.gold.clone(),
        }
    }
}

/// Server-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:7071".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config(&StdEnvSource)
    }

    /// Load with a custom environment source (useful for testing)
    pub fn load_with_env<E: EnvSource>(env: &E) -> Result<Self> {
        sources::load_config(env)
    }

    /// Load from an explicit file (CLI `--config`), then apply env overrides
    pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path, &StdEnvSource)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
