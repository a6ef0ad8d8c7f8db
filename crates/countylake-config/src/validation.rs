// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use countylake_core::IngestDate;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_pipeline_config(&config.pipeline)?;
    validate_storage_config(&config.storage)?;
    validate_datasets_config(&config.datasets)?;
    validate_server_config(&config.server)?;
    Ok(())
}

fn validate_pipeline_config(config: &PipelineConfig) -> Result<()> {
    if let Some(ref date) = config.ingest_date {
        if let Err(e) = IngestDate::parse(date) {
            bail!("pipeline.ingest_date is invalid: {}", e);
        }
    }
    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    if config.parquet_row_group_size == 0 {
        bail!("storage.parquet_row_group_size must be greater than 0");
    }

    if config.parquet_row_group_size > 10_000_000 {
        warn!(
            parquet_row_group_size = config.parquet_row_group_size,
            "storage.parquet_row_group_size is very large; may cause memory issues"
        );
    }

    match config.mode {
        StorageMode::Local => {
            if let Some(ref local) = config.local {
                if local.root.trim().is_empty() {
                    bail!("storage.local.root must not be empty");
                }
            }
        }
        StorageMode::Adls => {
            let adls = config.adls.as_ref().ok_or_else(|| {
                anyhow::anyhow!("ADLS_ACCOUNT_URL is required when PIPELINE_STORAGE_MODE=adls")
            })?;

            if adls.account_url.trim().is_empty() {
                bail!("ADLS_ACCOUNT_URL is required when PIPELINE_STORAGE_MODE=adls");
            }

            if adls.account_name().is_none() {
                bail!(
                    "ADLS_ACCOUNT_URL '{}' does not name a storage account",
                    adls.account_url
                );
            }

            if adls.file_system.trim().is_empty() {
                bail!("ADLS_FILE_SYSTEM is required when PIPELINE_STORAGE_MODE=adls");
            }

            if !adls.account_url.trim().starts_with("https://") {
                warn!(
                    account_url = %adls.account_url,
                    "ADLS_ACCOUNT_URL is not an https URL"
                );
            }
        }
    }

    Ok(())
}

fn validate_datasets_config(config: &DatasetsConfig) -> Result<()> {
    let names = [
        ("datasets.housing_bronze", &config.housing_bronze),
        ("datasets.special_education_bronze", &config.special_education_bronze),
        ("datasets.school_performance_bronze", &config.school_performance_bronze),
        ("datasets.housing_silver", &config.housing_silver),
        ("datasets.special_education_silver", &config.special_education_silver),
        ("datasets.school_performance_silver", &config.school_performance_silver),
        ("datasets.gold", &config.gold),
    ];
    for (key, value) in names {
        if value.trim_matches('/').trim().is_empty() {
            bail!("{} must not be empty", key);
        }
    }
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.listen_addr.is_empty() {
        bail!("server.listen_addr must not be empty");
    }

    // Basic validation that it looks like an address
    if !config.listen_addr.contains(':') {
        bail!("server.listen_addr must be in format 'host:port'");
    }

    Ok(())
}
