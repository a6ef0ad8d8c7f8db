//! Run orchestration: bronze → silver for each source, then silver → gold
//!
//! A run is strictly sequential and fails fast: the first error aborts it and
//! leaves whatever was already written in place. Re-running a partition
//! overwrites its objects.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use countylake_config::RuntimeConfig;
use countylake_core::parquet::ParquetOptions;
use countylake_core::{clean, Dataset, DatasetFiles, IngestDate};

use crate::error::{PipelineError, Result};
use crate::gold::join_to_gold;
use crate::silver::{write_silver, DatasetOutput};
use crate::storage::{open_store, ObjectStore};

/// Everything a run needs, resolved once up front
#[derive(Clone)]
pub struct PipelineContext {
    pub store: Arc<dyn ObjectStore>,
    pub ingest_date: IngestDate,
    pub files: DatasetFiles,
    pub parquet: ParquetOptions,
    pub require_full_coverage: bool,
}

impl PipelineContext {
    /// Open the configured store and resolve the ingest date
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let store = open_store(&config.storage)?;
        Self::with_store(store, config)
    }

    /// Use an already opened store with the rest of the configuration
    pub fn with_store(store: Arc<dyn ObjectStore>, config: &RuntimeConfig) -> Result<Self> {
        Ok(Self {
            store,
            ingest_date: config.pipeline.ingest_date()?,
            files: config.datasets.to_files(),
            parquet: ParquetOptions {
                row_group_size: config.storage.parquet_row_group_size,
                ..ParquetOptions::default()
            },
            require_full_coverage: config.pipeline.require_full_coverage,
        })
    }
}

/// Silver outputs keyed the way the HTTP response reports them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SilverSummary {
    pub housing: DatasetOutput,
    pub school: DatasetOutput,
    pub special_education: DatasetOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoldSummary {
    pub county_joined: DatasetOutput,
}

/// What one successful run wrote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ingest_date: String,
    pub silver: SilverSummary,
    pub gold: GoldSummary,
}

async fn bronze_to_silver(ctx: &PipelineContext, dataset: Dataset) -> Result<DatasetOutput> {
    let path = ctx
        .files
        .bronze_path(dataset, &ctx.ingest_date)
        .ok_or_else(|| PipelineError::invalid_config(format!("{} has no bronze object", dataset)))?;

    let raw = ctx.store.read_bytes(&path).await?;
    info!(dataset = %dataset, path = %path, bytes = raw.len(), "Read bronze object");

    let table = clean(dataset, &raw)?;
    write_silver(
        ctx.store.as_ref(),
        &ctx.files,
        &ctx.ingest_date,
        &table,
        &ctx.parquet,
    )
    .await
}

/// Clean the three bronze objects of the partition into silver
#[instrument(skip(ctx), fields(ingest_date = %ctx.ingest_date, backend = ctx.store.backend()))]
pub async fn run_bronze_to_silver(ctx: &PipelineContext) -> Result<SilverSummary> {
    let housing = bronze_to_silver(ctx, Dataset::HousingAffordability).await?;
    let special_education = bronze_to_silver(ctx, Dataset::SpecialEducation).await?;
    let school = bronze_to_silver(ctx, Dataset::SchoolPerformance).await?;

    Ok(SilverSummary {
        housing,
        school,
        special_education,
    })
}

/// Full run: bronze → silver, then the gold join
#[instrument(skip(ctx), fields(ingest_date = %ctx.ingest_date, backend = ctx.store.backend()))]
pub async fn run_pipeline(ctx: &PipelineContext) -> Result<RunSummary> {
    let started = Instant::now();
    info!("Starting pipeline run");

    let silver = run_bronze_to_silver(ctx).await?;
    let county_joined = join_to_gold(
        ctx.store.as_ref(),
        &ctx.files,
        &ctx.ingest_date,
        &ctx.parquet,
        ctx.require_full_coverage,
    )
    .await?;

    info!(
        gold_rows = county_joined.rows,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Pipeline run complete"
    );

    Ok(RunSummary {
        ingest_date: ctx.ingest_date.to_string(),
        silver,
        gold: GoldSummary { county_joined },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use countylake_config::{LocalConfig, StorageConfig};

    fn config_for(root: &std::path::Path) -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.pipeline.ingest_date = Some("2024-01-01".to_string());
        config.storage = StorageConfig {
            parquet_row_group_size: 128,
            local: Some(LocalConfig {
                root: root.to_string_lossy().into_owned(),
            }),
            ..StorageConfig::default()
        };
        config
    }

    #[test]
    fn test_context_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = PipelineContext::from_config(&config_for(dir.path())).unwrap();
        assert_eq!(ctx.ingest_date.to_string(), "2024-01-01");
        assert_eq!(ctx.parquet.row_group_size, 128);
        assert_eq!(ctx.store.backend(), "local");
        assert!(!ctx.require_full_coverage);
    }

    #[test]
    fn test_context_rejects_bad_ingest_date() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(dir.path());
        config.pipeline.ingest_date = Some("01/02/2024".to_string());
        let err = PipelineContext::from_config(&config).err().unwrap();
        assert_eq!(err.code().as_str(), "E006");
    }

    #[tokio::test]
    async fn test_missing_bronze_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = PipelineContext::from_config(&config_for(dir.path())).unwrap();
        let err = run_pipeline(&ctx).await.unwrap_err();
        assert_eq!(err.code().as_str(), "E001");
        assert!(err
            .to_string()
            .contains("bronze/housing_affordability/ingest_date=2024-01-01/housing2019-23.csv"));
    }
}
