// End-to-end tests: bronze objects on a local lake → full run → gold table

use arrow::array::Array;
use countylake_config::{LocalConfig, RuntimeConfig, StorageConfig};
use countylake_core::gold::gold_rows_from_batch;
use countylake_core::Dataset;
use countylake_writer::{
    join_to_gold, read_gold, run_bronze_to_silver, run_pipeline, ObjectStore, PipelineContext,
};

const HOUSING: &str = "\
GEO_ID,NAME,S2503_C01_001E,S2503_C01_028E,S2503_C01_032E,S2503_C01_036E,S2503_C01_040E,S2503_C01_044E
Geography,Geographic Area Name,Occupied,a,b,c,d,e
0500000US13121,\"Fulton County, Georgia\",1000,100,50,25,0,0
0500000US13089,\"DeKalb County, Georgia\",500,50,25,25,0,0
";

const SPECIAL: &str = "\
Georgia Department of Education
,
State LEA ID,LEA Name,School Age All Educational Environments,School Age Inside regular class 80% or more of the day,School Year
601,Fulton County,200,120,2022-23
644,DeKalb County,80,60,2022-23
";

const SCHOOLS: &str = "\
schoolid,schoolname,systemid,systemname,single_score_23
0101,North High,601,Fulton County,80
0102,South Elementary,601,Fulton County,70
0201,Lakeside High,644,DeKalb County,71.5
";

fn config_for(root: &std::path::Path) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.pipeline.ingest_date = Some("2024-01-01".to_string());
    config.datasets.school_performance_bronze = "school_performance.csv".to_string();
    config.storage = StorageConfig {
        local: Some(LocalConfig {
            root: root.to_string_lossy().into_owned(),
        }),
        ..StorageConfig::default()
    };
    config
}

async fn stage(ctx: &PipelineContext, housing: &str, special: &str, schools: &str) {
    for (dataset, raw) in [
        (Dataset::HousingAffordability, housing),
        (Dataset::SpecialEducation, special),
        (Dataset::SchoolPerformance, schools),
    ] {
        let path = ctx.files.bronze_path(dataset, &ctx.ingest_date).unwrap();
        ctx.store
            .write_bytes(&path, raw.as_bytes().to_vec())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_counties_in_every_source_join_once() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = PipelineContext::from_config(&config_for(dir.path())).unwrap();
    stage(&ctx, HOUSING, SPECIAL, SCHOOLS).await;

    let summary = run_pipeline(&ctx).await.unwrap();
    assert_eq!(summary.gold.county_joined.rows, 2);

    let batch = read_gold(ctx.store.as_ref(), &ctx.files, &ctx.ingest_date)
        .await
        .unwrap();
    assert_eq!(batch.num_rows(), 2);
    for column in batch.columns() {
        assert_eq!(column.null_count(), 0);
    }

    let rows = gold_rows_from_batch(&batch).unwrap();
    assert_eq!(rows[0].county, "Dekalb");
    assert_eq!(rows[0].total_cost_burden_pct, Some(20.0));
    assert_eq!(rows[0].pct_inclusive_80_plus, Some(75.0));
    assert_eq!(rows[1].county, "Fulton");
    assert_eq!(rows[1].school_count, Some(2));
    assert_eq!(rows[1].district_count, Some(1));
    assert_eq!(rows[1].ccrpi_score_mean, Some(75.0));
    assert_eq!(rows[1].school_year.as_deref(), Some("2022-23"));
}

#[tokio::test]
async fn test_county_without_special_education_keeps_nulls() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = PipelineContext::from_config(&config_for(dir.path())).unwrap();

    let housing = format!(
        "{}0500000US13067,\"Cobb County, Georgia\",900,9,9,9,9,9\n",
        HOUSING
    );
    let schools = format!("{}0301,Harbor Middle,900,Cobb County,66\n", SCHOOLS);
    stage(&ctx, &housing, SPECIAL, &schools).await;

    run_pipeline(&ctx).await.unwrap();
    let batch = read_gold(ctx.store.as_ref(), &ctx.files, &ctx.ingest_date)
        .await
        .unwrap();
    let rows = gold_rows_from_batch(&batch).unwrap();
    assert_eq!(rows.len(), 3);

    let cobb = rows.iter().find(|r| r.county == "Cobb").unwrap();
    assert_eq!(cobb.school_count, Some(1));
    assert_eq!(cobb.ccrpi_score_mean, Some(66.0));
    assert_eq!(cobb.total_swd, None);
    assert_eq!(cobb.pct_inclusive_80_plus, None);
    assert_eq!(cobb.school_year, None);
}

#[tokio::test]
async fn test_missing_silver_input_leaves_no_gold() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = PipelineContext::from_config(&config_for(dir.path())).unwrap();
    stage(&ctx, HOUSING, SPECIAL, SCHOOLS).await;
    run_bronze_to_silver(&ctx).await.unwrap();

    let school = ctx
        .files
        .silver_path(Dataset::SchoolPerformance, &ctx.ingest_date)
        .unwrap();
    std::fs::remove_file(dir.path().join(school)).unwrap();

    let err = join_to_gold(
        ctx.store.as_ref(),
        &ctx.files,
        &ctx.ingest_date,
        &ctx.parquet,
        ctx.require_full_coverage,
    )
    .await
    .unwrap_err();
    assert_eq!(err.code().as_str(), "E004");
    assert!(!dir
        .path()
        .join(ctx.files.gold_path(&ctx.ingest_date))
        .exists());
}

#[tokio::test]
async fn test_partitions_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = PipelineContext::from_config(&config_for(dir.path())).unwrap();
    stage(&ctx, HOUSING, SPECIAL, SCHOOLS).await;
    run_pipeline(&ctx).await.unwrap();

    let mut other = config_for(dir.path());
    other.pipeline.ingest_date = Some("2024-02-01".to_string());
    let other = PipelineContext::from_config(&other).unwrap();
    let err = run_pipeline(&other).await.unwrap_err();
    assert_eq!(err.code().as_str(), "E001");
    assert!(err.to_string().contains("ingest_date=2024-02-01"));
}
