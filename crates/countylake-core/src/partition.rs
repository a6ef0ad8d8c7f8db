//! Lake path generation for ingest-date partitions
//!
//! Generates Hive-style partition paths:
//! `{layer}/{dataset}/ingest_date={YYYY-MM-DD}/{filename}`
//!
//! Paths are container-relative so the same string addresses an object on the
//! local filesystem and in the data lake.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineError, Result};

const INGEST_DATE_FORMAT: &str = "%Y-%m-%d";

/// Medallion layer of a lake object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Bronze,
    Silver,
    Gold,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Bronze => "bronze",
            Layer::Silver => "silver",
            Layer::Gold => "gold",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical dataset names used as the second path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    HousingAffordability,
    SpecialEducation,
    SchoolPerformance,
    /// Joined gold output
    CountyAnalysis,
}

impl Dataset {
    /// The three source datasets, in pipeline order
    pub const SOURCES: [Dataset; 3] = [
        Dataset::HousingAffordability,
        Dataset::SpecialEducation,
        Dataset::SchoolPerformance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::HousingAffordability => "housing_affordability",
            Dataset::SpecialEducation => "special_education",
            Dataset::SchoolPerformance => "school_performance",
            Dataset::CountyAnalysis => "county_analysis",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar date identifying one pipeline run's outputs
///
/// Always valid once constructed, so path resolution cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IngestDate(NaiveDate);

impl IngestDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse a strict `YYYY-MM-DD` string (surrounding whitespace is ignored)
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        NaiveDate::parse_from_str(trimmed, INGEST_DATE_FORMAT)
            .map(Self)
            .map_err(|e| {
                PipelineError::invalid_config(format!(
                    "ingest date '{}' is not a YYYY-MM-DD date: {}",
                    trimmed, e
                ))
            })
    }

    /// Today's date in UTC
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// Use the configured date if present, today otherwise
    pub fn from_config(value: Option<&str>) -> Result<Self> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => Self::parse(v),
            None => Ok(Self::today()),
        }
    }

    /// Directory segment, e.g. `ingest_date=2024-01-01`
    pub fn segment(&self) -> String {
        format!("ingest_date={}", self)
    }
}

impl fmt::Display for IngestDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(INGEST_DATE_FORMAT))
    }
}

impl FromStr for IngestDate {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Resolve the container-relative path of a lake object
///
/// Format: `{layer}/{dataset}/ingest_date={partition}/{filename}`
///
/// Pure string construction. Leading slashes on `dataset` and `filename` are
/// stripped so callers cannot escape the layer directory by accident.
pub fn resolve(layer: Layer, dataset: &str, partition: &IngestDate, filename: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        layer,
        dataset.trim_matches('/'),
        partition.segment(),
        filename.trim_start_matches('/')
    )
}

/// Object filenames for each dataset and layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFiles {
    pub housing_bronze: String,
    pub special_education_bronze: String,
    pub school_performance_bronze: String,
    pub housing_silver: String,
    pub special_education_silver: String,
    pub school_performance_silver: String,
    pub gold: String,
}

impl Default for DatasetFiles {
    fn default() -> Self {
        Self {
            housing_bronze: "housing2019-23.csv".to_string(),
            special_education_bronze: "special_education2022-23.csv".to_string(),
            school_performance_bronze: "school_performance.xlsx".to_string(),
            housing_silver: "housing2019-23.parquet".to_string(),
            special_education_silver: "special_education2022-23.parquet".to_string(),
            school_performance_silver: "school_performance2023.parquet".to_string(),
            gold: "county_joined.parquet".to_string(),
        }
    }
}

impl DatasetFiles {
    pub fn bronze_filename(&self, dataset: Dataset) -> Option<&str> {
        match dataset {
            Dataset::HousingAffordability => Some(&self.housing_bronze),
            Dataset::SpecialEducation => Some(&self.special_education_bronze),
            Dataset::SchoolPerformance => Some(&self.school_performance_bronze),
            Dataset::CountyAnalysis => None,
        }
    }

    pub fn silver_filename(&self, dataset: Dataset) -> Option<&str> {
        match dataset {
            Dataset::HousingAffordability => Some(&self.housing_silver),
            Dataset::SpecialEducation => Some(&self.special_education_silver),
            Dataset::SchoolPerformance => Some(&self.school_performance_silver),
            Dataset::CountyAnalysis => None,
        }
    }

    /// Bronze path of a source dataset; `None` for the gold dataset
    pub fn bronze_path(&self, dataset: Dataset, partition: &IngestDate) -> Option<String> {
        self.bronze_filename(dataset)
            .map(|f| resolve(Layer::Bronze, dataset.as_str(), partition, f))
    }

    /// Silver path of a source dataset; `None` for the gold dataset
    pub fn silver_path(&self, dataset: Dataset, partition: &IngestDate) -> Option<String> {
        self.silver_filename(dataset)
            .map(|f| resolve(Layer::Silver, dataset.as_str(), partition, f))
    }

    pub fn gold_path(&self, partition: &IngestDate) -> String {
        resolve(
            Layer::Gold,
            Dataset::CountyAnalysis.as_str(),
            partition,
            &self.gold,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan_first() -> IngestDate {
        IngestDate::parse("2024-01-01").unwrap()
    }

    #[test]
    fn test_resolve_layout() {
        let path = resolve(
            Layer::Silver,
            "housing_affordability",
            &jan_first(),
            "housing2019-23.parquet",
        );
        assert_eq!(
            path,
            "silver/housing_affordability/ingest_date=2024-01-01/housing2019-23.parquet"
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let a = resolve(Layer::Gold, "county_analysis", &jan_first(), "x.parquet");
        let b = resolve(Layer::Gold, "county_analysis", &jan_first(), "x.parquet");
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_strips_stray_slashes() {
        let path = resolve(Layer::Bronze, "/special_education/", &jan_first(), "/a.csv");
        assert_eq!(path, "bronze/special_education/ingest_date=2024-01-01/a.csv");
    }

    #[test]
    fn test_ingest_date_parsing() {
        assert_eq!(IngestDate::parse(" 2024-02-29 ").unwrap().to_string(), "2024-02-29");
        assert!(IngestDate::parse("2023-02-29").is_err());
        assert!(IngestDate::parse("01/02/2024").is_err());
        assert!("2024-13-01".parse::<IngestDate>().is_err());
    }

    #[test]
    fn test_ingest_date_from_config_defaults_to_today() {
        let today = IngestDate::today();
        assert_eq!(IngestDate::from_config(None).unwrap(), today);
        assert_eq!(IngestDate::from_config(Some("  ")).unwrap(), today);
        assert_eq!(
            IngestDate::from_config(Some("2024-01-01")).unwrap(),
            jan_first()
        );
    }

    #[test]
    fn test_default_dataset_paths() {
        let files = DatasetFiles::default();
        let p = jan_first();
        assert_eq!(
            files.bronze_path(Dataset::SchoolPerformance, &p).unwrap(),
            "bronze/school_performance/ingest_date=2024-01-01/school_performance.xlsx"
        );
        assert_eq!(
            files.silver_path(Dataset::SpecialEducation, &p).unwrap(),
            "silver/special_education/ingest_date=2024-01-01/special_education2022-23.parquet"
        );
        assert_eq!(
            files.gold_path(&p),
            "gold/county_analysis/ingest_date=2024-01-01/county_joined.parquet"
        );
        assert!(files.bronze_path(Dataset::CountyAnalysis, &p).is_none());
    }
}
