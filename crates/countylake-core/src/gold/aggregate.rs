// County-level aggregation of the school and special-education tables

use std::collections::{BTreeMap, BTreeSet};

use crate::clean::special_education::inclusive_pct;
use crate::clean::{SchoolRecord, SpecialEducationRecord};

/// School performance rolled up to one county
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolAggregate {
    /// Distinct LEA ids
    pub district_count: i64,
    /// Distinct school ids
    pub school_count: i64,
    /// Mean of non-null CCRPI scores
    pub ccrpi_score_mean: Option<f64>,
}

/// Special education rolled up to one county
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialEducationAggregate {
    pub total_swd: Option<i64>,
    pub inclusive_80_plus: Option<i64>,
    /// Recomputed from LEAs that report both counts
    pub pct_inclusive_80_plus: Option<f64>,
    pub school_year: Option<String>,
}

#[derive(Default)]
struct SchoolAccumulator<'a> {
    leas: BTreeSet<&'a str>,
    schools: BTreeSet<&'a str>,
    score_sum: f64,
    scored: usize,
}

/// Aggregate schools by county; rows without a county key are skipped
pub fn aggregate_schools(records: &[SchoolRecord]) -> BTreeMap<String, SchoolAggregate> {
    let mut by_county: BTreeMap<&str, SchoolAccumulator<'_>> = BTreeMap::new();
    for record in records {
        let Some(county) = record.county.as_deref() else {
            continue;
        };
        let acc = by_county.entry(county).or_default();
        if let Some(lea) = record.lea_id.as_deref() {
            acc.leas.insert(lea);
        }
        if let Some(school) = record.school_id.as_deref() {
            acc.schools.insert(school);
        }
        if let Some(score) = record.ccrpi_score {
            acc.score_sum += score;
            acc.scored += 1;
        }
    }

    by_county
        .into_iter()
        .map(|(county, acc)| {
            let mean = (acc.scored > 0).then(|| acc.score_sum / acc.scored as f64);
            (
                county.to_string(),
                SchoolAggregate {
                    district_count: acc.leas.len() as i64,
                    school_count: acc.schools.len() as i64,
                    ccrpi_score_mean: mean,
                },
            )
        })
        .collect()
}

fn add(total: Option<i64>, value: Option<i64>) -> Option<i64> {
    match (total, value) {
        (Some(t), Some(v)) => Some(t + v),
        (None, v) => v,
        (t, None) => t,
    }
}

#[derive(Default)]
struct SpecialEducationAccumulator {
    total_swd: Option<i64>,
    inclusive_80_plus: Option<i64>,
    // Only LEAs reporting both counts contribute to the share
    paired_total: i64,
    paired_inclusive: i64,
    school_year: Option<String>,
}

/// Aggregate LEAs by county; rows without a county key are skipped
pub fn aggregate_special_education(
    records: &[SpecialEducationRecord],
) -> BTreeMap<String, SpecialEducationAggregate> {
    let mut by_county: BTreeMap<&str, SpecialEducationAccumulator> = BTreeMap::new();
    for record in records {
        let Some(county) = record.county.as_deref() else {
            continue;
        };
        let acc = by_county.entry(county).or_default();
        acc.total_swd = add(acc.total_swd, record.total_swd);
        acc.inclusive_80_plus = add(acc.inclusive_80_plus, record.inclusive_80_plus);
        if let (Some(total), Some(inclusive)) = (record.total_swd, record.inclusive_80_plus) {
            acc.paired_total += total;
            acc.paired_inclusive += inclusive;
        }
        if acc.school_year.is_none() {
            acc.school_year = record.school_year.clone();
        }
    }

    by_county
        .into_iter()
        .map(|(county, acc)| {
            (
                county.to_string(),
                SpecialEducationAggregate {
                    total_swd: acc.total_swd,
                    inclusive_80_plus: acc.inclusive_80_plus,
                    pct_inclusive_80_plus: inclusive_pct(
                        Some(acc.paired_inclusive),
                        Some(acc.paired_total),
                    ),
                    school_year: acc.school_year,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school(id: &str, lea: &str, county: Option<&str>, score: Option<f64>) -> SchoolRecord {
        SchoolRecord {
            school_id: Some(id.to_string()),
            school_name: None,
            lea_id: Some(lea.to_string()),
            district_name: None,
            county: county.map(str::to_string),
            ccrpi_score: score,
        }
    }

    fn lea(county: Option<&str>, total: Option<i64>, inclusive: Option<i64>, year: Option<&str>) -> SpecialEducationRecord {
        SpecialEducationRecord {
            lea_id: None,
            district_name: None,
            county: county.map(str::to_string),
            total_swd: total,
            inclusive_80_plus: inclusive,
            pct_inclusive_80_plus: None,
            school_year: year.map(str::to_string),
        }
    }

    #[test]
    fn test_school_aggregate() {
        let records = vec![
            school("1", "601", Some("Fulton"), Some(80.0)),
            school("2", "601", Some("Fulton"), None),
            school("2", "601", Some("Fulton"), Some(70.0)),
            school("3", "660", Some("Fulton"), Some(75.0)),
            school("9", "700", None, Some(10.0)),
        ];
        let agg = aggregate_schools(&records);
        assert_eq!(agg.len(), 1);
        let fulton = &agg["Fulton"];
        assert_eq!(fulton.school_count, 3);
        assert_eq!(fulton.district_count, 2);
        assert_eq!(fulton.ccrpi_score_mean, Some(75.0));
    }

    #[test]
    fn test_school_mean_null_when_no_scores() {
        let agg = aggregate_schools(&[school("1", "601", Some("Fulton"), None)]);
        assert_eq!(agg["Fulton"].ccrpi_score_mean, None);
    }

    #[test]
    fn test_special_education_sums_and_recomputes() {
        let records = vec![
            lea(Some("Fulton"), Some(150), Some(90), None),
            lea(Some("Fulton"), Some(50), Some(30), Some("2022-23")),
            lea(Some("Dekalb"), None, None, Some("2022-23")),
            lea(None, Some(1), Some(1), None),
        ];
        let agg = aggregate_special_education(&records);
        assert_eq!(agg.len(), 2);
        let fulton = &agg["Fulton"];
        assert_eq!(fulton.total_swd, Some(200));
        assert_eq!(fulton.inclusive_80_plus, Some(120));
        assert_eq!(fulton.pct_inclusive_80_plus, Some(60.0));
        assert_eq!(fulton.school_year.as_deref(), Some("2022-23"));
        assert_eq!(agg["Dekalb"].total_swd, None);
        assert_eq!(agg["Dekalb"].pct_inclusive_80_plus, None);
    }

    #[test]
    fn test_share_ignores_half_reported_leas() {
        let records = vec![
            lea(Some("Fulton"), Some(10), Some(10), None),
            lea(Some("Fulton"), None, Some(50), None),
            lea(Some("Fulton"), Some(30), None, None),
        ];
        let fulton = &aggregate_special_education(&records)["Fulton"];
        assert_eq!(fulton.total_swd, Some(40));
        assert_eq!(fulton.inclusive_80_plus, Some(60));
        assert_eq!(fulton.pct_inclusive_80_plus, Some(100.0));
    }

    #[test]
    fn test_share_null_without_complete_lea() {
        let records = vec![
            lea(Some("Cobb"), None, Some(12), None),
            lea(Some("Cobb"), Some(40), None, None),
        ];
        assert_eq!(aggregate_special_education(&records)["Cobb"].pct_inclusive_80_plus, None);
    }
}
