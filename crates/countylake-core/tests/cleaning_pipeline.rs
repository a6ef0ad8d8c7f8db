// Integration tests for countylake-core
//
// Raw fixtures → cleaned tables → Parquet bytes → decoded batches → gold

use bytes::Bytes;
use countylake_core::gold::{gold_rows_from_batch, highlights, join_silver};
use countylake_core::parquet::{decode_parquet, encode_table, ParquetOptions};
use countylake_core::{clean, Dataset};

const HOUSING: &[u8] = include_bytes!("testdata/housing2019-23.csv");
const SPECIAL: &[u8] = include_bytes!("testdata/special_education2022-23.csv");
const SCHOOLS_XLSX: &[u8] = include_bytes!("testdata/school_performance.xlsx");

fn silver_round_trip(dataset: Dataset, raw: &[u8]) -> arrow::array::RecordBatch {
    let table = clean(dataset, raw).expect("clean");
    let encoded = encode_table(&table, &ParquetOptions::default()).expect("encode");
    let decoded = decode_parquet(Bytes::from(encoded.bytes), dataset.as_str()).expect("decode");
    assert_eq!(decoded.num_rows(), table.num_rows());
    assert_eq!(decoded.schema().fields(), table.schema().fields());
    decoded
}

#[test]
fn test_school_workbook_is_cleaned() {
    let table = clean(Dataset::SchoolPerformance, SCHOOLS_XLSX).unwrap();
    assert_eq!(table.num_rows(), 4);

    let records =
        countylake_core::clean::school_performance::school_records_from_batch(table.batch())
            .unwrap();
    assert_eq!(records[0].school_id.as_deref(), Some("0101"));
    assert_eq!(records[0].lea_id.as_deref(), Some("601"));
    assert_eq!(records[0].ccrpi_score, Some(80.0));
    assert_eq!(records[2].county.as_deref(), Some("Dekalb"));
    assert_eq!(records[3].ccrpi_score, None);
}

#[test]
fn test_fixtures_flow_through_to_gold() {
    let housing = silver_round_trip(Dataset::HousingAffordability, HOUSING);
    let special = silver_round_trip(Dataset::SpecialEducation, SPECIAL);
    let schools = silver_round_trip(Dataset::SchoolPerformance, SCHOOLS_XLSX);

    let joined = join_silver(&housing, &schools, &special, false).unwrap();
    let rows = gold_rows_from_batch(joined.table.batch()).unwrap();
    let counties: Vec<_> = rows.iter().map(|r| r.county.as_str()).collect();
    assert_eq!(counties, vec!["Cobb", "Dekalb", "Fulton"]);

    let fulton = rows.iter().find(|r| r.county == "Fulton").unwrap();
    assert_eq!(fulton.total_cost_burden_pct, Some(17.5));
    assert_eq!(fulton.ccrpi_score_mean, Some(75.0));
    assert_eq!(fulton.pct_inclusive_80_plus, Some(60.0));

    // Cobb has schools but no special-education rows
    let cobb = rows.iter().find(|r| r.county == "Cobb").unwrap();
    assert_eq!(cobb.school_count, Some(1));
    assert_eq!(cobb.total_swd, None);
    assert_eq!(joined.uncovered, vec!["Cobb".to_string()]);

    let report = highlights(&rows);
    assert_eq!(report.most_affordable.unwrap().county, "Cobb");
    assert_eq!(report.most_inclusive.unwrap().county, "Dekalb");
}

#[test]
fn test_gold_round_trips_through_parquet() {
    let housing = clean(Dataset::HousingAffordability, HOUSING).unwrap();
    let special = clean(Dataset::SpecialEducation, SPECIAL).unwrap();
    let schools = clean(Dataset::SchoolPerformance, SCHOOLS_XLSX).unwrap();

    let joined = join_silver(housing.batch(), schools.batch(), special.batch(), false).unwrap();
    let encoded = encode_table(&joined.table, &ParquetOptions::default()).unwrap();
    let decoded = decode_parquet(Bytes::from(encoded.bytes), "gold").unwrap();
    assert_eq!(decoded.num_rows(), 3);
    assert_eq!(decoded.num_columns(), 17);
}
