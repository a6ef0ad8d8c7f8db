// Text report for the `view` subcommand

use anyhow::Result;
use arrow::array::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use countylake_core::gold::{gold_rows_from_batch, highlights, Highlight};
use std::fmt::Write;

fn highlight_line(out: &mut String, label: &str, highlight: &Option<Highlight>) -> Result<()> {
    match highlight {
        Some(h) => writeln!(out, "  {:<16} {} ({:.2})", label, h.county, h.value)?,
        None => writeln!(out, "  {:<16} n/a", label)?,
    }
    Ok(())
}

/// Schema, the first `limit` rows, and the highlight rankings
pub fn render(batch: &RecordBatch, limit: usize) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "Schema:")?;
    for field in batch.schema().fields() {
        writeln!(out, "  {}: {}", field.name(), field.data_type())?;
    }

    let shown = limit.min(batch.num_rows());
    writeln!(out, "\nFirst {} of {} rows:", shown, batch.num_rows())?;
    writeln!(out, "{}", pretty_format_batches(&[batch.slice(0, shown)])?)?;

    let report = highlights(&gold_rows_from_batch(batch)?);
    writeln!(out, "\nHighlights:")?;
    highlight_line(&mut out, "Most affordable", &report.most_affordable)?;
    highlight_line(&mut out, "Best schools", &report.best_schools)?;
    highlight_line(&mut out, "Most inclusive", &report.most_inclusive)?;
    match &report.best_overall {
        Some(best) => write!(
            out,
            "  {:<16} {} (rank sum {}: affordability {}, CCRPI {}, inclusion {})",
            "Best overall",
            best.county,
            best.rank_sum,
            best.affordability_rank,
            best.ccrpi_rank,
            best.inclusion_rank
        )?,
        None => write!(out, "  {:<16} n/a", "Best overall")?,
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use countylake_core::gold::{gold_records_to_batch, GoldRecord};
    use countylake_core::clean::HousingRecord;

    fn housing(county: &str, pct: Option<f64>) -> HousingRecord {
        HousingRecord {
            geo_id: None,
            county_name: Some(format!("{} County, Georgia", county)),
            county: county.to_string(),
            occupied_housing_units: Some(100),
            cost_burden: [None; 5],
            total_cost_burden_pct: pct,
        }
    }

    #[test]
    fn test_render_limits_rows_and_lists_highlights() {
        let records = vec![
            GoldRecord {
                housing: housing("Cobb", Some(12.0)),
                school: None,
                special_education: None,
            },
            GoldRecord {
                housing: housing("Fulton", Some(20.0)),
                school: None,
                special_education: None,
            },
        ];
        let batch = gold_records_to_batch(&records).unwrap();

        let report = render(&batch, 1).unwrap();
        assert!(report.contains("county: Utf8"));
        assert!(report.contains("First 1 of 2 rows"));
        assert!(report.contains("Most affordable  Cobb (12.00)"));
        assert!(report.contains("Best schools     n/a"));
        assert!(!report.contains("| Fulton"));
    }
}
