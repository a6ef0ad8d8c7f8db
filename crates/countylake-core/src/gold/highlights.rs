// Gold table highlights for the `view` report

use serde::Serialize;
use std::cmp::Ordering;

use super::join::GoldRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub county: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallRank {
    pub county: String,
    pub rank_sum: usize,
    pub affordability_rank: usize,
    pub ccrpi_rank: usize,
    pub inclusion_rank: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GoldHighlights {
    /// Lowest cost-burden percentage
    pub most_affordable: Option<Highlight>,
    /// Highest mean CCRPI score
    pub best_schools: Option<Highlight>,
    /// Highest share of students with disabilities in regular class 80%+
    pub most_inclusive: Option<Highlight>,
    /// Lowest sum of the three ranks
    pub best_overall: Option<OverallRank>,
}

#[derive(Clone, Copy)]
enum Direction {
    Ascending,
    Descending,
}

fn best_by(rows: &[GoldRow], value: impl Fn(&GoldRow) -> Option<f64>, dir: Direction) -> Option<Highlight> {
    let mut best: Option<Highlight> = None;
    for row in rows {
        let Some(v) = value(row) else {
            continue;
        };
        let better = match (&best, dir) {
            (None, _) => true,
            (Some(b), Direction::Ascending) => v < b.value,
            (Some(b), Direction::Descending) => v > b.value,
        };
        if better {
            best = Some(Highlight {
                county: row.county.clone(),
                value: v,
            });
        }
    }
    best
}

/// SQL `rank()` over one column: ties share a rank, nulls rank last
fn ranks(values: &[Option<f64>], dir: Direction) -> Vec<usize> {
    let ahead = |a: f64, b: f64| match dir {
        Direction::Ascending => a.partial_cmp(&b) == Some(Ordering::Less),
        Direction::Descending => a.partial_cmp(&b) == Some(Ordering::Greater),
    };
    let present = values.iter().filter(|v| v.is_some()).count();
    values
        .iter()
        .map(|value| match value {
            Some(v) => 1 + values.iter().flatten().filter(|other| ahead(**other, *v)).count(),
            None => 1 + present,
        })
        .collect()
}

/// Compute the four highlight rankings over the gold rows
///
/// Ties on the single-column highlights and on the rank sum resolve to the
/// row that comes first, which is county order for gold output.
pub fn highlights(rows: &[GoldRow]) -> GoldHighlights {
    if rows.is_empty() {
        return GoldHighlights::default();
    }

    let affordability: Vec<_> = rows.iter().map(|r| r.total_cost_burden_pct).collect();
    let ccrpi: Vec<_> = rows.iter().map(|r| r.ccrpi_score_mean).collect();
    let inclusion: Vec<_> = rows.iter().map(|r| r.pct_inclusive_80_plus).collect();

    let r_afford = ranks(&affordability, Direction::Ascending);
    let r_ccrpi = ranks(&ccrpi, Direction::Descending);
    let r_incl = ranks(&inclusion, Direction::Descending);

    let best_overall = rows
        .iter()
        .enumerate()
        .map(|(i, row)| OverallRank {
            county: row.county.clone(),
            rank_sum: r_afford[i] + r_ccrpi[i] + r_incl[i],
            affordability_rank: r_afford[i],
            ccrpi_rank: r_ccrpi[i],
            inclusion_rank: r_incl[i],
        })
        .reduce(|best, next| if next.rank_sum < best.rank_sum { next } else { best });

    GoldHighlights {
        most_affordable: best_by(rows, |r| r.total_cost_burden_pct, Direction::Ascending),
        best_schools: best_by(rows, |r| r.ccrpi_score_mean, Direction::Descending),
        most_inclusive: best_by(rows, |r| r.pct_inclusive_80_plus, Direction::Descending),
        best_overall,
    }
}
