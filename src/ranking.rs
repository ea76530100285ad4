use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMode {
    /// Largest signed value first.
    TopPositive,
    /// Most negative value first.
    TopNegative,
    /// Largest magnitude first.
    TopAbsolute,
}

/// Orders rows by `value` according to `mode` and keeps the first `limit`
/// (all rows when `None`). The sort is stable: ties keep input order.
pub fn rank_by_magnitude<T, F>(rows: &[T], value: F, limit: Option<usize>, mode: RankMode) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    let mut ranked: Vec<T> = rows.to_vec();

    match mode {
        RankMode::TopPositive => ranked.sort_by(|a, b| value(b).total_cmp(&value(a))),
        RankMode::TopNegative => ranked.sort_by(|a, b| value(a).total_cmp(&value(b))),
        RankMode::TopAbsolute => ranked.sort_by(|a, b| value(b).abs().total_cmp(&value(a).abs())),
    }

    if let Some(limit) = limit {
        ranked.truncate(limit);
    }

    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeEntry<T> {
    pub item: T,
    pub cumulative: f64,
    pub cumulative_pct: f64,
}

/// Running total of `abs(value)` and its share of the grand total, in
/// percent. Rows are expected to arrive sorted by descending magnitude.
///
/// The series is non-decreasing and ends at exactly 100 for a non-zero
/// total. A zero total gives 0 for every row.
pub fn cumulative_share<T, F>(rows: Vec<T>, value: F) -> Vec<CumulativeEntry<T>>
where
    F: Fn(&T) -> f64,
{
    let mut running = 0.0;
    let running_sums: Vec<f64> = rows
        .iter()
        .map(|row| {
            running += value(row).abs();
            running
        })
        .collect();

    // The grand total is the last running sum so the final share is exactly 100.
    let total = running_sums.last().copied().unwrap_or(0.0);

    rows.into_iter()
        .zip(running_sums)
        .map(|(item, cumulative)| CumulativeEntry {
            item,
            cumulative,
            cumulative_pct: if total == 0.0 {
                0.0
            } else {
                cumulative / total * 100.0
            },
        })
        .collect()
}
