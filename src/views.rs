//! Pure view builders over an enriched fact snapshot.
//!
//! Every builder takes the fact table by reference, never mutates it, and
//! returns a freshly computed result. Filters that match nothing yield an
//! empty result rather than an error.

use crate::aggregation::{aggregate, filter_rows, sum_by_key, ALL_MEASURES};
use crate::error::Result;
use crate::ranking::{cumulative_share, rank_by_magnitude, RankMode};
use crate::schema::{Baseline, Dimension, EnrichedFact, GroupColumn, Measure};
use crate::utils::{ensure_month_known, validate_top_n};
use crate::variance::{serialize_percent, variance};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const PARETO_DISPLAY_LIMIT: usize = 20;
pub const TREND_SERIES_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardRow {
    pub market: String,
    pub actual: f64,
    pub plan: f64,
    pub forecast: f64,
    #[serde(serialize_with = "serialize_percent")]
    pub vs_plan: f64,
    #[serde(serialize_with = "serialize_percent")]
    pub vs_forecast: f64,
}

/// Per-market totals for one month, smallest actual first.
pub fn scorecard(facts: &[EnrichedFact], month_tag: &str) -> Result<Vec<ScorecardRow>> {
    ensure_month_known(facts, month_tag)?;

    let month_rows = filter_rows(facts, Some(month_tag), None);
    let mut rows: Vec<ScorecardRow> = aggregate(&month_rows, &[Dimension::Market], &ALL_MEASURES)
        .into_iter()
        .map(|group| {
            let totals = group.totals;
            ScorecardRow {
                market: group.key_part(0).to_string(),
                actual: totals.actual,
                plan: totals.plan,
                forecast: totals.forecast,
                vs_plan: variance(totals.actual, totals.plan).percent,
                vs_forecast: variance(totals.actual, totals.forecast).percent,
            }
        })
        .collect();

    rows.sort_by(|a, b| a.actual.total_cmp(&b.actual));

    debug!(
        "Scorecard for {}: {} facts -> {} markets",
        month_tag,
        month_rows.len(),
        rows.len()
    );
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomDeltaRow {
    pub ledger: String,
    pub actual_current: f64,
    pub actual_previous: f64,
    pub change: f64,
    #[serde(serialize_with = "serialize_percent")]
    pub pct_change: f64,
}

/// Sums actual per key in each month and inner-joins the two months. Keys
/// present in only one month are dropped. Output follows current-month
/// first-appearance order.
fn join_months(
    facts: &[EnrichedFact],
    current_month: &str,
    previous_month: &str,
    market: Option<&str>,
    group_by: &[Dimension],
) -> Vec<(Vec<String>, f64, f64)> {
    let current_rows = filter_rows(facts, Some(current_month), market);
    let previous_rows = filter_rows(facts, Some(previous_month), market);

    let previous_totals: HashMap<Vec<String>, f64> =
        sum_by_key(&previous_rows, group_by, Measure::Actual)
            .into_iter()
            .collect();

    sum_by_key(&current_rows, group_by, Measure::Actual)
        .into_iter()
        .filter_map(|(key, current)| {
            let previous = *previous_totals.get(&key)?;
            Some((key, current, previous))
        })
        .collect()
}

/// Ledger-level change in actual between two months, most negative first.
pub fn month_over_month_delta(
    facts: &[EnrichedFact],
    current_month: &str,
    previous_month: &str,
    market: Option<&str>,
) -> Result<Vec<MomDeltaRow>> {
    ensure_month_known(facts, current_month)?;
    ensure_month_known(facts, previous_month)?;

    let mut rows: Vec<MomDeltaRow> =
        join_months(facts, current_month, previous_month, market, &[Dimension::Ledger])
            .into_iter()
            .map(|(key, current, previous)| {
                let v = variance(current, previous);
                MomDeltaRow {
                    ledger: key.into_iter().next().unwrap_or_default(),
                    actual_current: current,
                    actual_previous: previous,
                    change: v.delta,
                    pct_change: v.percent,
                }
            })
            .collect();

    rows.sort_by(|a, b| a.change.total_cmp(&b.change));

    debug!(
        "MoM delta {} -> {} ({}): {} ledgers",
        previous_month,
        current_month,
        market.unwrap_or("all markets"),
        rows.len()
    );
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopMoverRow {
    pub key: String,
    pub market: String,
    pub ledger: String,
    pub actual_current: f64,
    pub actual_previous: f64,
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopMovers {
    /// Largest increases first.
    pub gainers: Vec<TopMoverRow>,
    /// Largest decreases (most negative) first.
    pub decliners: Vec<TopMoverRow>,
}

pub fn composite_key(market: &str, ledger: &str) -> String {
    format!("{} | {}", market, ledger)
}

pub fn top_movers(
    facts: &[EnrichedFact],
    current_month: &str,
    previous_month: &str,
    n: usize,
) -> Result<TopMovers> {
    validate_top_n(n)?;
    ensure_month_known(facts, current_month)?;
    ensure_month_known(facts, previous_month)?;

    let movers: Vec<TopMoverRow> = join_months(
        facts,
        current_month,
        previous_month,
        None,
        &[Dimension::Market, Dimension::Ledger],
    )
    .into_iter()
    .map(|(key, current, previous)| {
        let market = key.first().cloned().unwrap_or_default();
        let ledger = key.get(1).cloned().unwrap_or_default();
        TopMoverRow {
            key: composite_key(&market, &ledger),
            market,
            ledger,
            actual_current: current,
            actual_previous: previous,
            change: current - previous,
        }
    })
    .collect();

    let gainers = rank_by_magnitude(&movers, |r| r.change, Some(n), RankMode::TopPositive);
    let decliners = rank_by_magnitude(&movers, |r| r.change, Some(n), RankMode::TopNegative);

    debug!(
        "Top movers {} -> {}: {} joined keys, n = {}",
        previous_month,
        current_month,
        movers.len(),
        n
    );
    Ok(TopMovers { gainers, decliners })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoRow {
    pub key: String,
    pub market: String,
    pub ledger: String,
    pub actual: f64,
    pub baseline: f64,
    pub variance: f64,
    pub abs_variance: f64,
    pub cumulative: f64,
    pub cumulative_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoAnalysis {
    pub month_tag: String,
    pub baseline: Baseline,
    /// Sum of absolute variance over every contributor in the month, not
    /// just the displayed rows.
    pub total_abs_variance: f64,
    /// Number of contributors before truncation.
    pub contributor_count: usize,
    pub rows: Vec<ParetoRow>,
}

impl ParetoAnalysis {
    /// The leading rows up to and including the first one whose cumulative
    /// share reaches `cutoff_pct`.
    pub fn vital_few(&self, cutoff_pct: f64) -> &[ParetoRow] {
        let end = self
            .rows
            .iter()
            .position(|r| r.cumulative_pct >= cutoff_pct)
            .map(|idx| idx + 1)
            .unwrap_or(self.rows.len());
        &self.rows[..end]
    }
}

pub fn pareto(facts: &[EnrichedFact], month_tag: &str, baseline: Baseline) -> Result<ParetoAnalysis> {
    pareto_with_limit(facts, month_tag, baseline, PARETO_DISPLAY_LIMIT)
}

/// Ranks every (market, ledger) variance of the month by magnitude and
/// computes the cumulative share over the whole ranked set, then keeps the
/// first `limit` rows.
pub fn pareto_with_limit(
    facts: &[EnrichedFact],
    month_tag: &str,
    baseline: Baseline,
    limit: usize,
) -> Result<ParetoAnalysis> {
    ensure_month_known(facts, month_tag)?;

    let month_rows = filter_rows(facts, Some(month_tag), None);
    let baseline_measure = baseline.measure();

    let contributors: Vec<ParetoRow> =
        aggregate(&month_rows, &[Dimension::Market, Dimension::Ledger], &ALL_MEASURES)
            .into_iter()
            .map(|group| {
                let actual = group.totals.actual;
                let baseline_value = group.totals.get(baseline_measure);
                let delta = variance(actual, baseline_value).delta;
                ParetoRow {
                    key: composite_key(group.key_part(0), group.key_part(1)),
                    market: group.key_part(0).to_string(),
                    ledger: group.key_part(1).to_string(),
                    actual,
                    baseline: baseline_value,
                    variance: delta,
                    abs_variance: delta.abs(),
                    cumulative: 0.0,
                    cumulative_pct: 0.0,
                }
            })
            .collect();

    let contributor_count = contributors.len();
    let ranked = rank_by_magnitude(&contributors, |r| r.variance, None, RankMode::TopAbsolute);
    let shares = cumulative_share(ranked, |r| r.variance);
    let total_abs_variance = shares.last().map(|s| s.cumulative).unwrap_or(0.0);

    let rows: Vec<ParetoRow> = shares
        .into_iter()
        .take(limit)
        .map(|entry| ParetoRow {
            cumulative: entry.cumulative,
            cumulative_pct: entry.cumulative_pct,
            ..entry.item
        })
        .collect();

    debug!(
        "Pareto for {} vs {:?}: {} contributors, showing {}",
        month_tag,
        baseline,
        contributor_count,
        rows.len()
    );

    Ok(ParetoAnalysis {
        month_tag: month_tag.to_string(),
        baseline,
        total_abs_variance,
        contributor_count,
        rows,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupVarianceRow {
    pub group: String,
    pub actual: f64,
    pub plan: f64,
    pub forecast: f64,
    pub var_plan: f64,
    pub var_forecast: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupVariance {
    pub group_by: GroupColumn,
    pub rows: Vec<GroupVarianceRow>,
}

/// Actual vs plan vs forecast per bucket or market for one month. Without an
/// explicit `group_by`, buckets are used when any row of the month carries
/// bucket data, markets otherwise. Unmapped ledgers form their own group.
pub fn variance_by_group(
    facts: &[EnrichedFact],
    month_tag: &str,
    group_by: Option<GroupColumn>,
) -> Result<GroupVariance> {
    ensure_month_known(facts, month_tag)?;

    let month_rows = filter_rows(facts, Some(month_tag), None);
    let group_by = group_by.unwrap_or_else(|| {
        if month_rows.iter().any(|r| r.bucket.is_some()) {
            GroupColumn::Bucket
        } else {
            GroupColumn::Market
        }
    });

    let mut rows: Vec<GroupVarianceRow> =
        aggregate(&month_rows, &[group_by.dimension()], &ALL_MEASURES)
            .into_iter()
            .map(|group| {
                let totals = group.totals;
                GroupVarianceRow {
                    group: group.key_part(0).to_string(),
                    actual: totals.actual,
                    plan: totals.plan,
                    forecast: totals.forecast,
                    var_plan: variance(totals.actual, totals.plan).delta,
                    var_forecast: variance(totals.actual, totals.forecast).delta,
                }
            })
            .collect();

    rows.sort_by(|a, b| a.actual.total_cmp(&b.actual));

    debug!(
        "Variance by {:?} for {}: {} groups",
        group_by,
        month_tag,
        rows.len()
    );
    Ok(GroupVariance { group_by, rows })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub month_tag: String,
    pub series: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    /// Either [`Dimension::Bucket`] or [`Dimension::Ledger`].
    pub series_by: Dimension,
    pub metric: Measure,
    /// Sorted by month, then series name.
    pub points: Vec<TrendPoint>,
}

pub fn trend_series(facts: &[EnrichedFact], market: Option<&str>, metric: Measure) -> TrendSeries {
    trend_series_with_limit(facts, market, metric, TREND_SERIES_LIMIT)
}

/// Monthly `metric` per bucket when bucket data exists, otherwise per ledger
/// restricted to the `ledger_limit` ledgers with the largest total magnitude
/// across all months.
pub fn trend_series_with_limit(
    facts: &[EnrichedFact],
    market: Option<&str>,
    metric: Measure,
    ledger_limit: usize,
) -> TrendSeries {
    let rows = filter_rows(facts, None, market);
    let has_buckets = rows.iter().any(|r| r.bucket.is_some());

    let series_by = if has_buckets {
        Dimension::Bucket
    } else {
        Dimension::Ledger
    };

    let mut groups = aggregate(&rows, &[Dimension::Month, series_by], &[metric]);

    if !has_buckets {
        let ledger_totals = aggregate(&rows, &[Dimension::Ledger], &[metric]);
        let keep: HashSet<String> = rank_by_magnitude(
            &ledger_totals,
            |g| g.totals.get(metric),
            Some(ledger_limit),
            RankMode::TopAbsolute,
        )
        .into_iter()
        .map(|g| g.key_part(0).to_string())
        .collect();

        groups.retain(|g| keep.contains(g.key_part(1)));
    }

    let mut points: Vec<TrendPoint> = groups
        .into_iter()
        .map(|group| TrendPoint {
            month_tag: group.key_part(0).to_string(),
            series: group.key_part(1).to_string(),
            value: group.totals.get(metric),
        })
        .collect();

    points.sort_by(|a, b| {
        a.month_tag
            .cmp(&b.month_tag)
            .then_with(|| a.series.cmp(&b.series))
    });

    debug!(
        "Trend of {} by {:?} ({}): {} points",
        metric.as_str(),
        series_by,
        market.unwrap_or("all markets"),
        points.len()
    );

    TrendSeries {
        series_by,
        metric,
        points,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsTrendRow {
    pub month_tag: String,
    pub actual: f64,
    pub plan: f64,
    pub forecast: f64,
}

/// Portfolio totals per month, oldest first.
pub fn totals_trend(facts: &[EnrichedFact]) -> Vec<TotalsTrendRow> {
    let mut rows: Vec<TotalsTrendRow> = aggregate(facts, &[Dimension::Month], &ALL_MEASURES)
        .into_iter()
        .map(|group| TotalsTrendRow {
            month_tag: group.key_part(0).to_string(),
            actual: group.totals.actual,
            plan: group.totals.plan,
            forecast: group.totals.forecast,
        })
        .collect();

    rows.sort_by(|a, b| a.month_tag.cmp(&b.month_tag));
    rows
}
