use crate::aggregation::filter_rows;
use crate::error::Result;
use crate::schema::EnrichedFact;
use crate::utils::{distinct_months, ensure_month_known};
use crate::variance::{serialize_percent, variance};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Headline numbers for one month across all markets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub month_tag: String,
    pub net_actual: f64,
    pub net_plan: f64,
    pub variance: f64,
    #[serde(serialize_with = "serialize_percent")]
    pub variance_pct: f64,
    pub market_count: usize,
}

pub fn period_summary(facts: &[EnrichedFact], month_tag: &str) -> Result<PeriodSummary> {
    ensure_month_known(facts, month_tag)?;

    let month_rows = filter_rows(facts, Some(month_tag), None);
    let net_actual: f64 = month_rows.iter().map(|r| r.actual).sum();
    let net_plan: f64 = month_rows.iter().map(|r| r.plan).sum();
    let markets: BTreeSet<&str> = month_rows.iter().map(|r| r.market.as_str()).collect();
    let v = variance(net_actual, net_plan);

    Ok(PeriodSummary {
        month_tag: month_tag.to_string(),
        net_actual,
        net_plan,
        variance: v.delta,
        variance_pct: v.percent,
        market_count: markets.len(),
    })
}

/// Summary of the most recent month, or `None` when there are no facts.
pub fn latest_summary(facts: &[EnrichedFact]) -> Result<Option<PeriodSummary>> {
    match distinct_months(facts).last() {
        Some(month) => period_summary(facts, month).map(Some),
        None => Ok(None),
    }
}
