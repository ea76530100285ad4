use crate::aggregation::filter_rows;
use crate::classification::{classify, suggest_action, Priority, Status};
use crate::error::{Result, VarianceAnalyticsError};
use crate::schema::EnrichedFact;
use crate::utils::{ensure_month_known, format_currency, format_signed_percent, validate_threshold};
use crate::variance::{serialize_percent, variance};
use log::debug;
use serde::{Deserialize, Serialize};

pub const ACTION_PLAN_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub market: String,
    pub ledger: String,
    pub actual: f64,
    pub plan: f64,
    pub variance: f64,
    #[serde(serialize_with = "serialize_percent")]
    pub variance_pct: f64,
    pub status: Status,
    pub priority: Priority,
    pub suggested_action: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub month_tag: String,
    pub threshold_pct: f64,
    /// Most unfavorable variance first.
    pub items: Vec<ActionItem>,
}

impl ActionPlan {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn priority_counts(&self) -> PriorityCounts {
        let mut counts = PriorityCounts::default();
        for item in &self.items {
            match item.priority {
                Priority::High => counts.high += 1,
                Priority::Medium => counts.medium += 1,
                Priority::Low => counts.low += 1,
            }
        }
        counts
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.items.is_empty() {
            writer.write_record([
                "market",
                "ledger",
                "actual",
                "plan",
                "variance",
                "variance_pct",
                "status",
                "priority",
                "suggested_action",
            ])?;
        }
        for item in &self.items {
            writer.serialize(item)?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        String::from_utf8(bytes).map_err(|e| {
            VarianceAnalyticsError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e,
            ))
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Action Plan - {}\n\n", self.month_tag));

        if self.items.is_empty() {
            output.push_str(&format!(
                "No items exceed the {}% variance threshold.\n",
                self.threshold_pct
            ));
            return output;
        }

        let counts = self.priority_counts();
        output.push_str(&format!(
            "**Items exceeding {}% variance:** {} (High: {}, Medium: {}, Low: {})\n\n",
            self.threshold_pct,
            self.items.len(),
            counts.high,
            counts.medium,
            counts.low
        ));

        output.push_str("| Market | Ledger | Actual | Plan | Variance | Var % | Status | Priority | Action |\n");
        output.push_str("|---|---|---|---|---|---|---|---|---|\n");
        for item in &self.items {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                item.market,
                item.ledger,
                format_currency(item.actual),
                format_currency(item.plan),
                format_currency(item.variance),
                format_signed_percent(item.variance_pct),
                item.status,
                item.priority,
                item.suggested_action
            ));
        }

        output
    }
}

pub fn action_plan(facts: &[EnrichedFact], month_tag: &str, threshold_pct: f64) -> Result<ActionPlan> {
    action_plan_with_limit(facts, month_tag, threshold_pct, ACTION_PLAN_LIMIT)
}

/// Rows of the month whose actual-vs-plan percentage exceeds the threshold
/// (strictly), classified and ordered by ascending variance, first `limit`.
pub fn action_plan_with_limit(
    facts: &[EnrichedFact],
    month_tag: &str,
    threshold_pct: f64,
    limit: usize,
) -> Result<ActionPlan> {
    validate_threshold(threshold_pct)?;
    ensure_month_known(facts, month_tag)?;

    let month_rows = filter_rows(facts, Some(month_tag), None);

    let mut items: Vec<ActionItem> = month_rows
        .iter()
        .filter_map(|row| {
            let v = variance(row.actual, row.plan);
            if v.percent.abs() <= threshold_pct {
                return None;
            }

            let (status, priority) = classify(v.delta, v.percent);
            Some(ActionItem {
                market: row.market.clone(),
                ledger: row.ledger.clone(),
                actual: row.actual,
                plan: row.plan,
                variance: v.delta,
                variance_pct: v.percent,
                status,
                priority,
                suggested_action: suggest_action(&row.market, &row.ledger, v.delta),
            })
        })
        .collect();

    let flagged = items.len();
    items.sort_by(|a, b| a.variance.total_cmp(&b.variance));
    items.truncate(limit);

    debug!(
        "Action plan for {} at {}%: {} of {} rows flagged, keeping {}",
        month_tag,
        threshold_pct,
        flagged,
        month_rows.len(),
        items.len()
    );

    Ok(ActionPlan {
        month_tag: month_tag.to_string(),
        threshold_pct,
        items,
    })
}
