use crate::error::{Result, VarianceAnalyticsError};
use crate::schema::EnrichedFact;
use chrono::NaiveDate;

pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Compact currency label: `$1.2M`, `$3.4K`, `$512`.
pub fn format_currency(value: f64) -> String {
    if value.abs() >= 1e6 {
        format!("${:.1}M", value / 1e6)
    } else if value.abs() >= 1e3 {
        format!("${:.1}K", value / 1e3)
    } else {
        format!("${:.0}", value)
    }
}

pub fn format_signed_percent(percent: f64) -> String {
    format!("{:+.1}%", percent)
}

/// Month tags must be zero-padded `YYYY-MM` so that lexical order is
/// chronological order.
pub fn validate_month_tag(month_tag: &str) -> Result<()> {
    let well_formed = month_tag.len() == 7
        && month_tag.as_bytes()[4] == b'-'
        && NaiveDate::parse_from_str(&format!("{}-01", month_tag), "%Y-%m-%d").is_ok();

    if !well_formed {
        return Err(VarianceAnalyticsError::InvalidMonthTag(
            month_tag.to_string(),
        ));
    }
    Ok(())
}

/// An empty table accepts any month (the view is simply empty); otherwise
/// the month must be present.
pub fn ensure_month_known(rows: &[EnrichedFact], month_tag: &str) -> Result<()> {
    if rows.is_empty() || rows.iter().any(|r| r.month_tag == month_tag) {
        return Ok(());
    }
    Err(VarianceAnalyticsError::UnknownMonth(month_tag.to_string()))
}

pub fn validate_top_n(n: usize) -> Result<()> {
    if n == 0 {
        return Err(VarianceAnalyticsError::InvalidTopN(n));
    }
    Ok(())
}

pub fn validate_threshold(threshold_pct: f64) -> Result<()> {
    if !threshold_pct.is_finite() || threshold_pct < 0.0 {
        return Err(VarianceAnalyticsError::InvalidThreshold(threshold_pct));
    }
    Ok(())
}

/// Distinct month tags, ascending.
pub fn distinct_months(rows: &[EnrichedFact]) -> Vec<String> {
    let mut months: Vec<String> = rows.iter().map(|r| r.month_tag.clone()).collect();
    months.sort();
    months.dedup();
    months
}
