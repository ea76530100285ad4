use crate::schema::{Dimension, EnrichedFact, Measure};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureTotals {
    pub actual: f64,
    pub plan: f64,
    pub forecast: f64,
}

impl MeasureTotals {
    pub fn get(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Actual => self.actual,
            Measure::Plan => self.plan,
            Measure::Forecast => self.forecast,
        }
    }

    fn add(&mut self, row: &EnrichedFact, measures: &[Measure]) {
        for measure in measures {
            match measure {
                Measure::Actual => self.actual += row.actual,
                Measure::Plan => self.plan += row.plan,
                Measure::Forecast => self.forecast += row.forecast,
            }
        }
    }
}

/// One output group: the values of the group-by dimensions (in the order
/// they were requested) and the summed measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub key: Vec<String>,
    pub totals: MeasureTotals,
}

impl AggregateRow {
    pub fn key_part(&self, idx: usize) -> &str {
        self.key.get(idx).map(String::as_str).unwrap_or_default()
    }
}

pub const ALL_MEASURES: [Measure; 3] = [Measure::Actual, Measure::Plan, Measure::Forecast];

/// Groups rows by the exact combination of `group_by` values and sums the
/// requested measures. Measures not requested stay at 0.
///
/// Groups are emitted in order of first appearance and sums accumulate in
/// input row order, so identical inputs always produce identical output.
/// Empty groups never appear.
pub fn aggregate(
    rows: &[EnrichedFact],
    group_by: &[Dimension],
    measures: &[Measure],
) -> Vec<AggregateRow> {
    let mut index: HashMap<Vec<&str>, usize> = HashMap::new();
    let mut groups: Vec<AggregateRow> = Vec::new();

    for row in rows {
        let key: Vec<&str> = group_by.iter().map(|d| d.value_of(row)).collect();

        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                groups.push(AggregateRow {
                    key: key.iter().map(|k| k.to_string()).collect(),
                    totals: MeasureTotals::default(),
                });
                index.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };

        groups[slot].totals.add(row, measures);
    }

    groups
}

pub fn filter_rows(
    rows: &[EnrichedFact],
    month_tag: Option<&str>,
    market: Option<&str>,
) -> Vec<EnrichedFact> {
    rows.iter()
        .filter(|r| month_tag.map_or(true, |m| r.month_tag == m))
        .filter(|r| market.map_or(true, |m| r.market == m))
        .cloned()
        .collect()
}

/// Sums a single measure per group as (key, total) pairs in first-appearance
/// order. Used for the month-to-month inner joins.
pub fn sum_by_key(
    rows: &[EnrichedFact],
    group_by: &[Dimension],
    measure: Measure,
) -> Vec<(Vec<String>, f64)> {
    aggregate(rows, group_by, &[measure])
        .into_iter()
        .map(|g| {
            let value = g.totals.get(measure);
            (g.key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Fact;

    fn row(month: &str, market: &str, ledger: &str, actual: f64, plan: f64) -> EnrichedFact {
        EnrichedFact::from(Fact::new(month, market, ledger, actual, plan, 0.0))
    }

    #[test]
    fn test_aggregate_sums_per_group() {
        let rows = vec![
            row("2024-07", "Europe", "Sales", 100.0, 90.0),
            row("2024-07", "Asia", "Sales", 50.0, 60.0),
            row("2024-07", "Europe", "Rent", -20.0, -25.0),
        ];

        let groups = aggregate(&rows, &[Dimension::Market], &ALL_MEASURES);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, vec!["Europe".to_string()]);
        assert!((groups[0].totals.actual - 80.0).abs() < 1e-9);
        assert!((groups[0].totals.plan - 65.0).abs() < 1e-9);
        assert_eq!(groups[1].key_part(0), "Asia");
    }

    #[test]
    fn test_aggregate_only_sums_requested_measures() {
        let rows = vec![row("2024-07", "Europe", "Sales", 100.0, 90.0)];
        let groups = aggregate(&rows, &[Dimension::Ledger], &[Measure::Actual]);
        assert_eq!(groups[0].totals.actual, 100.0);
        assert_eq!(groups[0].totals.plan, 0.0);
    }

    #[test]
    fn test_aggregate_is_order_insensitive_for_totals() {
        let rows = vec![
            row("2024-07", "Europe", "Sales", 0.1, 0.0),
            row("2024-07", "Europe", "Rent", 0.2, 0.0),
            row("2024-07", "Asia", "Sales", 0.3, 0.0),
            row("2024-07", "Europe", "Fees", 0.7, 0.0),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        let forward = aggregate(&rows, &[Dimension::Market], &ALL_MEASURES);
        let backward = aggregate(&reversed, &[Dimension::Market], &ALL_MEASURES);

        for group in &forward {
            let other = backward.iter().find(|g| g.key == group.key).unwrap();
            assert!((group.totals.actual - other.totals.actual).abs() < 1e-9);
        }
    }

    #[test]
    fn test_aggregate_multi_dimension_and_empty_input() {
        let rows = vec![
            row("2024-07", "Europe", "Sales", 1.0, 0.0),
            row("2024-08", "Europe", "Sales", 2.0, 0.0),
            row("2024-07", "Europe", "Sales", 3.0, 0.0),
        ];
        let groups = aggregate(&rows, &[Dimension::Month, Dimension::Ledger], &ALL_MEASURES);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].totals.actual, 4.0);

        assert!(aggregate(&[], &[Dimension::Market], &ALL_MEASURES).is_empty());
    }

    #[test]
    fn test_filter_rows_by_month_and_market() {
        let rows = vec![
            row("2024-07", "Europe", "Sales", 1.0, 0.0),
            row("2024-08", "Europe", "Sales", 2.0, 0.0),
            row("2024-07", "Asia", "Sales", 3.0, 0.0),
        ];
        assert_eq!(filter_rows(&rows, Some("2024-07"), None).len(), 2);
        assert_eq!(filter_rows(&rows, Some("2024-07"), Some("Asia")).len(), 1);
        assert_eq!(filter_rows(&rows, None, None).len(), 3);
        assert_eq!(filter_rows(&rows, Some("2024-08"), Some("Asia")).len(), 0);
    }
}
