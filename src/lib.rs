//! # Financial Variance Analytics
//!
//! A library for month-over-month variance analysis over a small
//! multi-dimensional ledger dataset (month, market, ledger account) with
//! actual, plan and forecast measures.
//!
//! ## Core Concepts
//!
//! - **Facts**: One row per (month, market, ledger) with actual/plan/forecast values
//! - **Ledger Mapping**: Optional bucket/driver/controllable enrichment per ledger, left-joined
//! - **Variance**: `actual - baseline`, with the percentage taken against `|baseline|`
//!   and a zero baseline reading as 0%
//! - **Views**: Scorecards, MoM deltas, top movers, Pareto ranking, trends and an action plan,
//!   each a pure function of a fact snapshot
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_variance_analytics::*;
//!
//! let mut store = RecordStore::new();
//! load_demo_data(&mut store, 42)?;
//!
//! let config = AnalyticsConfig::default();
//! let analyzer = VarianceAnalyzer::new(&store, &config);
//!
//! let plan = analyzer.action_plan("2024-12", None)?;
//! println!("{}", plan.to_markdown());
//! ```

pub mod action_plan;
pub mod aggregation;
pub mod classification;
pub mod config;
pub mod demo;
pub mod error;
pub mod ingestion;
pub mod ranking;
pub mod schema;
pub mod store;
pub mod summary;
pub mod utils;
pub mod variance;
pub mod views;

pub use action_plan::{action_plan, ActionItem, ActionPlan, PriorityCounts};
pub use aggregation::{aggregate, AggregateRow, MeasureTotals};
pub use classification::{classify, suggest_action, Priority, Status};
pub use config::AnalyticsConfig;
pub use demo::{generate_demo_dataset, load_demo_data, DemoDataset};
pub use error::{Result, VarianceAnalyticsError};
pub use ingestion::*;
pub use ranking::{cumulative_share, rank_by_magnitude, CumulativeEntry, RankMode};
pub use schema::*;
pub use store::{enrich_facts, RecordStore};
pub use summary::{latest_summary, period_summary, PeriodSummary};
pub use utils::{format_currency, format_signed_percent};
pub use variance::{variance, Variance};
pub use views::*;

use log::info;

/// Runs the views against the current contents of a [`RecordStore`],
/// applying the limits and defaults from an [`AnalyticsConfig`].
///
/// Each call takes its own snapshot of the store, so results never reflect
/// a partially replaced month.
pub struct VarianceAnalyzer<'a> {
    store: &'a RecordStore,
    config: &'a AnalyticsConfig,
}

impl<'a> VarianceAnalyzer<'a> {
    pub fn new(store: &'a RecordStore, config: &'a AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub fn scorecard(&self, month_tag: &str) -> Result<Vec<ScorecardRow>> {
        scorecard(&self.store.all_facts(), month_tag)
    }

    pub fn month_over_month(
        &self,
        current_month: &str,
        previous_month: &str,
        market: Option<&str>,
    ) -> Result<Vec<MomDeltaRow>> {
        month_over_month_delta(&self.store.all_facts(), current_month, previous_month, market)
    }

    pub fn top_movers(
        &self,
        current_month: &str,
        previous_month: &str,
        n: Option<usize>,
    ) -> Result<TopMovers> {
        let n = n.unwrap_or(self.config.top_movers);
        top_movers(&self.store.all_facts(), current_month, previous_month, n)
    }

    pub fn pareto(&self, month_tag: &str, baseline: Baseline) -> Result<ParetoAnalysis> {
        pareto_with_limit(
            &self.store.all_facts(),
            month_tag,
            baseline,
            self.config.pareto_display_limit,
        )
    }

    pub fn variance_by_group(
        &self,
        month_tag: &str,
        group_by: Option<GroupColumn>,
    ) -> Result<GroupVariance> {
        variance_by_group(&self.store.all_facts(), month_tag, group_by)
    }

    pub fn trend_series(&self, market: Option<&str>, metric: Measure) -> TrendSeries {
        trend_series_with_limit(
            &self.store.all_facts(),
            market,
            metric,
            self.config.trend_series_limit,
        )
    }

    pub fn totals_trend(&self) -> Vec<TotalsTrendRow> {
        totals_trend(&self.store.all_facts())
    }

    /// Uses the configured default threshold when `threshold_pct` is `None`.
    pub fn action_plan(&self, month_tag: &str, threshold_pct: Option<f64>) -> Result<ActionPlan> {
        let threshold = threshold_pct.unwrap_or(self.config.action_threshold_pct);
        let plan = action_plan::action_plan_with_limit(
            &self.store.all_facts(),
            month_tag,
            threshold,
            self.config.action_plan_limit,
        )?;

        info!(
            "Action plan for {}: {} items above {}%",
            month_tag,
            plan.items.len(),
            threshold
        );
        Ok(plan)
    }

    pub fn latest_summary(&self) -> Result<Option<PeriodSummary>> {
        latest_summary(&self.store.all_facts())
    }
}
