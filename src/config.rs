use crate::action_plan::ACTION_PLAN_LIMIT;
use crate::error::{Result, VarianceAnalyticsError};
use crate::views::{PARETO_DISPLAY_LIMIT, TREND_SERIES_LIMIT};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Defaults and display limits applied by [`crate::VarianceAnalyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalyticsConfig {
    #[schemars(
        description = "Variance percentage an action-plan row must strictly exceed when no threshold is given. Default 5.0."
    )]
    pub action_threshold_pct: f64,

    #[schemars(description = "Number of gainers and decliners in the top-movers view. Default 10.")]
    pub top_movers: usize,

    #[schemars(
        description = "Rows shown in the Pareto view. Cumulative shares always cover every contributor. Default 20."
    )]
    pub pareto_display_limit: usize,

    #[schemars(
        description = "Ledger series kept in trend charts when no bucket mapping exists. Default 8."
    )]
    pub trend_series_limit: usize,

    #[schemars(description = "Maximum rows in the action plan. Default 20.")]
    pub action_plan_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            action_threshold_pct: 5.0,
            top_movers: 10,
            pareto_display_limit: PARETO_DISPLAY_LIMIT,
            trend_series_limit: TREND_SERIES_LIMIT,
            action_plan_limit: ACTION_PLAN_LIMIT,
        }
    }
}

impl AnalyticsConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.action_threshold_pct.is_finite() || self.action_threshold_pct < 0.0 {
            return Err(VarianceAnalyticsError::InvalidConfig(format!(
                "action_threshold_pct must be a finite, non-negative percentage, got {}",
                self.action_threshold_pct
            )));
        }

        let limits = [
            ("top_movers", self.top_movers),
            ("pareto_display_limit", self.pareto_display_limit),
            ("trend_series_limit", self.trend_series_limit),
            ("action_plan_limit", self.action_plan_limit),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(VarianceAnalyticsError::InvalidConfig(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }

        Ok(())
    }

    pub fn json_schema() -> serde_json::Result<String> {
        let schema = schemars::schema_for!(AnalyticsConfig);
        serde_json::to_string_pretty(&schema)
    }
}
