use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label used wherever a ledger has no mapping row to supply a bucket or driver.
pub const UNMAPPED_LABEL: &str = "Unmapped";

/// One canonical measurement row, unique per (month_tag, market, ledger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Fact {
    #[schemars(description = "Zero-padded period key in YYYY-MM format (e.g., '2024-07')")]
    pub month_tag: String,

    #[schemars(description = "Market or region name (e.g., 'North America')")]
    pub market: String,

    #[schemars(description = "Ledger account name (e.g., 'Revenue - Product Sales')")]
    pub ledger: String,

    #[schemars(
        description = "Actual amount. Expense and contra accounts are stored as negative values."
    )]
    pub actual: f64,

    #[schemars(description = "Planned (budget) amount, same sign convention as actual")]
    pub plan: f64,

    #[schemars(description = "Forecast amount, same sign convention as actual")]
    pub forecast: f64,
}

impl Fact {
    pub fn new(
        month_tag: impl Into<String>,
        market: impl Into<String>,
        ledger: impl Into<String>,
        actual: f64,
        plan: f64,
        forecast: f64,
    ) -> Self {
        Self {
            month_tag: month_tag.into(),
            market: market.into(),
            ledger: ledger.into(),
            actual,
            plan,
            forecast,
        }
    }
}

/// Enrichment attributes for a single ledger account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LedgerMapping {
    #[schemars(description = "The ledger account name this mapping applies to")]
    pub ledger: String,

    #[schemars(description = "Coarse category such as 'Revenue', 'COGS' or 'SG&A'")]
    pub bucket: Option<String>,

    #[schemars(description = "Cost driver tag such as 'Volume', 'Headcount' or 'Fixed'")]
    pub driver: Option<String>,

    #[serde(default = "default_controllable")]
    #[schemars(
        description = "Whether the business unit can manage this account. Defaults to true."
    )]
    pub controllable: bool,
}

fn default_controllable() -> bool {
    true
}

impl LedgerMapping {
    pub fn new(
        ledger: impl Into<String>,
        bucket: impl Into<String>,
        driver: impl Into<String>,
        controllable: bool,
    ) -> Self {
        Self {
            ledger: ledger.into(),
            bucket: Some(bucket.into()),
            driver: Some(driver.into()),
            controllable,
        }
    }
}

/// Maps external spreadsheet column names onto the five canonical roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnMapping {
    #[schemars(description = "Column containing market/region names")]
    pub market_col: String,

    #[schemars(description = "Column containing ledger account names")]
    pub ledger_col: String,

    #[schemars(description = "Column containing actual values")]
    pub actual_col: String,

    #[schemars(description = "Column containing plan/budget values")]
    pub plan_col: String,

    #[schemars(description = "Column containing forecast values")]
    pub forecast_col: String,
}

impl ColumnMapping {
    pub fn new(
        market_col: impl Into<String>,
        ledger_col: impl Into<String>,
        actual_col: impl Into<String>,
        plan_col: impl Into<String>,
        forecast_col: impl Into<String>,
    ) -> Self {
        Self {
            market_col: market_col.into(),
            ledger_col: ledger_col.into(),
            actual_col: actual_col.into(),
            plan_col: plan_col.into(),
            forecast_col: forecast_col.into(),
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ColumnMapping)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// A fact left-joined with its ledger mapping. Enrichment fields are `None`
/// when the ledger has no mapping row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedFact {
    pub month_tag: String,
    pub market: String,
    pub ledger: String,
    pub actual: f64,
    pub plan: f64,
    pub forecast: f64,
    pub bucket: Option<String>,
    pub driver: Option<String>,
    pub controllable: Option<bool>,
}

impl EnrichedFact {
    pub fn from_fact(fact: &Fact, mapping: Option<&LedgerMapping>) -> Self {
        Self {
            month_tag: fact.month_tag.clone(),
            market: fact.market.clone(),
            ledger: fact.ledger.clone(),
            actual: fact.actual,
            plan: fact.plan,
            forecast: fact.forecast,
            bucket: mapping.and_then(|m| m.bucket.clone()),
            driver: mapping.and_then(|m| m.driver.clone()),
            controllable: mapping.map(|m| m.controllable),
        }
    }

    pub fn measure(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Actual => self.actual,
            Measure::Plan => self.plan,
            Measure::Forecast => self.forecast,
        }
    }
}

impl From<Fact> for EnrichedFact {
    fn from(fact: Fact) -> Self {
        Self::from_fact(&fact, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Actual,
    Plan,
    Forecast,
}

impl Measure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Measure::Actual => "actual",
            Measure::Plan => "plan",
            Measure::Forecast => "forecast",
        }
    }
}

/// The comparison column a variance is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Baseline {
    Plan,
    Forecast,
}

impl Baseline {
    pub fn measure(&self) -> Measure {
        match self {
            Baseline::Plan => Measure::Plan,
            Baseline::Forecast => Measure::Forecast,
        }
    }
}

/// Grouping dimensions available to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Month,
    Market,
    Ledger,
    Bucket,
    Driver,
}

impl Dimension {
    /// Group value for a row. Missing enrichment maps to [`UNMAPPED_LABEL`]
    /// so unmapped ledgers form their own group instead of disappearing.
    pub fn value_of<'a>(&self, row: &'a EnrichedFact) -> &'a str {
        match self {
            Dimension::Month => &row.month_tag,
            Dimension::Market => &row.market,
            Dimension::Ledger => &row.ledger,
            Dimension::Bucket => row.bucket.as_deref().unwrap_or(UNMAPPED_LABEL),
            Dimension::Driver => row.driver.as_deref().unwrap_or(UNMAPPED_LABEL),
        }
    }
}

/// Grouping choices for the variance-by-group view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroupColumn {
    Bucket,
    Market,
}

impl GroupColumn {
    pub fn dimension(&self) -> Dimension {
        match self {
            GroupColumn::Bucket => Dimension::Bucket,
            GroupColumn::Market => Dimension::Market,
        }
    }
}
