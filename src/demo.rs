//! Seeded sample dataset: five markets, fourteen ledgers, six months.

use crate::error::Result;
use crate::ingestion::RawRow;
use crate::schema::{ColumnMapping, LedgerMapping};
use crate::store::RecordStore;
use crate::utils::round_to;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use serde_json::{json, Value};

pub const DEMO_MONTHS: [&str; 6] = ["2024-07", "2024-08", "2024-09", "2024-10", "2024-11", "2024-12"];

const MARKETS: [(&str, f64); 5] = [
    ("North America", 1.5),
    ("Europe", 1.2),
    ("Asia Pacific", 1.0),
    ("Latin America", 0.6),
    ("Middle East", 0.4),
];

// (ledger, base monthly value, bucket, driver, controllable)
const LEDGERS: [(&str, f64, &str, &str, bool); 14] = [
    ("Revenue - Product Sales", 1_000_000.0, "Revenue", "Volume", true),
    ("Revenue - Services", 300_000.0, "Revenue", "Volume", true),
    ("COGS - Materials", -400_000.0, "COGS", "Volume", true),
    ("COGS - Labor", -200_000.0, "COGS", "Headcount", true),
    ("COGS - Overhead", -100_000.0, "COGS", "Fixed", false),
    ("SG&A - Marketing", -80_000.0, "SG&A", "Discretionary", true),
    ("SG&A - Sales", -120_000.0, "SG&A", "Headcount", true),
    ("SG&A - Admin", -60_000.0, "SG&A", "Fixed", false),
    ("R&D - Development", -50_000.0, "R&D", "Project", true),
    ("R&D - Research", -30_000.0, "R&D", "Project", true),
    ("Depreciation", -25_000.0, "Non-Cash", "Fixed", false),
    ("Interest Expense", -15_000.0, "Financing", "Fixed", false),
    ("Other Income", 10_000.0, "Other", "Variable", false),
    ("Tax Expense", -50_000.0, "Tax", "Calculated", false),
];

#[derive(Debug, Clone)]
pub struct DemoDataset {
    pub column_mapping: ColumnMapping,
    pub ledger_mappings: Vec<LedgerMapping>,
    /// Uploaded rows per month, in spreadsheet shape.
    pub months: Vec<(String, Vec<RawRow>)>,
}

pub fn demo_column_mapping() -> ColumnMapping {
    ColumnMapping::new("Market", "Ledger Account", "Actual", "Plan", "Forecast")
}

pub fn demo_ledger_mappings() -> Vec<LedgerMapping> {
    LEDGERS
        .iter()
        .map(|(ledger, _, bucket, driver, controllable)| {
            LedgerMapping::new(*ledger, *bucket, *driver, *controllable)
        })
        .collect()
}

/// Deterministic for a given seed. Each month grows the base values by 2%;
/// actual, plan and forecast carry independent uniform noise.
pub fn generate_demo_dataset(seed: u64) -> DemoDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let actual_noise = Uniform::new(-0.10, 0.15);
    let plan_noise = Uniform::new(-0.05, 0.05);
    let forecast_noise = Uniform::new(-0.08, 0.08);

    let months = DEMO_MONTHS
        .iter()
        .enumerate()
        .map(|(i, month)| {
            let growth = 1.0 + i as f64 * 0.02;
            let mut rows = Vec::with_capacity(MARKETS.len() * LEDGERS.len());

            for (market, multiplier) in MARKETS {
                for (ledger, base_value, ..) in LEDGERS {
                    let base = base_value * multiplier * growth;
                    let actual = round_to(base * (1.0 + actual_noise.sample(&mut rng)), 2);
                    let plan = round_to(base * (1.0 + plan_noise.sample(&mut rng)), 2);
                    let forecast = round_to(base * (1.0 + forecast_noise.sample(&mut rng)), 2);

                    let row: RawRow = [
                        ("Market", json!(market)),
                        ("Ledger Account", json!(ledger)),
                        ("Actual", json!(actual)),
                        ("Plan", json!(plan)),
                        ("Forecast", json!(forecast)),
                    ]
                    .into_iter()
                    .map(|(column, value): (&str, Value)| (column.to_string(), value))
                    .collect();
                    rows.push(row);
                }
            }

            (month.to_string(), rows)
        })
        .collect();

    DemoDataset {
        column_mapping: demo_column_mapping(),
        ledger_mappings: demo_ledger_mappings(),
        months,
    }
}

/// Saves the demo mappings and ingests every demo month into `store`.
pub fn load_demo_data(store: &mut RecordStore, seed: u64) -> Result<()> {
    let dataset = generate_demo_dataset(seed);

    store.save_column_mapping(dataset.column_mapping);
    store.replace_ledger_mappings(dataset.ledger_mappings)?;
    for (month, rows) in &dataset.months {
        store.ingest_month(month, rows)?;
    }

    info!("Loaded demo data for {} months (seed {})", dataset.months.len(), seed);
    Ok(())
}
