use crate::error::{Result, VarianceAnalyticsError};
use crate::ingestion::{ingest_rows, RawRow};
use crate::schema::{ColumnMapping, EnrichedFact, Fact, LedgerMapping};
use crate::utils::validate_month_tag;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Left-joins facts with their ledger mappings. Facts without a mapping keep
/// `None` enrichment and are never dropped.
pub fn enrich_facts(
    facts: &[Fact],
    mappings: &BTreeMap<String, LedgerMapping>,
) -> Vec<EnrichedFact> {
    facts
        .iter()
        .map(|fact| EnrichedFact::from_fact(fact, mappings.get(&fact.ledger)))
        .collect()
}

/// In-memory record store. Months are replaced wholesale and readers get
/// owned snapshots, so a half-replaced month is never observable.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    facts: BTreeMap<String, Vec<Fact>>,
    ledger_mappings: BTreeMap<String, LedgerMapping>,
    column_mapping: Option<ColumnMapping>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Replaces every fact of `month_tag` with `facts`. All rows are
    /// validated before anything is modified; on error the store is
    /// unchanged. Replacing with an empty set removes the month.
    pub fn replace_month(&mut self, month_tag: &str, facts: Vec<Fact>) -> Result<usize> {
        validate_month_tag(month_tag)?;

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for fact in &facts {
            if fact.month_tag != month_tag {
                return Err(VarianceAnalyticsError::MonthMismatch {
                    expected: month_tag.to_string(),
                    found: fact.month_tag.clone(),
                });
            }
            if !seen.insert((fact.market.as_str(), fact.ledger.as_str())) {
                return Err(VarianceAnalyticsError::DuplicateFact {
                    month_tag: month_tag.to_string(),
                    market: fact.market.clone(),
                    ledger: fact.ledger.clone(),
                });
            }
        }

        let count = facts.len();
        if facts.is_empty() {
            self.facts.remove(month_tag);
        } else {
            self.facts.insert(month_tag.to_string(), facts);
        }

        info!("Stored {} facts for month {}", count, month_tag);
        Ok(count)
    }

    /// Resolves uploaded rows through the saved column mapping and replaces
    /// the month with the result.
    pub fn ingest_month(&mut self, month_tag: &str, rows: &[RawRow]) -> Result<usize> {
        let mapping = self
            .column_mapping
            .as_ref()
            .ok_or(VarianceAnalyticsError::MissingColumnMapping)?;
        let facts = ingest_rows(rows, month_tag, mapping)?;
        self.replace_month(month_tag, facts)
    }

    pub fn save_column_mapping(&mut self, mapping: ColumnMapping) {
        info!("Saved column mapping: {:?}", mapping);
        self.column_mapping = Some(mapping);
    }

    pub fn column_mapping(&self) -> Option<&ColumnMapping> {
        self.column_mapping.as_ref()
    }

    /// Replaces the whole ledger mapping table. Rejects duplicate ledgers
    /// without touching the current table.
    pub fn replace_ledger_mappings(&mut self, mappings: Vec<LedgerMapping>) -> Result<usize> {
        let mut table = BTreeMap::new();
        for mapping in mappings {
            if table.contains_key(&mapping.ledger) {
                return Err(VarianceAnalyticsError::DuplicateLedgerMapping(mapping.ledger));
            }
            table.insert(mapping.ledger.clone(), mapping);
        }

        let count = table.len();
        self.ledger_mappings = table;
        info!("Stored {} ledger mappings", count);
        Ok(count)
    }

    pub fn upsert_ledger_mapping(&mut self, mapping: LedgerMapping) {
        debug!("Upserting ledger mapping for {}", mapping.ledger);
        self.ledger_mappings.insert(mapping.ledger.clone(), mapping);
    }

    pub fn ledger_mappings(&self) -> Vec<LedgerMapping> {
        self.ledger_mappings.values().cloned().collect()
    }

    /// Every fact joined with its ledger mapping, newest month first.
    pub fn all_facts(&self) -> Vec<EnrichedFact> {
        self.facts
            .values()
            .rev()
            .flat_map(|facts| enrich_facts(facts, &self.ledger_mappings))
            .collect()
    }

    pub fn facts_for_month(&self, month_tag: &str) -> Vec<EnrichedFact> {
        self.facts
            .get(month_tag)
            .map(|facts| enrich_facts(facts, &self.ledger_mappings))
            .unwrap_or_default()
    }

    /// Distinct month tags, newest first.
    pub fn months(&self) -> Vec<String> {
        self.facts.keys().rev().cloned().collect()
    }

    /// Distinct markets, ascending.
    pub fn markets(&self) -> Vec<String> {
        let markets: BTreeSet<&str> = self
            .facts
            .values()
            .flatten()
            .map(|f| f.market.as_str())
            .collect();
        markets.into_iter().map(str::to_string).collect()
    }
}
