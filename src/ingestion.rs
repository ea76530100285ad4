use crate::error::{Result, VarianceAnalyticsError};
use crate::schema::{ColumnMapping, Fact, LedgerMapping};
use crate::utils::validate_month_tag;
use log::warn;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;

/// One uploaded spreadsheet row keyed by its external column names.
pub type RawRow = BTreeMap<String, Value>;

/// Reads a headed CSV into raw rows. Every cell arrives as a string and is
/// interpreted later against the column mapping.
pub fn read_csv_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

fn cell<'a>(row: &'a RawRow, row_idx: usize, column: &str) -> Result<&'a Value> {
    row.get(column)
        .ok_or_else(|| VarianceAnalyticsError::MissingColumn {
            row: row_idx,
            column: column.to_string(),
        })
}

fn invalid(row_idx: usize, column: &str, value: &Value) -> VarianceAnalyticsError {
    VarianceAnalyticsError::InvalidCellValue {
        row: row_idx,
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn text_cell(row: &RawRow, row_idx: usize, column: &str) -> Result<String> {
    let value = cell(row, row_idx, column)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return Err(invalid(row_idx, column, value)),
    };

    if text.is_empty() {
        return Err(invalid(row_idx, column, value));
    }
    Ok(text)
}

/// Blank or null measures are read as 0.
fn amount_cell(row: &RawRow, row_idx: usize, column: &str) -> Result<f64> {
    let value = cell(row, row_idx, column)?;
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(
            s.trim()
                .replace(',', "")
                .parse::<f64>()
                .map_err(|_| invalid(row_idx, column, value))?,
        ),
        Value::Null => None,
        _ => return Err(invalid(row_idx, column, value)),
    };

    match amount {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(invalid(row_idx, column, value)),
        None => {
            warn!("Row {} has no value for '{}', using 0", row_idx, column);
            Ok(0.0)
        }
    }
}

/// Resolves uploaded rows into canonical facts for `month_tag` using the
/// active column mapping.
pub fn ingest_rows(rows: &[RawRow], month_tag: &str, mapping: &ColumnMapping) -> Result<Vec<Fact>> {
    validate_month_tag(month_tag)?;

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            Ok(Fact {
                month_tag: month_tag.to_string(),
                market: text_cell(row, idx, &mapping.market_col)?,
                ledger: text_cell(row, idx, &mapping.ledger_col)?,
                actual: amount_cell(row, idx, &mapping.actual_col)?,
                plan: amount_cell(row, idx, &mapping.plan_col)?,
                forecast: amount_cell(row, idx, &mapping.forecast_col)?,
            })
        })
        .collect()
}

fn optional_text(row: &RawRow, column: &str) -> Option<String> {
    match row.get(column) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn controllable_cell(row: &RawRow, row_idx: usize) -> Result<bool> {
    let value = match row.get("controllable") {
        None | Some(Value::Null) => return Ok(true),
        Some(value) => value,
    };

    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64() != Some(0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "true" | "yes" | "y" | "1" => Ok(true),
            "false" | "no" | "n" | "0" => Ok(false),
            _ => Err(invalid(row_idx, "controllable", value)),
        },
        _ => Err(invalid(row_idx, "controllable", value)),
    }
}

/// Reads ledger mapping rows with columns `ledger`, `bucket`, `driver` and
/// `controllable`. Only `ledger` is required.
pub fn ledger_mappings_from_rows(rows: &[RawRow]) -> Result<Vec<LedgerMapping>> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            Ok(LedgerMapping {
                ledger: text_cell(row, idx, "ledger")?,
                bucket: optional_text(row, "bucket"),
                driver: optional_text(row, "driver"),
                controllable: controllable_cell(row, idx)?,
            })
        })
        .collect()
}
