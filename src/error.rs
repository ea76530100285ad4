use thiserror::Error;

#[derive(Error, Debug)]
pub enum VarianceAnalyticsError {
    #[error("Unknown month '{0}': no facts are stored for it")]
    UnknownMonth(String),

    #[error("Invalid month tag '{0}': expected a zero-padded YYYY-MM period")]
    InvalidMonthTag(String),

    #[error("Invalid top-N count {0}: must be at least 1")]
    InvalidTopN(usize),

    #[error("Invalid variance threshold {0}: must be a finite, non-negative percentage")]
    InvalidThreshold(f64),

    #[error("Fact for month '{found}' cannot be stored under month '{expected}'")]
    MonthMismatch { expected: String, found: String },

    #[error("Duplicate fact for ({month_tag}, {market}, {ledger})")]
    DuplicateFact {
        month_tag: String,
        market: String,
        ledger: String,
    },

    #[error("Duplicate ledger mapping for '{0}'")]
    DuplicateLedgerMapping(String),

    #[error("No column mapping has been saved")]
    MissingColumnMapping,

    #[error("Row {row} is missing the '{column}' column")]
    MissingColumn { row: usize, column: String },

    #[error("Row {row}, column '{column}': cannot use value {value}")]
    InvalidCellValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VarianceAnalyticsError>;
