use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the budget pipeline.
#[derive(Error, Debug)]
pub enum BudgetError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot file did not contain valid JSON.
    #[error("Failed to parse JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A JSON document could not be produced or parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The file name does not end in a two-digit month token.
    #[error("No month token in file name {path}: found \"{token}\"")]
    InvalidMonthToken { path: PathBuf, token: String },

    /// A snapshot row is missing a column or carries a value of the wrong type.
    #[error("Schema violation in {path}, row {row}, column {column}: {reason}")]
    SchemaViolation {
        path: PathBuf,
        row: usize,
        column: String,
        reason: String,
    },

    /// Two input files resolved to the same month.
    #[error("Month {month} supplied twice (second file: {path})")]
    DuplicateMonth { month: u32, path: PathBuf },

    /// The series does not start at January.
    #[error("Incomplete series: month 1 is missing")]
    IncompleteSeries,

    /// A month is present but the month before it is not.
    #[error("Incomplete series: month {month} has no month {previous} to subtract")]
    MissingPredecessor { month: u32, previous: u32 },

    /// A month number outside `1..=12` reached date construction.
    #[error("Invalid month number: {0}")]
    InvalidMonth(u32),

    /// The fiscal year is not a four-digit year.
    #[error("Invalid fiscal year: {0}")]
    InvalidFiscalYear(String),

    /// An item type string is neither `EXPENSES` nor `INCOME`.
    #[error("Invalid item type: {0}")]
    InvalidItemType(String),

    /// No snapshot files were found under the given path.
    #[error("No JSON files found in {0}")]
    NoDataFiles(PathBuf),

    /// The output table could not be written.
    #[error("Export error: {0}")]
    Export(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the budget crates.
pub type Result<T> = std::result::Result<T, BudgetError>;
