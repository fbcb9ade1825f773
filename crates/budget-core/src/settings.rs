use clap::Parser;
use std::path::PathBuf;

use crate::error::{BudgetError, Result};
use crate::models::VanishedKeyPolicy;
use crate::schema::{ItemType, Schema};
use crate::time_utils::parse_fiscal_year;

// ── OutputFormat ───────────────────────────────────────────────────────────────

/// Serialisation used for the de-cumulated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Convert cumulative monthly budget snapshots into monthly increments
#[derive(Parser, Debug, Clone)]
#[command(
    name = "openbudget",
    about = "Convert cumulative monthly budget snapshots into monthly increments",
    version
)]
pub struct Settings {
    /// Snapshot files, or directories searched for `*.json` snapshots
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Item type of the snapshots
    #[arg(long, default_value = "EXPENSES", value_parser = ["EXPENSES", "INCOME"], ignore_case = true)]
    pub item_type: String,

    /// Fiscal year the snapshots belong to
    #[arg(long, env = "OPENBUDGET_YEAR")]
    pub year: String,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "csv", value_parser = ["csv", "json"])]
    pub format: String,

    /// Handling of keys that disappear from one month to the next
    #[arg(long, default_value = "drop", value_parser = ["drop", "reversal"])]
    pub vanished_keys: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and validate them. Exits on `--help`,
    /// `--version` or a malformed command line.
    pub fn load() -> Result<Self> {
        Self::validated(Settings::parse())
    }

    /// Same as [`Settings::load`] but with an explicit argument list and
    /// parse failures returned as [`BudgetError::Config`].
    pub fn load_from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let settings =
            Settings::try_parse_from(args).map_err(|e| BudgetError::Config(e.to_string()))?;
        Self::validated(settings)
    }

    fn validated(mut settings: Settings) -> Result<Self> {
        parse_fiscal_year(&settings.year)?;

        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        Ok(settings)
    }

    pub fn item_type(&self) -> Result<ItemType> {
        self.item_type.parse()
    }

    pub fn schema(&self) -> Result<&'static Schema> {
        Ok(self.item_type()?.schema())
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.format.as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Csv,
        }
    }

    pub fn vanished_key_policy(&self) -> VanishedKeyPolicy {
        match self.vanished_keys.as_str() {
            "reversal" => VanishedKeyPolicy::Reversal,
            _ => VanishedKeyPolicy::Drop,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
