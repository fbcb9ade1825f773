//! Column layouts for the two kinds of budget snapshot.
//!
//! Each [`Schema`] is an immutable descriptor handed to the loader and the
//! decumulator; nothing in the pipeline reads column names from ambient state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BudgetError;

// ── Column names ──────────────────────────────────────────────────────────────

pub const ADMIN: &str = "ADMIN";
pub const FIN_SOURCE: &str = "FIN_SOURCE";
pub const PROG: &str = "PROG";
pub const FUNC: &str = "FUNC";
pub const ECON: &str = "ECON";
pub const INCO: &str = "INCO";

pub const ADJUSTED: &str = "ADJUSTED";
pub const EXECUTED: &str = "EXECUTED";
pub const IS_CUMULATIVE: &str = "IS_CUMULATIVE";
pub const DATE: &str = "DATE";

/// Economic code of the aggregate rows in expenditure snapshots.
pub const CUMULATIVE_ECON_CODE: &str = "0000";

// ── ItemType ──────────────────────────────────────────────────────────────────

/// Which side of the budget a snapshot describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemType {
    Expenses,
    Income,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Expenses => "EXPENSES",
            ItemType::Income => "INCOME",
        }
    }

    /// The column layout for this item type.
    pub fn schema(&self) -> &'static Schema {
        Schema::for_item_type(*self)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EXPENSES" => Ok(ItemType::Expenses),
            "INCOME" => Ok(ItemType::Income),
            _ => Err(BudgetError::InvalidItemType(s.to_string())),
        }
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Column descriptor for one item type.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    pub item_type: ItemType,
    /// Classification columns, in index order.
    pub key_columns: &'static [&'static str],
    /// Per-funding-source execution columns that may or may not be present.
    /// They are decumulated the same way as `EXECUTED`.
    pub breakdown_columns: &'static [&'static str],
    /// Whether rows carry the derived `IS_CUMULATIVE` marker.
    pub marks_cumulative: bool,
}

pub static EXPENSES_SCHEMA: Schema = Schema {
    item_type: ItemType::Expenses,
    key_columns: &[ADMIN, FIN_SOURCE, PROG, FUNC, ECON],
    breakdown_columns: &[
        "EXECUTED_FIN_SOURCE_n1",
        "EXECUTED_FIN_SOURCE_n2",
        "EXECUTED_FIN_SOURCE_n6",
    ],
    marks_cumulative: true,
};

pub static INCOME_SCHEMA: Schema = Schema {
    item_type: ItemType::Income,
    key_columns: &[ADMIN, FIN_SOURCE, INCO],
    breakdown_columns: &[],
    marks_cumulative: false,
};

impl Schema {
    pub fn for_item_type(item_type: ItemType) -> &'static Schema {
        match item_type {
            ItemType::Expenses => &EXPENSES_SCHEMA,
            ItemType::Income => &INCOME_SCHEMA,
        }
    }

    /// Position of `ECON` among the key columns, if this schema has one.
    pub fn econ_position(&self) -> Option<usize> {
        self.key_columns.iter().position(|c| *c == ECON)
    }

    /// Whether a row with the given key values is an aggregate (total) row.
    ///
    /// Returns `None` for schemas that do not mark cumulative rows.
    pub fn is_cumulative_row(&self, key_values: &[String]) -> Option<bool> {
        if !self.marks_cumulative {
            return None;
        }
        let pos = self.econ_position()?;
        Some(
            key_values
                .get(pos)
                .map(|code| code == CUMULATIVE_ECON_CODE)
                .unwrap_or(false),
        )
    }

    /// Full output header: keys, `EXECUTED`, `ADJUSTED`, breakdowns,
    /// `IS_CUMULATIVE` (when marked) and `DATE`.
    pub fn output_columns(&self) -> Vec<&'static str> {
        let mut cols: Vec<&'static str> = self.key_columns.to_vec();
        cols.push(EXECUTED);
        cols.push(ADJUSTED);
        cols.extend_from_slice(self.breakdown_columns);
        if self.marks_cumulative {
            cols.push(IS_CUMULATIVE);
        }
        cols.push(DATE);
        cols
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    // ── ItemType ──────────────────────────────────────────────────────────────

    #[test]
    fn test_item_type_parse() {
        assert_eq!("EXPENSES".parse::<ItemType>().unwrap(), ItemType::Expenses);
        assert_eq!("income".parse::<ItemType>().unwrap(), ItemType::Income);
        assert_eq!(" Income ".parse::<ItemType>().unwrap(), ItemType::Income);
    }

    #[test]
    fn test_item_type_parse_rejects_unknown() {
        let err = "CREDITS".parse::<ItemType>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid item type: CREDITS");
    }

    #[test]
    fn test_item_type_display() {
        assert_eq!(ItemType::Expenses.to_string(), "EXPENSES");
        assert_eq!(ItemType::Income.to_string(), "INCOME");
    }

    // ── Schema ────────────────────────────────────────────────────────────────

    #[test]
    fn test_schema_key_columns() {
        assert_eq!(
            ItemType::Expenses.schema().key_columns,
            &["ADMIN", "FIN_SOURCE", "PROG", "FUNC", "ECON"]
        );
        assert_eq!(
            ItemType::Income.schema().key_columns,
            &["ADMIN", "FIN_SOURCE", "INCO"]
        );
    }

    #[test]
    fn test_is_cumulative_row_expenses() {
        let schema = &EXPENSES_SCHEMA;
        assert_eq!(
            schema.is_cumulative_row(&keys(&["A1", "F1", "P1", "FU1", "0000"])),
            Some(true)
        );
        assert_eq!(
            schema.is_cumulative_row(&keys(&["A1", "F1", "P1", "FU1", "2111"])),
            Some(false)
        );
    }

    #[test]
    fn test_is_cumulative_row_income_is_none() {
        assert_eq!(
            INCOME_SCHEMA.is_cumulative_row(&keys(&["A1", "F1", "0000"])),
            None
        );
    }

    #[test]
    fn test_output_columns_expenses() {
        let cols = EXPENSES_SCHEMA.output_columns();
        assert_eq!(cols.first(), Some(&"ADMIN"));
        assert_eq!(cols[5], "EXECUTED");
        assert_eq!(cols[6], "ADJUSTED");
        assert_eq!(cols[cols.len() - 2], "IS_CUMULATIVE");
        assert_eq!(cols.last(), Some(&"DATE"));
    }

    #[test]
    fn test_output_columns_income() {
        assert_eq!(
            INCOME_SCHEMA.output_columns(),
            vec!["ADMIN", "FIN_SOURCE", "INCO", "EXECUTED", "ADJUSTED", "DATE"]
        );
    }
}
