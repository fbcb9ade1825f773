//! Serialisation of the incremental table to CSV or JSON.

use std::io::Write;
use std::path::Path;

use budget_core::error::{BudgetError, Result};
use budget_core::models::{IncrementalRecord, IncrementalTable};
use budget_core::schema::{Schema, ADJUSTED, DATE, EXECUTED, IS_CUMULATIVE};
use budget_core::settings::OutputFormat;
use serde_json::{Map, Value};
use tracing::info;

/// Write `table` as CSV with a header row.
///
/// Breakdown columns are included only when at least one row carries them.
pub fn write_csv<W: Write>(table: &IncrementalTable, writer: W) -> Result<()> {
    let schema = table.item_type.schema();
    let columns = present_columns(schema, table);

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&columns).map_err(export_error)?;

    for row in &table.rows {
        let record: Vec<String> = columns
            .iter()
            .map(|column| csv_field(schema, row, column))
            .collect();
        csv_writer.write_record(&record).map_err(export_error)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write `table` as a pretty-printed JSON array of flat objects.
pub fn write_json<W: Write>(table: &IncrementalTable, writer: W) -> Result<()> {
    let schema = table.item_type.schema();
    let objects: Vec<Value> = table
        .rows
        .iter()
        .map(|row| Value::Object(json_object(schema, row)))
        .collect();
    serde_json::to_writer_pretty(writer, &objects)?;
    Ok(())
}

/// Write `table` to `path` (creating parent directories), or to stdout when
/// `path` is `None`.
pub fn write_table(table: &IncrementalTable, path: Option<&Path>, format: OutputFormat) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(path)?;
            let buffered = std::io::BufWriter::new(file);
            write_with(table, buffered, format)?;
            info!("Wrote {} rows to {}", table.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_with(table, stdout.lock(), format)?;
        }
    }
    Ok(())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn write_with<W: Write>(table: &IncrementalTable, writer: W, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(table, writer),
        OutputFormat::Json => write_json(table, writer),
    }
}

fn export_error(e: csv::Error) -> BudgetError {
    BudgetError::Export(e.to_string())
}

/// Output columns, minus breakdowns no row carries.
fn present_columns(schema: &Schema, table: &IncrementalTable) -> Vec<&'static str> {
    schema
        .output_columns()
        .into_iter()
        .filter(|column| {
            !schema.breakdown_columns.contains(column)
                || table.rows.iter().any(|r| r.breakdowns.contains_key(*column))
        })
        .collect()
}

fn csv_field(schema: &Schema, row: &IncrementalRecord, column: &str) -> String {
    if let Some(pos) = schema.key_columns.iter().position(|c| *c == column) {
        return row.key.get(pos).unwrap_or_default().to_string();
    }
    match column {
        EXECUTED => row.executed.to_string(),
        ADJUSTED => row.adjusted.to_string(),
        IS_CUMULATIVE => row
            .is_cumulative_flag()
            .map(|f| f.to_string())
            .unwrap_or_default(),
        DATE => row.date_string(),
        breakdown => row
            .breakdowns
            .get(breakdown)
            .map(|v| v.to_string())
            .unwrap_or_default(),
    }
}

fn json_object(schema: &Schema, row: &IncrementalRecord) -> Map<String, Value> {
    let mut obj = Map::new();
    for (column, value) in schema.key_columns.iter().zip(row.key.values()) {
        obj.insert(column.to_string(), Value::String(value.clone()));
    }
    obj.insert(EXECUTED.to_string(), Value::from(row.executed));
    obj.insert(ADJUSTED.to_string(), Value::from(row.adjusted));
    for (name, value) in &row.breakdowns {
        obj.insert(name.clone(), Value::from(*value));
    }
    if let Some(flag) = row.is_cumulative_flag() {
        obj.insert(IS_CUMULATIVE.to_string(), Value::from(flag));
    }
    obj.insert(DATE.to_string(), Value::String(row.date_string()));
    obj
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use budget_core::models::ClassificationKey;
    use budget_core::schema::ItemType;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn expense_table() -> IncrementalTable {
        let mut breakdowns = BTreeMap::new();
        breakdowns.insert("EXECUTED_FIN_SOURCE_n1".to_string(), 12.5);
        IncrementalTable {
            item_type: ItemType::Expenses,
            rows: vec![
                IncrementalRecord {
                    key: ClassificationKey::new(["A1", "F1", "P1", "FU1", "0000"]),
                    executed: 50.0,
                    adjusted: 500.0,
                    breakdowns,
                    is_cumulative: Some(true),
                    date: NaiveDate::from_ymd_opt(2022, 2, 1).unwrap(),
                },
                IncrementalRecord {
                    key: ClassificationKey::new(["A1", "F1", "P1", "FU1", "2111"]),
                    executed: 7.25,
                    adjusted: 90.0,
                    breakdowns: BTreeMap::new(),
                    is_cumulative: Some(false),
                    date: NaiveDate::from_ymd_opt(2022, 2, 1).unwrap(),
                },
            ],
        }
    }

    fn income_table() -> IncrementalTable {
        IncrementalTable {
            item_type: ItemType::Income,
            rows: vec![IncrementalRecord {
                key: ClassificationKey::new(["A1", "F1", "11010000"]),
                executed: 3.0,
                adjusted: 10.0,
                breakdowns: BTreeMap::new(),
                is_cumulative: None,
                date: NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
            }],
        }
    }

    // ── write_csv ─────────────────────────────────────────────────────────────

    #[test]
    fn test_write_csv_expenses() {
        let mut buf = Vec::new();
        write_csv(&expense_table(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "ADMIN,FIN_SOURCE,PROG,FUNC,ECON,EXECUTED,ADJUSTED,EXECUTED_FIN_SOURCE_n1,IS_CUMULATIVE,DATE"
        );
        assert_eq!(lines[1], "A1,F1,P1,FU1,0000,50,500,12.5,1,2022-02-01");
        assert_eq!(lines[2], "A1,F1,P1,FU1,2111,7.25,90,,0,2022-02-01");
    }

    #[test]
    fn test_write_csv_income() {
        let mut buf = Vec::new();
        write_csv(&income_table(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "ADMIN,FIN_SOURCE,INCO,EXECUTED,ADJUSTED,DATE");
        assert_eq!(lines[1], "A1,F1,11010000,3,10,2023-11-01");
    }

    // ── write_json ────────────────────────────────────────────────────────────

    #[test]
    fn test_write_json_flat_objects() {
        let mut buf = Vec::new();
        write_json(&expense_table(), &mut buf).unwrap();
        let value: Value = serde_json::from_slice(&buf).unwrap();
        let rows = value.as_array().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["ECON"], "0000");
        assert_eq!(rows[0]["EXECUTED"], 50.0);
        assert_eq!(rows[0]["IS_CUMULATIVE"], 1);
        assert_eq!(rows[0]["DATE"], "2022-02-01");
        assert!(rows[1].get("EXECUTED_FIN_SOURCE_n1").is_none());
    }

    #[test]
    fn test_write_json_income_has_no_marker() {
        let mut buf = Vec::new();
        write_json(&income_table(), &mut buf).unwrap();
        let value: Value = serde_json::from_slice(&buf).unwrap();
        assert!(value[0].get("IS_CUMULATIVE").is_none());
        assert_eq!(value[0]["INCO"], "11010000");
    }

    // ── write_table ───────────────────────────────────────────────────────────

    #[test]
    fn test_write_table_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tables").join("expenses_2022.csv");

        write_table(&expense_table(), Some(path.as_path()), OutputFormat::Csv).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
