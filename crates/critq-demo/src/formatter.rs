//! Output formatters for search results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use critq_core::proto::Value;
use critq_core::EntityRow;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format matching rows.
    fn format_rows(&self, rows: &[EntityRow]) -> String;

    /// Format a row count.
    fn format_count(&self, count: u64) -> String;

    /// Format a compiled plan.
    fn format_plan(&self, plan: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_rows(&self, rows: &[EntityRow]) -> String {
        let Some(first) = rows.first() else {
            return "No results".to_string();
        };

        let mut table = Table::new();
        table.set_header(first.fields.iter().map(|(name, _)| Cell::new(name)));
        for row in rows {
            table.add_row(row.fields.iter().map(|(_, value)| Cell::new(format_value(value))));
        }

        format!("{}\n{} row(s)", table, rows.len())
    }

    fn format_count(&self, count: u64) -> String {
        format!("{} match(es)", count)
    }

    fn format_plan(&self, plan: &str) -> String {
        plan.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_rows(&self, rows: &[EntityRow]) -> String {
        let rows: Vec<serde_json::Value> = rows.iter().map(row_to_json).collect();
        serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_count(&self, count: u64) -> String {
        serde_json::json!({ "count": count }).to_string()
    }

    fn format_plan(&self, plan: &str) -> String {
        serde_json::json!({ "plan": plan }).to_string()
    }
}

/// Format a Value as a display string.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        Value::Date(d) => d.to_string(),
        other => other.to_string(),
    }
}

fn row_to_json(row: &EntityRow) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    for (name, value) in &row.fields {
        obj.insert(name.clone(), value_to_json(value));
    }
    serde_json::Value::Object(obj)
}

/// Convert a Value to JSON.
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int32(i) => serde_json::Value::Number((*i).into()),
        Value::Int64(i) => serde_json::Value::Number((*i).into()),
        Value::Float64(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Date(d) => serde_json::Value::String(d.to_string()),
    }
}
