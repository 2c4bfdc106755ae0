pub mod csv_out;
pub mod display;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;
use std::io::Write;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Pretty-print the envelope to stdout.
fn print_json(value: &Value) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = serde_json::to_writer_pretty(&mut handle, value) {
        eprintln!("JSON serialization error: {}", e);
        return;
    }
    let _ = writeln!(handle);
}

/// Split a result object into its scalar fields and its schedule rows, if any.
pub(crate) fn split_schedule(
    result: &serde_json::Map<String, Value>,
) -> (Vec<(&String, &Value)>, Option<&Vec<Value>>) {
    let fields = result.iter().filter(|(k, _)| k.as_str() != "schedule").collect();
    let schedule = match result.get("schedule") {
        Some(Value::Array(rows)) => Some(rows),
        _ => None,
    };
    (fields, schedule)
}

/// Render a JSON leaf for a text cell.
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
