use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{format_value, split_schedule};

/// Format output as tables: loan summary first, then the schedule rows.
pub fn print_table(value: &Value) {
    println!("{}", render_table(value));
}

pub(crate) fn render_table(value: &Value) -> String {
    let mut out = String::new();
    let Value::Object(envelope) = value else {
        return value.to_string();
    };

    let result = match envelope.get("result") {
        Some(Value::Object(result)) => result,
        _ => return field_table(envelope.iter()),
    };

    let (fields, schedule) = split_schedule(result);
    out.push_str(&field_table(fields.into_iter()));

    if let Some(rows) = schedule {
        out.push_str("\n\nSchedule:\n");
        out.push_str(&rows_table(rows));
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            out.push_str("\n\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    out.push_str(&format!("\n  - {}", s));
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        out.push_str(&format!("\n\nMethodology: {}", meth));
    }
    out
}

fn field_table<'a>(fields: impl Iterator<Item = (&'a String, &'a Value)>) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    Table::from(builder).to_string()
}

fn rows_table(rows: &[Value]) -> String {
    let Some(Value::Object(first)) = rows.first() else {
        return "(empty)".to_string();
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);

    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }

    Table::from(builder).to_string()
}
