use serde_json::Value;
use std::io;

use super::{format_value, split_schedule};

/// Write output as CSV to stdout.
///
/// A result carrying a schedule is written one row per month; anything
/// else becomes two-column `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(stdout.lock(), value) {
        eprintln!("CSV write error: {}", e);
    }
}

pub(crate) fn write_csv<W: io::Write>(writer: W, value: &Value) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => match split_schedule(map) {
            (_, Some(rows)) => write_rows(&mut wtr, rows)?,
            (fields, None) => {
                wtr.write_record(["field", "value"])?;
                for (key, val) in fields {
                    wtr.write_record([key.as_str(), &format_value(val)])?;
                }
            }
        },
        Value::Array(rows) => write_rows(&mut wtr, rows)?,
        other => wtr.write_record([format_value(other)])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;

    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}
