use serde_json::Value;

use super::format_value;

/// Print just the key answer value from the output.
///
/// The level monthly payment when present, otherwise the first field of
/// the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", render_minimal(value));
}

pub(crate) fn render_minimal(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = ["monthly_payment", "total_payment"];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    return format_value(val);
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_value(val));
        }
    }

    format_value(result_obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefers_monthly_payment() {
        let value = json!({ "result": { "principal": "25000.00", "monthly_payment": "477.53" } });
        assert_eq!(render_minimal(&value), "477.53");
    }

    #[test]
    fn test_total_payment_when_no_monthly_payment() {
        let value = json!({ "result": { "principal": "25000.00", "total_payment": "28651.38" } });
        assert_eq!(render_minimal(&value), "28651.38");
    }

    #[test]
    fn test_falls_back_to_first_field() {
        let value = json!({ "result": { "term_months": 60 } });
        assert_eq!(render_minimal(&value), "term_months: 60");
    }
}
