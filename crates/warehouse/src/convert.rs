use serde_json::Value;

use crate::result::ResultColumn;

/// Convert one raw result cell into a JSON scalar based on its Snowflake
/// wire type.
///
/// Numeric and boolean types attempt parsing and fall back to text if parsing
/// fails. NULL becomes `Value::Null`.
pub(crate) fn parse_cell(value: Option<&str>, column: &ResultColumn) -> Value {
    let Some(value) = value else {
        return Value::Null;
    };

    match column.data_type.to_lowercase().as_str() {
        // NUMBER(p, s): integral when the scale is zero.
        "fixed" => match column.scale.unwrap_or(0) {
            0 => value
                .parse::<i64>()
                .map(Value::from)
                .ok()
                .or_else(|| parse_float(value))
                .unwrap_or_else(|| text(value)),
            _ => parse_float(value).unwrap_or_else(|| text(value)),
        },
        "real" => parse_float(value).unwrap_or_else(|| text(value)),
        "boolean" => match value.to_lowercase().as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => text(value),
        },
        // text, date, time, timestamp_*, variant, object, array, binary
        _ => text(value),
    }
}

/// Non-finite values have no JSON number form and yield `None`.
fn parse_float(value: &str) -> Option<Value> {
    let f = value.parse::<f64>().ok()?;
    serde_json::Number::from_f64(f).map(Value::Number)
}

fn text(value: &str) -> Value {
    Value::String(value.to_string())
}
