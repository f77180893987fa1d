//! Records
//!
//! A record is a JSON object with no fixed schema. Key order is kept as
//! written (serde_json `preserve_order`), which the formatter relies on.

use serde_json::{Map, Number, Value};

use crate::error::{DbError, Result};

/// Field used to look records up for update/delete
pub const ID_FIELD: &str = "id";

/// A single row: ordered field name → dynamically typed value
pub type Record = Map<String, Value>;

/// Match of a record's `id` field against `id`.
///
/// Numbers compare by numeric value, so `1` matches `1.0`. Nothing else is
/// coerced: `1` does not match `"1"`, and a record without an `id` never
/// matches.
pub fn record_has_id(record: &Record, id: &Value) -> bool {
    match (record.get(ID_FIELD), id) {
        (Some(Value::Number(a)), Value::Number(b)) => numbers_equal(a, b),
        (Some(value), _) => value == id,
        (None, _) => false,
    }
}

/// Position of the first record whose `id` equals `id`
pub fn position_of(records: &[Record], id: &Value) -> Option<usize> {
    records.iter().position(|r| record_has_id(r, id))
}

/// Decode a record typed in as raw JSON text. Must be a JSON object.
pub fn parse_record(input: &str) -> Result<Record> {
    let value: Value = serde_json::from_str(input.trim())
        .map_err(|e| DbError::Validation(format!("record is not valid JSON: {}", e)))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(DbError::Validation(format!(
            "record must be a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

/// Decode a row id typed in as raw text.
///
/// A JSON number, string or bool is used as-is, so `7` matches numeric ids
/// and `"7"` matches string ids. Anything else is taken literally as a
/// string id.
pub fn parse_row_id(input: &str) -> Value {
    let trimmed = input.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(v @ (Value::Number(_) | Value::String(_) | Value::Bool(_))) => v,
        _ => Value::String(trimmed.to_string()),
    }
}

/// Integers compare exactly; anything involving a float compares as f64
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Short name of a JSON value's type, for error messages
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
