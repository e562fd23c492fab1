//! JSON argument lists.

use anyhow::{bail, Context};
use oxide_sqly_core::SqlValue;
use serde_json::Value;

/// Parses a JSON array into statement arguments.
///
/// Nested arrays become list arguments for `IN ?` expansion.
pub fn parse_args(json: &str) -> anyhow::Result<Vec<SqlValue>> {
    let value: Value = serde_json::from_str(json).context("arguments must be a JSON array")?;
    let Value::Array(items) = value else {
        bail!("arguments must be a JSON array, got {json}");
    };
    items.into_iter().map(to_sql_value).collect()
}

/// Parses a JSON array of arrays into batch rows.
pub fn parse_rows(json: &str) -> anyhow::Result<Vec<Vec<SqlValue>>> {
    let value: Value = serde_json::from_str(json).context("rows must be a JSON array")?;
    let Value::Array(rows) = value else {
        bail!("rows must be a JSON array of arrays, got {json}");
    };
    rows.into_iter()
        .map(|row| match row {
            Value::Array(items) => items
                .into_iter()
                .map(to_sql_value)
                .collect::<anyhow::Result<Vec<_>>>(),
            other => bail!("each row must be a JSON array, got {other}"),
        })
        .collect()
}

fn to_sql_value(value: Value) -> anyhow::Result<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                SqlValue::UInt(u)
            } else if let Some(f) = n.as_f64() {
                SqlValue::Float64(f)
            } else {
                bail!("unsupported number {n}");
            }
        }
        Value::String(s) => SqlValue::Text(s),
        Value::Array(items) => {
            SqlValue::List(items.into_iter().map(to_sql_value).collect::<anyhow::Result<_>>()?)
        }
        Value::Object(_) => bail!("objects are not valid arguments"),
    })
}
