//! Rendering of argument values into literal SQL fragments.

use crate::dialect::{Dialect, NullablePolicy};
use crate::error::{Result, SqlyError};
use crate::value::SqlValue;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Renders one argument as a literal of `dialect`.
///
/// Lists become `(a,b,c)`; an empty list is [`SqlyError::EmptyArrayArgument`].
/// Values with no literal form (nested lists, non-finite floats) are
/// [`SqlyError::ArgumentType`].
pub fn encode_value<D: Dialect + ?Sized>(dialect: &D, value: &SqlValue) -> Result<String> {
    match value {
        SqlValue::Null => Ok(String::from("NULL")),
        SqlValue::Bool(b) => Ok(String::from(dialect.encode_bool(*b))),
        SqlValue::Int(n) => Ok(n.to_string()),
        SqlValue::UInt(n) => Ok(n.to_string()),
        SqlValue::Float32(f) => {
            if f.is_finite() {
                Ok(f.to_string())
            } else {
                Err(SqlyError::ArgumentType(format!("non-finite float {f}")))
            }
        }
        SqlValue::Float64(f) => {
            if f.is_finite() {
                Ok(f.to_string())
            } else {
                Err(SqlyError::ArgumentType(format!("non-finite float {f}")))
            }
        }
        SqlValue::Text(s) => Ok(dialect.quote_string(s)),
        SqlValue::Bytes(b) => Ok(dialect.encode_bytes(b)),
        SqlValue::Timestamp(t) => Ok(dialect.quote_string(&t.format(TIMESTAMP_FORMAT).to_string())),
        SqlValue::Nullable { inner, valid } => {
            let present = match dialect.nullable_policy() {
                NullablePolicy::Strict => *valid,
                NullablePolicy::ValidOrNonZero => {
                    *valid || (!matches!(**inner, SqlValue::Bool(_)) && !inner.is_zero())
                }
            };
            if present {
                encode_value(dialect, inner)
            } else {
                Ok(String::from("NULL"))
            }
        }
        SqlValue::List(items) => encode_list(dialect, items),
        SqlValue::Array(array) => Ok(dialect.quote_string(&array.to_array_text()?)),
    }
}

fn encode_list<D: Dialect + ?Sized>(dialect: &D, items: &[SqlValue]) -> Result<String> {
    if items.is_empty() {
        return Err(SqlyError::EmptyArrayArgument);
    }

    let mut kind: Option<&'static str> = None;
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            SqlValue::List(_) | SqlValue::Array(_) => {
                return Err(SqlyError::ArgumentType(format!(
                    "{} inside a list argument",
                    item.kind()
                )));
            }
            // NULL is allowed next to any element kind.
            SqlValue::Null => {}
            _ => match kind {
                Some(k) if k != item.kind() => {
                    return Err(SqlyError::ArgumentType(format!(
                        "list mixes {k} and {} elements",
                        item.kind()
                    )));
                }
                Some(_) => {}
                None => kind = Some(item.kind()),
            },
        }
        parts.push(encode_value(dialect, item)?);
    }
    Ok(format!("({})", parts.join(",")))
}
