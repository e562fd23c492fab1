//! Placeholder substitution.
//!
//! `?` is the only placeholder and is never escaped: a `?` inside a string
//! literal of the template still counts.

use std::sync::OnceLock;

use regex::Regex;

use crate::dialect::Dialect;
use crate::encode::encode_value;
use crate::error::{Result, SqlyError};
use crate::value::SqlValue;

/// Pattern of the value group repeated by [`build_batch`].
pub const VALUE_GROUP_PATTERN: &str = r"(\((\?,\s*)+\?*\s*\))";

fn value_group() -> Result<&'static Regex> {
    static RE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VALUE_GROUP_PATTERN))
        .as_ref()
        .map_err(|e| SqlyError::StatementSyntax(e.to_string()))
}

/// Substitutes each `?` of `template` with the literal of the matching argument.
///
/// With no arguments, or no placeholder in the template, the template is
/// returned unchanged.
///
/// # Errors
///
/// Fails with [`SqlyError::StatementFormat`] when the placeholder and
/// argument counts differ, or with the first encoding error of an argument.
///
/// ```rust
/// use oxide_sqly_core::dialect::MySqlDialect;
/// use oxide_sqly_core::{args, format_statement};
///
/// let sql = format_statement(
///     &MySqlDialect::new(),
///     "WHERE mobile=? AND role IN ?",
///     &args!["18712342345", vec![0, 1, 2]],
/// )
/// .unwrap();
/// assert_eq!(sql, "WHERE mobile='18712342345' AND role IN (0,1,2)");
/// ```
pub fn format_statement<D: Dialect + ?Sized>(
    dialect: &D,
    template: &str,
    args: &[SqlValue],
) -> Result<String> {
    if args.is_empty() || !template.contains('?') {
        return Ok(template.to_string());
    }

    let fragments: Vec<&str> = template.split('?').collect();
    if fragments.len() != args.len() + 1 {
        return Err(SqlyError::StatementFormat {
            placeholders: fragments.len() - 1,
            arguments: args.len(),
        });
    }

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    for (fragment, arg) in fragments.iter().zip(args) {
        out.push_str(fragment);
        out.push_str(&encode_value(dialect, arg)?);
    }
    out.push_str(fragments[args.len()]);
    Ok(out)
}

/// Builds a multi-row statement by repeating the `(?, ...)` group of `template`.
///
/// The group is formatted once per row. Text after the group is dropped and
/// `;` is appended.
///
/// # Errors
///
/// Fails with [`SqlyError::StatementSyntax`] unless the template holds exactly
/// one group, with [`SqlyError::EmptyArrayArgument`] when `rows` is empty, or
/// with the first formatting error of a row.
pub fn build_batch<D, R>(dialect: &D, template: &str, rows: &[R]) -> Result<String>
where
    D: Dialect + ?Sized,
    R: AsRef<[SqlValue]>,
{
    let mut groups = value_group()?.find_iter(template);
    let group = match (groups.next(), groups.next()) {
        (Some(group), None) => group,
        (None, _) => {
            return Err(SqlyError::StatementSyntax(String::from(
                "no (?, ...) value group in statement",
            )))
        }
        (Some(_), Some(_)) => {
            return Err(SqlyError::StatementSyntax(String::from(
                "more than one (?, ...) value group in statement",
            )))
        }
    };
    if rows.is_empty() {
        return Err(SqlyError::EmptyArrayArgument);
    }

    let rendered = rows
        .iter()
        .map(|row| format_statement(dialect, group.as_str(), row.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let mut out = String::from(&template[..group.start()]);
    out.push_str(&rendered.join(","));
    out.push(';');
    Ok(out)
}
