//! Legacy double-quote dialect.

use super::Dialect;

/// Renders strings in double quotes with backslash escapes.
///
/// MySQL accepts this form unless `ANSI_QUOTES` is set; other servers read a
/// double-quoted token as an identifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyDialect;

impl LegacyDialect {
    /// Creates a new legacy dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for LegacyDialect {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn quote_string(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('"');
        for c in s.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
        out
    }
}
