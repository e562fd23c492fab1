//! Bytea text forms.

use super::ArrayError;

/// Decodes bytea text in either the `\x` hex form or the legacy escape form.
///
/// The escape form uses `\\` for a backslash and `\ooo` (three octal digits)
/// for any other byte; every other byte stands for itself.
///
/// # Errors
///
/// Returns `ArrayError::Bytea` on bad hex digits or a malformed escape.
pub fn parse_bytea(s: &[u8]) -> Result<Vec<u8>, ArrayError> {
    if let Some(hex_digits) = s.strip_prefix(br"\x") {
        return hex::decode(hex_digits).map_err(|e| ArrayError::Bytea(e.to_string()));
    }

    let mut out = Vec::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        if s[i] != b'\\' {
            out.push(s[i]);
            i += 1;
            continue;
        }
        if s.get(i + 1) == Some(&b'\\') {
            out.push(b'\\');
            i += 2;
            continue;
        }
        let octal = s
            .get(i + 1..i + 4)
            .filter(|d| d.iter().all(|b| (b'0'..=b'7').contains(b)))
            .and_then(|d| std::str::from_utf8(d).ok())
            .and_then(|d| u8::from_str_radix(d, 8).ok())
            .ok_or_else(|| ArrayError::Bytea(format!("invalid escape at offset {i}")))?;
        out.push(octal);
        i += 4;
    }
    Ok(out)
}

/// Encodes bytes in the `\x` hex form.
#[must_use]
pub fn encode_bytea(bytes: &[u8]) -> String {
    format!("\\x{}", hex::encode(bytes))
}
