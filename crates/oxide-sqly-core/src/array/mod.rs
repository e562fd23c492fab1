//! Array text codec.
//!
//! Arrays travel as text in the form `{1,2,3}` or `{{"a","b"},{"c",NULL}}`.
//! [`parse_array`] splits that text into its dimensions and flat element
//! list; the typed and generic array types build on it.

mod bytea;
mod generic;
mod timestamp;
mod typed;

pub use bytea::{encode_bytea, parse_bytea};
pub use generic::{ArrayElement, ArrayNode, GenericArray};
pub use timestamp::{format_timestamp, parse_timestamp};
pub use typed::{
    BoolArray, ByteaArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};

/// Errors raised while encoding or decoding array text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArrayError {
    /// A character appeared where the grammar does not allow it.
    #[error("unexpected {found:?} at offset {offset}, expected {expected}")]
    Unexpected {
        /// What was found, `None` at end of input.
        found: Option<char>,
        /// Byte offset in the source.
        offset: usize,
        /// What the grammar expected.
        expected: &'static str,
    },

    /// Sub-arrays at the same depth have different lengths.
    #[error("multidimensional arrays must have sub-arrays with matching dimensions")]
    Ragged,

    /// The array has a different number of dimensions than the target type.
    #[error("cannot convert array of {found} dimensions into a {expected}-dimensional value")]
    Dimensions {
        /// Dimensions the target accepts.
        expected: usize,
        /// Dimensions found in the text.
        found: usize,
    },

    /// A NULL element was found where the element type cannot hold one.
    #[error("unexpected NULL element at index {0}")]
    NullElement(usize),

    /// An element could not be decoded into the element type.
    #[error("parsing array element index {index}: {reason}")]
    Element {
        /// Flat element index.
        index: usize,
        /// Why it failed.
        reason: String,
    },

    /// Bytea text was malformed.
    #[error("invalid bytea: {0}")]
    Bytea(String),

    /// Timestamp text was malformed.
    #[error("invalid timestamp {0:?}")]
    Timestamp(String),
}

/// Splits array text into its dimensions and flat, row-major elements.
///
/// Unquoted `NULL` yields a `None` element. The empty array `{}` yields no
/// dimensions and no elements.
///
/// # Errors
///
/// Returns an `ArrayError` if the text is malformed or ragged.
pub fn parse_array(
    src: &str,
    delimiter: char,
) -> Result<(Vec<usize>, Vec<Option<String>>), ArrayError> {
    let bytes: Vec<(usize, char)> = src.char_indices().collect();
    let at = |i: usize| bytes.get(i).map(|&(_, c)| c);
    let offset = |i: usize| bytes.get(i).map_or(src.len(), |&(o, _)| o);
    let unexpected = |i: usize, expected: &'static str| ArrayError::Unexpected {
        found: at(i),
        offset: offset(i),
        expected,
    };

    let mut i = 0;
    while at(i) == Some('{') {
        i += 1;
    }
    let ndim = i;
    if ndim == 0 {
        return Err(unexpected(0, "'{'"));
    }
    if ndim == 1 && at(i) == Some('}') {
        return match at(i + 1) {
            None => Ok((Vec::new(), Vec::new())),
            Some(_) => Err(unexpected(i + 1, "end of input")),
        };
    }

    let mut dims = vec![0usize; ndim];
    let mut seen = vec![false; ndim];
    let mut counts = vec![0usize; ndim];
    let mut elems = Vec::new();
    let mut depth = ndim;

    loop {
        if depth == ndim && counts[depth - 1] == 0 && at(i) == Some('}') {
            // Empty innermost sub-array.
        } else if depth == ndim {
            let (elem, next) = parse_element(&bytes, i, delimiter)
                .ok_or_else(|| unexpected(bytes.len(), "'\"'"))?;
            elems.push(elem);
            counts[depth - 1] += 1;
            i = next;
        } else if at(i) == Some('{') {
            depth += 1;
            counts[depth - 1] = 0;
            i += 1;
            continue;
        } else {
            return Err(ArrayError::Ragged);
        }

        // Close as many levels as there are braces, then expect a delimiter.
        loop {
            match at(i) {
                Some(c) if c == delimiter => {
                    i += 1;
                    break;
                }
                Some('}') => {
                    let level = depth - 1;
                    if seen[level] {
                        if dims[level] != counts[level] {
                            return Err(ArrayError::Ragged);
                        }
                    } else {
                        dims[level] = counts[level];
                        seen[level] = true;
                    }
                    depth -= 1;
                    i += 1;
                    if depth == 0 {
                        return match at(i) {
                            None => Ok((dims, elems)),
                            Some(_) => Err(unexpected(i, "end of input")),
                        };
                    }
                    counts[depth - 1] += 1;
                }
                _ => return Err(unexpected(i, "delimiter or '}'")),
            }
        }
    }
}

/// Reads one element starting at `i`, returning it and the index after it.
///
/// Returns `None` on an unterminated quoted element. A bare element stops at
/// a delimiter, `}`, `{` or `"`; the caller rejects the latter two.
fn parse_element(
    chars: &[(usize, char)],
    mut i: usize,
    delimiter: char,
) -> Option<(Option<String>, usize)> {
    let mut out = String::new();
    if chars.get(i).map(|&(_, c)| c) == Some('"') {
        i += 1;
        loop {
            match chars.get(i).map(|&(_, c)| c)? {
                '\\' => {
                    out.push(chars.get(i + 1).map(|&(_, c)| c)?);
                    i += 2;
                }
                '"' => return Some((Some(out), i + 1)),
                c => {
                    out.push(c);
                    i += 1;
                }
            }
        }
    }
    while let Some(&(_, c)) = chars.get(i) {
        if c == delimiter || matches!(c, '}' | '{' | '"') {
            break;
        }
        out.push(c);
        i += 1;
    }
    if out == "NULL" {
        Some((None, i))
    } else {
        Some((Some(out), i))
    }
}

/// Appends `value` as a double-quoted array element.
pub fn append_quoted(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

/// Renders a flat, one-dimensional array from already-encoded elements.
fn join_elements<I>(elements: I, delimiter: char) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut out = String::from("{");
    for (i, e) in elements.into_iter().enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        out.push_str(&e);
    }
    out.push('}');
    out
}

/// Parses one-dimensional array text, rejecting deeper arrays.
fn parse_flat(src: &str, delimiter: char) -> Result<Vec<Option<String>>, ArrayError> {
    let (dims, elems) = parse_array(src, delimiter)?;
    if dims.len() > 1 {
        return Err(ArrayError::Dimensions {
            expected: 1,
            found: dims.len(),
        });
    }
    Ok(elems)
}
