//! N-dimensional arrays over any element type.

use chrono::{DateTime, FixedOffset};

use super::{
    append_quoted, encode_bytea, format_timestamp, parse_array, parse_bytea, parse_timestamp,
    ArrayError,
};

/// An element type usable in a [`GenericArray`].
pub trait ArrayElement: Sized {
    /// Separator between elements, `,` for every built-in type but `box`.
    const DELIMITER: char = ',';

    /// Renders the element, `None` for NULL.
    fn to_element(&self) -> Option<String>;

    /// Decodes one element; `None` is an unquoted NULL.
    ///
    /// # Errors
    ///
    /// Returns the reason the text is not a valid element.
    fn from_element(text: Option<&str>) -> Result<Self, String>;
}

/// One position of an array: an element or a sub-array.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayNode<T> {
    /// A leaf element.
    Item(T),
    /// A sub-array one dimension down.
    Nested(Vec<ArrayNode<T>>),
}

/// An array of any dimension whose elements implement [`ArrayElement`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenericArray<T> {
    /// Top-level positions.
    pub items: Vec<ArrayNode<T>>,
}

impl<T> Default for GenericArray<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: ArrayElement> GenericArray<T> {
    /// Creates a one-dimensional array.
    #[must_use]
    pub fn from_flat(values: Vec<T>) -> Self {
        Self {
            items: values.into_iter().map(ArrayNode::Item).collect(),
        }
    }

    /// Flattens the array in row-major order.
    #[must_use]
    pub fn into_flat(self) -> Vec<T> {
        fn walk<T>(nodes: Vec<ArrayNode<T>>, out: &mut Vec<T>) {
            for node in nodes {
                match node {
                    ArrayNode::Item(v) => out.push(v),
                    ArrayNode::Nested(children) => walk(children, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(self.items, &mut out);
        out
    }

    /// Renders the array text form.
    ///
    /// # Errors
    ///
    /// Returns `ArrayError::Ragged` if sub-arrays differ in shape or are empty.
    pub fn encode(&self) -> Result<String, ArrayError> {
        let mut out = String::new();
        encode_level(&self.items, T::DELIMITER, &mut out)?;
        Ok(out)
    }

    /// Decodes array text of any dimension.
    ///
    /// # Errors
    ///
    /// Returns an `ArrayError` on malformed text or an undecodable element.
    pub fn decode(src: &str) -> Result<Self, ArrayError> {
        let (dims, elems) = parse_array(src, T::DELIMITER)?;
        let mut values = elems
            .into_iter()
            .enumerate()
            .map(|(index, elem)| {
                T::from_element(elem.as_deref())
                    .map_err(|reason| ArrayError::Element { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();
        let items = if dims.is_empty() {
            Vec::new()
        } else {
            build_level(&dims, &mut values)
        };
        Ok(Self { items })
    }
}

/// Writes one bracketed level and returns its shape.
fn encode_level<T: ArrayElement>(
    nodes: &[ArrayNode<T>],
    delimiter: char,
    out: &mut String,
) -> Result<Vec<usize>, ArrayError> {
    out.push('{');
    let mut child_shape: Option<Vec<usize>> = None;
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        let shape = match node {
            ArrayNode::Item(v) => {
                append_element(out, v.to_element().as_deref(), delimiter);
                Vec::new()
            }
            ArrayNode::Nested(children) => {
                if children.is_empty() {
                    return Err(ArrayError::Ragged);
                }
                encode_level(children, delimiter, out)?
            }
        };
        match &child_shape {
            Some(expected) if *expected != shape => return Err(ArrayError::Ragged),
            Some(_) => {}
            None => child_shape = Some(shape),
        }
    }
    out.push('}');
    let mut shape = vec![nodes.len()];
    shape.extend(child_shape.unwrap_or_default());
    Ok(shape)
}

fn build_level<T, I>(dims: &[usize], values: &mut I) -> Vec<ArrayNode<T>>
where
    I: Iterator<Item = T>,
{
    match dims {
        [] => Vec::new(),
        [n] => values.take(*n).map(ArrayNode::Item).collect(),
        [n, rest @ ..] => (0..*n)
            .map(|_| ArrayNode::Nested(build_level(rest, values)))
            .collect(),
    }
}

/// Appends an element, quoting it only when the bare form would be ambiguous.
fn append_element(out: &mut String, text: Option<&str>, delimiter: char) {
    let Some(text) = text else {
        out.push_str("NULL");
        return;
    };
    let needs_quotes = text.is_empty()
        || text.eq_ignore_ascii_case("NULL")
        || text
            .chars()
            .any(|c| c == delimiter || matches!(c, '{' | '}' | '"' | '\\') || c.is_whitespace());
    if needs_quotes {
        append_quoted(out, text);
    } else {
        out.push_str(text);
    }
}

fn required(text: Option<&str>) -> Result<&str, String> {
    text.ok_or_else(|| String::from("unexpected NULL element"))
}

macro_rules! parsed_element {
    ($($t:ty),*) => {
        $(impl ArrayElement for $t {
            fn to_element(&self) -> Option<String> {
                Some(self.to_string())
            }

            fn from_element(text: Option<&str>) -> Result<Self, String> {
                required(text)?.parse().map_err(|e| format!("{e}"))
            }
        })*
    };
}

parsed_element!(i16, i32, i64, f32, f64, String);

impl ArrayElement for bool {
    fn to_element(&self) -> Option<String> {
        Some(String::from(if *self { "t" } else { "f" }))
    }

    fn from_element(text: Option<&str>) -> Result<Self, String> {
        match required(text)? {
            "t" | "true" => Ok(true),
            "f" | "false" => Ok(false),
            other => Err(format!("could not parse boolean {other:?}")),
        }
    }
}

impl ArrayElement for Vec<u8> {
    fn to_element(&self) -> Option<String> {
        Some(encode_bytea(self))
    }

    fn from_element(text: Option<&str>) -> Result<Self, String> {
        parse_bytea(required(text)?.as_bytes()).map_err(|e| e.to_string())
    }
}

impl ArrayElement for DateTime<FixedOffset> {
    fn to_element(&self) -> Option<String> {
        Some(format_timestamp(self))
    }

    fn from_element(text: Option<&str>) -> Result<Self, String> {
        parse_timestamp(required(text)?).map_err(|e| e.to_string())
    }
}

impl<T: ArrayElement> ArrayElement for Option<T> {
    const DELIMITER: char = T::DELIMITER;

    fn to_element(&self) -> Option<String> {
        self.as_ref().and_then(T::to_element)
    }

    fn from_element(text: Option<&str>) -> Result<Self, String> {
        text.map(|t| T::from_element(Some(t))).transpose()
    }
}
