//! One-dimensional arrays of a fixed element type.

use super::{append_quoted, encode_bytea, join_elements, parse_bytea, parse_flat, ArrayError};

macro_rules! typed_array {
    ($(#[$meta:meta])* $name:ident, $elem:ty, $encode:expr, $decode:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name(pub Vec<$elem>);

        impl $name {
            /// Renders the array text form.
            #[must_use]
            pub fn encode(&self) -> String {
                join_elements(self.0.iter().map($encode), ',')
            }

            /// Decodes array text.
            ///
            /// # Errors
            ///
            /// NULL elements, nested arrays and unparsable elements are rejected.
            pub fn decode(src: &str) -> Result<Self, ArrayError> {
                let decode_one: fn(&str) -> Result<$elem, String> = $decode;
                parse_flat(src, ',')?
                    .into_iter()
                    .enumerate()
                    .map(|(index, elem)| {
                        let elem = elem.ok_or(ArrayError::NullElement(index))?;
                        decode_one(&elem).map_err(|reason| ArrayError::Element { index, reason })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Self)
            }

            /// Returns the elements.
            #[must_use]
            pub fn into_inner(self) -> Vec<$elem> {
                self.0
            }
        }

        impl From<Vec<$elem>> for $name {
            fn from(value: Vec<$elem>) -> Self {
                Self(value)
            }
        }

        impl std::ops::Deref for $name {
            type Target = [$elem];

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

typed_array!(
    /// Array of `bool`, encoded as `t`/`f`.
    BoolArray,
    bool,
    |b: &bool| String::from(if *b { "t" } else { "f" }),
    |s| match s {
        "t" => Ok(true),
        "f" => Ok(false),
        other => Err(format!("could not parse boolean {other:?}")),
    }
);

typed_array!(
    /// Array of `int4`.
    Int32Array,
    i32,
    |n: &i32| n.to_string(),
    |s| s.parse().map_err(|e: std::num::ParseIntError| e.to_string())
);

typed_array!(
    /// Array of `int8`.
    Int64Array,
    i64,
    |n: &i64| n.to_string(),
    |s| s.parse().map_err(|e: std::num::ParseIntError| e.to_string())
);

typed_array!(
    /// Array of `float4`.
    Float32Array,
    f32,
    |f: &f32| float_text(f64::from(*f), f.to_string()),
    |s| s.parse().map_err(|e: std::num::ParseFloatError| e.to_string())
);

typed_array!(
    /// Array of `float8`.
    Float64Array,
    f64,
    |f: &f64| float_text(*f, f.to_string()),
    |s| s.parse().map_err(|e: std::num::ParseFloatError| e.to_string())
);

typed_array!(
    /// Array of text. Every element is quoted on encode.
    StringArray,
    String,
    |s: &String| {
        let mut out = String::new();
        append_quoted(&mut out, s);
        out
    },
    |s| Ok(s.to_string())
);

typed_array!(
    /// Array of `bytea`. Elements are encoded in the hex form.
    ByteaArray,
    Vec<u8>,
    |b: &Vec<u8>| {
        let mut out = String::new();
        append_quoted(&mut out, &encode_bytea(b));
        out
    },
    |s| parse_bytea(s.as_bytes()).map_err(|e| e.to_string())
);

/// Spells non-finite floats the way the server does.
fn float_text(value: f64, shortest: String) -> String {
    if value.is_nan() {
        String::from("NaN")
    } else if value.is_infinite() {
        String::from(if value > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        shortest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_array() {
        let a = BoolArray(vec![true, false, true]);
        assert_eq!(a.encode(), "{t,f,t}");
        assert_eq!(BoolArray::decode("{t,f,t}").unwrap(), a);
        assert!(BoolArray::decode("{t,x}").is_err());
    }

    #[test]
    fn test_int_arrays() {
        assert_eq!(Int64Array(vec![1, -2, 3]).encode(), "{1,-2,3}");
        assert_eq!(Int32Array::decode("{}").unwrap(), Int32Array::default());
        assert_eq!(
            Int64Array::decode("{9223372036854775807}").unwrap().into_inner(),
            vec![i64::MAX]
        );
        assert!(matches!(
            Int32Array::decode("{1,abc}"),
            Err(ArrayError::Element { index: 1, .. })
        ));
    }

    #[test]
    fn test_float_arrays() {
        assert_eq!(Float64Array(vec![1.0, 2.5, -0.125]).encode(), "{1,2.5,-0.125}");
        assert_eq!(Float32Array(vec![0.1]).encode(), "{0.1}");
        assert_eq!(
            Float64Array(vec![f64::INFINITY, f64::NEG_INFINITY]).encode(),
            "{Infinity,-Infinity}"
        );
        let decoded = Float64Array::decode("{Infinity,NaN,3.25}").unwrap();
        assert_eq!(decoded[0], f64::INFINITY);
        assert!(decoded[1].is_nan());
        assert_eq!(decoded[2], 3.25);
    }

    #[test]
    fn test_string_array() {
        let a = StringArray(vec![
            String::from("plain"),
            String::from("with,comma"),
            String::from("q\"uote"),
            String::from("NULL"),
            String::new(),
        ]);
        let text = a.encode();
        assert_eq!(text, r#"{"plain","with,comma","q\"uote","NULL",""}"#);
        assert_eq!(StringArray::decode(&text).unwrap(), a);
    }

    #[test]
    fn test_bytea_array() {
        let a = ByteaArray(vec![vec![0xde, 0xad], Vec::new()]);
        let text = a.encode();
        assert_eq!(text, r#"{"\\xdead","\\x"}"#);
        assert_eq!(ByteaArray::decode(&text).unwrap(), a);
    }

    #[test]
    fn test_null_element_rejected() {
        assert_eq!(
            StringArray::decode("{a,NULL}"),
            Err(ArrayError::NullElement(1))
        );
    }

    #[test]
    fn test_multidimensional_rejected() {
        assert_eq!(
            Int64Array::decode("{{1,2},{3,4}}"),
            Err(ArrayError::Dimensions {
                expected: 1,
                found: 2
            })
        );
    }
}
