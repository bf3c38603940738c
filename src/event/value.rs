//! Recursive property values.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};

use super::template::{FormatOptions, write_value};

/// Default nesting limit for rendering property values.
///
/// Values nested deeper than this render as empty.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// A primitive property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer that may not fit in `i64`.
    UInt(u64),
    /// Floating point.
    Float(f64),
    /// Text.
    Str(String),
    /// Point in time with its original offset.
    Timestamp(DateTime<FixedOffset>),
}

impl Scalar {
    /// Whether this is [`Scalar::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

/// Raw text form: strings unquoted, timestamps in RFC 3339.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::UInt(u) => write!(f, "{u}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Str(s) => f.write_str(s),
            Scalar::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
        }
    }
}

/// A structured property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A primitive.
    Scalar(Scalar),
    /// Ordered list of values.
    Sequence(Vec<PropertyValue>),
    /// Ordered key/value pairs.
    Mapping(Vec<(Scalar, PropertyValue)>),
    /// A named record: optional type tag plus ordered fields.
    Structure {
        /// Type name of the captured object, if known.
        type_tag: Option<String>,
        /// Field name/value pairs.
        fields: Vec<(String, PropertyValue)>,
    },
}

impl PropertyValue {
    /// Null scalar.
    pub fn null() -> Self {
        PropertyValue::Scalar(Scalar::Null)
    }

    /// Build a structure value.
    pub fn structure<I, K>(type_tag: Option<&str>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyValue)>,
        K: Into<String>,
    {
        PropertyValue::Structure {
            type_tag: type_tag.map(str::to_string),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// The scalar inside, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

/// Message-style rendering: strings quoted, containers expanded.
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_value(&mut out, self, None, &FormatOptions::default(), 0);
        f.write_str(&out)
    }
}

impl From<Scalar> for PropertyValue {
    fn from(value: Scalar) -> Self {
        PropertyValue::Scalar(value)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(items: Vec<PropertyValue>) -> Self {
        PropertyValue::Sequence(items)
    }
}

macro_rules! scalar_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from($v: $ty) -> Self {
                    $body
                }
            }

            impl From<$ty> for PropertyValue {
                fn from(v: $ty) -> Self {
                    PropertyValue::Scalar(Scalar::from(v))
                }
            }
        )*
    };
}

scalar_from! {
    bool => |v| Scalar::Bool(v),
    i32 => |v| Scalar::Int(i64::from(v)),
    i64 => |v| Scalar::Int(v),
    u32 => |v| Scalar::Int(i64::from(v)),
    u64 => |v| Scalar::UInt(v),
    f64 => |v| Scalar::Float(v),
    &str => |v| Scalar::Str(v.to_string()),
    String => |v| Scalar::Str(v),
    DateTime<FixedOffset> => |v| Scalar::Timestamp(v),
    DateTime<Utc> => |v| Scalar::Timestamp(v.fixed_offset()),
}

/// JSON objects become structures; a `_typeTag` member becomes the type tag.
impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => PropertyValue::null(),
            Value::Bool(b) => b.into(),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.into()
                } else if let Some(u) = n.as_u64() {
                    u.into()
                } else {
                    n.as_f64().map_or_else(PropertyValue::null, PropertyValue::from)
                }
            }
            Value::String(s) => s.into(),
            Value::Array(items) => {
                PropertyValue::Sequence(items.into_iter().map(PropertyValue::from).collect())
            }
            Value::Object(map) => {
                let mut type_tag = None;
                let mut fields = Vec::with_capacity(map.len());
                for (k, v) in map {
                    match (k.as_str(), v) {
                        ("_typeTag", Value::String(tag)) => type_tag = Some(tag),
                        (_, v) => fields.push((k, PropertyValue::from(v))),
                    }
                }
                PropertyValue::Structure { type_tag, fields }
            }
        }
    }
}
