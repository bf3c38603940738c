//! Bindable values and scalar coercion.

use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;

use super::options::ValueKind;
use crate::event::Scalar;

/// A value ready to be bound to a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Double precision float.
    Float(f64),
    /// Character data.
    Text(String),
    /// Timestamp without zone.
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    /// Whether this is [`SqlValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(x) => write!(f, "{x}"),
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            SqlValue::Timestamp(ts) => write!(f, "TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

/// A scalar could not be coerced to a column's declared kind.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {value:?} to {kind}")]
pub struct ConversionError {
    /// Source value.
    pub value: Scalar,
    /// Requested kind.
    pub kind: ValueKind,
}

/// Coerce a non-null scalar to `kind`.
///
/// Integral floats and numeric strings convert to integers, `true`/`false`
/// strings to booleans, RFC 3339 strings to timestamps. Anything converts
/// to text.
pub fn convert_scalar(scalar: &Scalar, kind: ValueKind) -> Result<SqlValue, ConversionError> {
    let converted = match kind {
        ValueKind::Text => Some(SqlValue::Text(scalar.to_string())),
        ValueKind::Int => to_int(scalar).map(SqlValue::Int),
        ValueKind::SmallInt => to_int(scalar)
            .filter(|i| i16::try_from(*i).is_ok())
            .map(SqlValue::Int),
        ValueKind::Float => to_float(scalar).map(SqlValue::Float),
        ValueKind::Bool => to_bool(scalar).map(SqlValue::Bool),
        ValueKind::Timestamp => to_timestamp(scalar).map(SqlValue::Timestamp),
    };

    converted.ok_or_else(|| ConversionError {
        value: scalar.clone(),
        kind,
    })
}

fn to_int(scalar: &Scalar) -> Option<i64> {
    match scalar {
        Scalar::Int(i) => Some(*i),
        Scalar::UInt(u) => i64::try_from(*u).ok(),
        Scalar::Float(x) if x.fract() == 0.0 && *x >= i64::MIN as f64 && *x < i64::MAX as f64 => {
            Some(*x as i64)
        }
        Scalar::Bool(b) => Some(i64::from(*b)),
        Scalar::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_float(scalar: &Scalar) -> Option<f64> {
    match scalar {
        Scalar::Float(x) => Some(*x),
        Scalar::Int(i) => Some(*i as f64),
        Scalar::UInt(u) => Some(*u as f64),
        Scalar::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_bool(scalar: &Scalar) -> Option<bool> {
    match scalar {
        Scalar::Bool(b) => Some(*b),
        Scalar::Int(i) => Some(*i != 0),
        Scalar::UInt(u) => Some(*u != 0),
        Scalar::Str(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
        Scalar::Str(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn to_timestamp(scalar: &Scalar) -> Option<NaiveDateTime> {
    match scalar {
        Scalar::Timestamp(ts) => Some(ts.naive_local()),
        Scalar::Str(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|ts| ts.naive_local()),
        _ => None,
    }
}
