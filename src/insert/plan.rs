//! Insert plans and parameters.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::columns::SqlValue;

/// Statement shape used for a flush.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BindMode {
    /// `INSERT ALL ... SELECT * FROM dual`, one placeholder per value.
    #[default]
    MultiRow,
    /// Single-row statement bound once with per-column arrays.
    ArrayBind,
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// One value (multi-row mode).
    Scalar(SqlValue),
    /// One value per row (array-bind mode).
    Array(Vec<SqlValue>),
}

impl ParamValue {
    /// Number of scalar values carried.
    pub fn scalar_count(&self) -> usize {
        match self {
            ParamValue::Scalar(_) => 1,
            ParamValue::Array(values) => values.len(),
        }
    }
}

/// Ordered parameter mapping, keyed by placeholder token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(Vec<(String, ParamValue)>);

impl Parameters {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub(crate) fn push(&mut self, name: String, value: ParamValue) {
        self.0.push((name, value));
    }

    /// Value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Placeholder tokens in statement order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    /// Entries in statement order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total scalar values across all parameters.
    pub fn scalar_count(&self) -> usize {
        self.0.iter().map(|(_, v)| v.scalar_count()).sum()
    }
}

/// A statement ready for execution.
///
/// Row suffixes (`:User_0`, `:User_1`, ...) and array positions index the
/// rows that survived materialization, in batch order. Rejected events are
/// skipped, so after a rejection a suffix no longer matches the event's
/// position in the batch; rejections are reported by batch position.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    /// Statement text.
    pub sql: String,
    /// Named parameters.
    pub params: Parameters,
    /// Shape of the statement.
    pub mode: BindMode,
    /// Rows inserted; the array-bind count in [`BindMode::ArrayBind`].
    pub row_count: usize,
}
