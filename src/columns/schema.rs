//! Column schema resolution.

use crate::error::SinkError;

use super::options::{ColumnOptions, ColumnRole, LEVEL_TEXT_MAX_LENGTH, ValueKind};

/// One resolved column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name as written into statements.
    pub name: String,
    /// Semantic role.
    pub role: ColumnRole,
    /// Storage kind.
    pub kind: ValueKind,
    /// Whether null is acceptable.
    pub nullable: bool,
    /// Maximum text length; `None` means unbounded.
    pub max_length: Option<usize>,
}

impl ColumnDescriptor {
    fn standard(options: &ColumnOptions, role: ColumnRole) -> Self {
        let (kind, nullable, max_length) = match role {
            ColumnRole::Id => (ValueKind::Int, false, None),
            ColumnRole::Level if options.level.store_as_enum => (ValueKind::SmallInt, false, None),
            ColumnRole::Level => (ValueKind::Text, false, Some(LEVEL_TEXT_MAX_LENGTH)),
            ColumnRole::Timestamp => (ValueKind::Timestamp, false, None),
            ColumnRole::Message
            | ColumnRole::MessageTemplate
            | ColumnRole::Exception
            | ColumnRole::Properties
            | ColumnRole::SerializedEvent
            | ColumnRole::Custom => (ValueKind::Text, true, None),
        };

        Self {
            name: options.column_name(role).to_string(),
            role,
            kind,
            nullable,
            max_length,
        }
    }
}

/// Ordered, immutable column layout shared by every flush of a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: Vec<ColumnDescriptor>,
    id_literal: Option<String>,
}

impl ColumnSchema {
    /// Resolve column options into a schema.
    ///
    /// The Id column is kept only when `id_function` names the datastore
    /// function or sequence that generates it; its value is never bound.
    /// Duplicate names (compared case-insensitively) are rejected.
    pub fn resolve(options: &ColumnOptions, id_function: Option<&str>) -> Result<Self, SinkError> {
        let id_function = id_function.map(str::trim).filter(|f| !f.is_empty());
        let mut columns = Vec::with_capacity(options.store.len() + options.additional.len());

        for (i, role) in options.store.iter().enumerate() {
            if *role == ColumnRole::Custom {
                return Err(SinkError::config(
                    "role 'Custom' cannot be stored directly, declare an additional column instead",
                ));
            }
            if options.store[..i].contains(role) {
                return Err(SinkError::config(format!("column role '{role}' listed twice")));
            }
            if *role == ColumnRole::Id && id_function.is_none() {
                tracing::debug!("no id function configured, Id column left to the datastore");
                continue;
            }
            columns.push(ColumnDescriptor::standard(options, *role));
        }

        for extra in &options.additional {
            columns.push(ColumnDescriptor {
                name: extra.name.trim().to_string(),
                role: ColumnRole::Custom,
                kind: extra.kind,
                nullable: extra.nullable,
                max_length: extra.max_length,
            });
        }

        let id_literal = id_function
            .filter(|_| columns.iter().any(|c| c.role == ColumnRole::Id))
            .map(str::to_string);
        Self::from_descriptors(columns, id_literal)
    }

    /// Build a schema from explicit descriptors.
    ///
    /// An Id descriptor requires `id_literal`, the token inserted in its place.
    pub fn from_descriptors(
        columns: Vec<ColumnDescriptor>,
        id_literal: Option<String>,
    ) -> Result<Self, SinkError> {
        for (i, column) in columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return Err(SinkError::config(format!(
                    "column {i} ({}) has an empty name",
                    column.role
                )));
            }
            if let Some(prev) = columns[..i]
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(&column.name))
            {
                return Err(SinkError::config(format!(
                    "duplicate column name '{}' ({} and {})",
                    column.name, prev.role, column.role
                )));
            }
        }

        let id_count = columns.iter().filter(|c| c.role == ColumnRole::Id).count();
        if id_count > 1 {
            return Err(SinkError::config("more than one Id column"));
        }
        if id_count == 1 && id_literal.is_none() {
            return Err(SinkError::config("Id column requires a generating function"));
        }
        if id_count == columns.len() {
            return Err(SinkError::config("no columns to insert"));
        }

        Ok(Self {
            columns,
            id_literal: if id_count == 1 { id_literal } else { None },
        })
    }

    /// All columns in statement order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Columns that take a bound value, in statement order.
    pub fn bound_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.role != ColumnRole::Id)
    }

    /// Number of bound columns, i.e. the width of a [`Row`](super::Row).
    pub fn bound_len(&self) -> usize {
        self.bound_columns().count()
    }

    /// Literal token inserted for the Id column, if one is present.
    pub fn id_literal(&self) -> Option<&str> {
        self.id_literal.as_deref()
    }

    /// Names of the additional (custom) columns.
    pub fn additional_names(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.role == ColumnRole::Custom)
            .map(|c| c.name.as_str())
    }
}
