//! Event to row conversion.

use std::sync::Arc;

use crate::error::SinkError;
use crate::event::{FormatOptions, LogEvent, Properties};
use crate::format::{render_event, render_properties};

use super::convert::{SqlValue, convert_scalar};
use super::options::{ColumnOptions, ColumnRole, ValueKind};
use super::schema::{ColumnDescriptor, ColumnSchema};

/// Values for one event, aligned to the schema's bound columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row(Vec<SqlValue>);

impl Row {
    /// Values in bound-column order.
    pub fn values(&self) -> &[SqlValue] {
        &self.0
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the row has no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<SqlValue>> for Row {
    fn from(values: Vec<SqlValue>) -> Self {
        Row(values)
    }
}

/// Rows built from a batch, plus the events that could not be materialized.
#[derive(Debug, Default)]
pub struct MaterializedBatch {
    /// Rows in batch order, rejected events skipped.
    pub rows: Vec<Row>,
    /// Batch position and cause of each rejected event.
    pub rejected: Vec<(usize, SinkError)>,
}

/// Builds rows for a fixed schema.
#[derive(Debug, Clone)]
pub struct RowMaterializer {
    schema: Arc<ColumnSchema>,
    options: ColumnOptions,
    format: FormatOptions,
}

impl RowMaterializer {
    /// Create a materializer for `schema`, using the per-role settings in
    /// `options` and message formatting rules in `format`.
    pub fn new(schema: Arc<ColumnSchema>, options: ColumnOptions, format: FormatOptions) -> Self {
        Self {
            schema,
            options,
            format,
        }
    }

    /// The schema rows are aligned to.
    pub fn schema(&self) -> &Arc<ColumnSchema> {
        &self.schema
    }

    /// Materialize every event of a batch, keeping batch order.
    pub fn materialize_batch(&self, events: &[LogEvent]) -> MaterializedBatch {
        let mut batch = MaterializedBatch {
            rows: Vec::with_capacity(events.len()),
            rejected: Vec::new(),
        };
        for (i, event) in events.iter().enumerate() {
            match self.materialize(event) {
                Ok(row) => batch.rows.push(row),
                Err(e) => batch.rejected.push((i, e)),
            }
        }
        batch
    }

    /// Materialize one event.
    ///
    /// # Errors
    /// Returns [`SinkError::SchemaViolation`] when a NOT NULL column has no value.
    pub fn materialize(&self, event: &LogEvent) -> Result<Row, SinkError> {
        let mut values = Vec::with_capacity(self.schema.bound_len());
        for column in self.schema.bound_columns() {
            let value = truncate(self.derive(column, event)?, column.max_length);
            if value.is_null() && !column.nullable {
                return Err(SinkError::SchemaViolation {
                    column: column.name.clone(),
                    reason: "no value for NOT NULL column".to_string(),
                });
            }
            values.push(value);
        }
        Ok(Row(values))
    }

    fn derive(&self, column: &ColumnDescriptor, event: &LogEvent) -> Result<SqlValue, SinkError> {
        let value = match column.role {
            ColumnRole::Message => SqlValue::Text(event.render_message(&self.format)),
            ColumnRole::MessageTemplate => SqlValue::Text(event.message_template.clone()),
            ColumnRole::Level if column.kind == ValueKind::SmallInt => {
                SqlValue::Int(i64::from(event.level.code()))
            }
            ColumnRole::Level => SqlValue::Text(event.level.to_string()),
            ColumnRole::Timestamp if self.options.timestamp.convert_to_utc => {
                SqlValue::Timestamp(event.timestamp.naive_utc())
            }
            ColumnRole::Timestamp => SqlValue::Timestamp(event.timestamp.naive_local()),
            ColumnRole::Exception => event
                .exception
                .as_ref()
                .map_or(SqlValue::Null, |e| SqlValue::Text(e.clone())),
            ColumnRole::Properties => {
                let properties = self.properties_for(
                    event,
                    self.options.properties.exclude_additional_properties,
                );
                SqlValue::Text(render_properties(
                    &properties,
                    &self.options.properties.xml,
                    self.format.max_depth,
                ))
            }
            ColumnRole::SerializedEvent => {
                let properties =
                    self.properties_for(event, self.options.log_event.exclude_additional_properties);
                match render_event(
                    event,
                    &properties,
                    &self.format,
                    self.options.log_event.render_message,
                ) {
                    Ok(json) => SqlValue::Text(json),
                    Err(e) => {
                        tracing::warn!(error = %e, column = %column.name, "failed to serialize event");
                        SqlValue::Null
                    }
                }
            }
            ColumnRole::Custom => self.custom_value(column, event)?,
            ColumnRole::Id => SqlValue::Null,
        };
        Ok(value)
    }

    fn custom_value(&self, column: &ColumnDescriptor, event: &LogEvent) -> Result<SqlValue, SinkError> {
        let Some(property) = event.properties.get_ignore_case(&column.name) else {
            return Ok(SqlValue::Null);
        };

        match property.as_scalar() {
            Some(scalar) if scalar.is_null() => Ok(SqlValue::Null),
            Some(scalar) => Ok(convert_scalar(scalar, column.kind).unwrap_or_else(|e| {
                tracing::debug!(column = %column.name, error = %e, "falling back to text");
                SqlValue::Text(scalar.to_string())
            })),
            None => Ok(SqlValue::Text(property.to_string())),
        }
    }

    fn properties_for(&self, event: &LogEvent, exclude_additional: bool) -> Properties {
        if !exclude_additional {
            return event.properties.clone();
        }
        event.properties.without(|name| {
            self.schema
                .additional_names()
                .any(|column| column.eq_ignore_ascii_case(name))
        })
    }
}

fn truncate(value: SqlValue, max_length: Option<usize>) -> SqlValue {
    match (value, max_length) {
        (SqlValue::Text(text), Some(max)) if text.chars().count() > max => {
            SqlValue::Text(text.chars().take(max).collect())
        }
        (value, _) => value,
    }
}
