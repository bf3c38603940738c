//! Column mapping.
//!
//! - [`ColumnOptions`]: declarative column configuration
//! - [`ColumnSchema`]: the resolved, ordered [`ColumnDescriptor`] list
//! - [`RowMaterializer`]: turns events into [`Row`]s of [`SqlValue`]s

mod convert;
mod materializer;
mod options;
mod schema;

pub use convert::{ConversionError, SqlValue, convert_scalar};
pub use materializer::{MaterializedBatch, Row, RowMaterializer};
pub use options::{
    AdditionalColumn, ColumnOptions, ColumnRole, LevelColumn, LogEventColumn, NamedColumn,
    PropertiesColumn, TimestampColumn, ValueKind,
};
pub use schema::{ColumnDescriptor, ColumnSchema};
