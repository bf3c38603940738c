//! Single-row statements bound with column arrays.

use std::fmt::Write as _;

use crate::columns::{Row, SqlValue};

use super::plan::{ParamValue, Parameters};
use super::synthesizer::{Slot, StatementColumn};

/// Statement text; independent of the batch, so built once.
pub(super) fn statement(table: &str, columns: &[StatementColumn], column_list: &str) -> String {
    let values = columns
        .iter()
        .map(|column| match &column.slot {
            Slot::Literal(literal) => literal.clone(),
            Slot::Bound { base, .. } => placeholder(base),
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = String::new();
    let _ = write!(
        sql,
        "INSERT INTO {table} \n       ({column_list}) \nVALUES ({values}) \n"
    );
    sql
}

/// One array parameter per bound column, values in row order.
pub(super) fn build(columns: &[StatementColumn], rows: &[Row]) -> Parameters {
    let mut params = Parameters::with_capacity(columns.len());
    for column in columns {
        if let Slot::Bound { base, index } = &column.slot {
            let values = rows
                .iter()
                .map(|row| row.values().get(*index).cloned().unwrap_or(SqlValue::Null))
                .collect();
            params.push(placeholder(base), ParamValue::Array(values));
        }
    }
    params
}

fn placeholder(base: &str) -> String {
    format!(":v_{base}")
}
