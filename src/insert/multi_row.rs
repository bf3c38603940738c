//! `INSERT ALL` statements with per-row placeholders.

use std::fmt::Write as _;

use crate::columns::{Row, SqlValue};

use super::plan::{ParamValue, Parameters};
use super::synthesizer::{Slot, StatementColumn};

/// Build the statement and one parameter per (bound column, row).
pub(super) fn build(
    table: &str,
    columns: &[StatementColumn],
    column_list: &str,
    rows: &[Row],
) -> (String, Parameters) {
    let bound = columns.iter().filter(|c| c.is_bound()).count();
    let mut sql = String::with_capacity(32 + rows.len() * (table.len() + column_list.len() * 2 + 24));
    let mut params = Parameters::with_capacity(rows.len() * bound);

    sql.push_str("INSERT ALL \n");
    for (i, row) in rows.iter().enumerate() {
        let _ = write!(sql, "  INTO {table} ({column_list}) VALUES (");
        for (j, column) in columns.iter().enumerate() {
            if j > 0 {
                sql.push_str(", ");
            }
            match &column.slot {
                Slot::Literal(literal) => sql.push_str(literal),
                Slot::Bound { base, index } => {
                    let name = format!(":{base}_{i}");
                    sql.push_str(&name);
                    let value = row.values().get(*index).cloned().unwrap_or(SqlValue::Null);
                    params.push(name, ParamValue::Scalar(value));
                }
            }
        }
        sql.push_str(")\n");
    }
    sql.push_str("SELECT * FROM dual\n");

    (sql, params)
}
