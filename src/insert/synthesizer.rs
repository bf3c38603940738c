//! Statement synthesis for a fixed table and schema.

use crate::columns::{ColumnRole, ColumnSchema, Row};
use crate::error::SinkError;

use super::plan::{BindMode, InsertPlan};
use super::{array_bind, multi_row};

/// Where a column's value comes from in the statement.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Slot {
    /// Emitted verbatim, never bound.
    Literal(String),
    /// Bound from the row value at `index`.
    Bound { base: String, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct StatementColumn {
    pub(super) slot: Slot,
}

impl StatementColumn {
    pub(super) fn is_bound(&self) -> bool {
        matches!(self.slot, Slot::Bound { .. })
    }
}

/// Builds insert plans for one table layout.
#[derive(Debug, Clone)]
pub struct InsertSynthesizer {
    table: String,
    mode: BindMode,
    columns: Vec<StatementColumn>,
    column_list: String,
    width: usize,
    array_statement: Option<String>,
}

impl InsertSynthesizer {
    /// Prepare statement pieces for `table` laid out by `schema`.
    ///
    /// # Errors
    /// Returns [`SinkError::Configuration`] for a blank table name or when two
    /// column names map to the same placeholder.
    pub fn new(table: &str, schema: &ColumnSchema, mode: BindMode) -> Result<Self, SinkError> {
        let table = table.trim();
        if table.is_empty() {
            return Err(SinkError::config("table name must not be empty"));
        }

        let mut columns = Vec::with_capacity(schema.columns().len());
        let mut quoted = Vec::with_capacity(schema.columns().len());
        let mut bases: Vec<String> = Vec::new();
        let mut index = 0;

        for descriptor in schema.columns() {
            quoted.push(quote_identifier(&descriptor.name));
            let slot = if descriptor.role == ColumnRole::Id {
                let literal = schema
                    .id_literal()
                    .ok_or_else(|| SinkError::config("Id column without generating function"))?;
                Slot::Literal(literal.to_string())
            } else {
                let base = placeholder_base(&descriptor.name);
                if bases.iter().any(|b| b.eq_ignore_ascii_case(&base)) {
                    return Err(SinkError::config(format!(
                        "column '{}' collides with another column's placeholder ':{base}'",
                        descriptor.name
                    )));
                }
                bases.push(base.clone());
                index += 1;
                Slot::Bound {
                    base,
                    index: index - 1,
                }
            };
            columns.push(StatementColumn { slot });
        }

        let column_list = quoted.join(", ");
        let array_statement = (mode == BindMode::ArrayBind)
            .then(|| array_bind::statement(table, &columns, &column_list));

        Ok(Self {
            table: table.to_string(),
            mode,
            columns,
            column_list,
            width: index,
            array_statement,
        })
    }

    /// Configured statement shape.
    pub fn mode(&self) -> BindMode {
        self.mode
    }

    /// Build the plan for `rows`, keeping their order.
    ///
    /// # Errors
    /// Returns [`SinkError::EmptyBatch`] for zero rows, and
    /// [`SinkError::SchemaViolation`] for a row of the wrong width.
    pub fn synthesize(&self, rows: &[Row]) -> Result<InsertPlan, SinkError> {
        if rows.is_empty() {
            return Err(SinkError::EmptyBatch);
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != self.width) {
            return Err(SinkError::SchemaViolation {
                column: "*".to_string(),
                reason: format!("row {i} has {} values, expected {}", row.len(), self.width),
            });
        }

        let (sql, params) = match (self.mode, &self.array_statement) {
            (BindMode::ArrayBind, Some(statement)) => {
                (statement.clone(), array_bind::build(&self.columns, rows))
            }
            _ => multi_row::build(&self.table, &self.columns, &self.column_list, rows),
        };

        Ok(InsertPlan {
            sql,
            params,
            mode: self.mode,
            row_count: rows.len(),
        })
    }
}

/// Double-quote an identifier, doubling embedded quotes.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Placeholder-safe form of a column name.
fn placeholder_base(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{AdditionalColumn, ColumnOptions, SqlValue};
    use crate::insert::ParamValue;

    fn single_column_schema() -> ColumnSchema {
        ColumnSchema::resolve(
            &ColumnOptions::custom_only(vec![AdditionalColumn::text("myColumnName")]),
            None,
        )
        .unwrap()
    }

    fn data_rows(n: usize) -> Vec<Row> {
        (0..n).map(|_| Row::from(vec![SqlValue::from("data")])).collect()
    }

    fn two_column_schema(id_function: Option<&str>) -> ColumnSchema {
        let mut options = ColumnOptions::custom_only(vec![
            AdditionalColumn::text("A"),
            AdditionalColumn::text("B"),
        ]);
        options.store = vec![crate::columns::ColumnRole::Id];
        ColumnSchema::resolve(&options, id_function).unwrap()
    }

    #[test]
    fn test_single_row_golden() {
        let synth = InsertSynthesizer::new("myTableName", &single_column_schema(), BindMode::MultiRow)
            .unwrap();
        let plan = synth.synthesize(&data_rows(1)).unwrap();
        assert_eq!(
            plan.sql,
            "INSERT ALL \n  INTO myTableName (\"myColumnName\") VALUES (:myColumnName_0)\nSELECT * FROM dual\n"
        );
        assert_eq!(plan.params.len(), 1);
        assert_eq!(
            plan.params.get(":myColumnName_0"),
            Some(&ParamValue::Scalar(SqlValue::from("data")))
        );
        assert_eq!(plan.row_count, 1);
    }

    #[test]
    fn test_two_rows_golden() {
        let synth = InsertSynthesizer::new("myTableName", &single_column_schema(), BindMode::MultiRow)
            .unwrap();
        let plan = synth.synthesize(&data_rows(2)).unwrap();
        assert_eq!(
            plan.sql,
            "INSERT ALL \n\
             \x20 INTO myTableName (\"myColumnName\") VALUES (:myColumnName_0)\n\
             \x20 INTO myTableName (\"myColumnName\") VALUES (:myColumnName_1)\n\
             SELECT * FROM dual\n"
        );
        assert_eq!(
            plan.params.names().collect::<Vec<_>>(),
            vec![":myColumnName_0", ":myColumnName_1"]
        );
    }

    #[test]
    fn test_into_clause_count_and_suffixes_follow_batch_order() {
        let synth = InsertSynthesizer::new("LOG", &single_column_schema(), BindMode::MultiRow).unwrap();
        let rows: Vec<Row> = (0..5)
            .map(|i| Row::from(vec![SqlValue::Text(format!("event {i}"))]))
            .collect();
        let plan = synth.synthesize(&rows).unwrap();
        assert_eq!(plan.sql.matches("  INTO ").count(), 5);
        for i in 0..5 {
            assert_eq!(
                plan.params.get(&format!(":myColumnName_{i}")),
                Some(&ParamValue::Scalar(SqlValue::Text(format!("event {i}"))))
            );
        }
        assert!(plan.sql.ends_with("SELECT * FROM dual\n"));
    }

    #[test]
    fn test_id_literal_is_not_parameterized() {
        let schema = two_column_schema(Some("LOG_SEQ.NEXTVAL"));
        let synth = InsertSynthesizer::new("APP.LOG", &schema, BindMode::MultiRow).unwrap();
        let rows = vec![Row::from(vec![SqlValue::from("a"), SqlValue::Int(1)])];
        let plan = synth.synthesize(&rows).unwrap();
        assert_eq!(
            plan.sql,
            "INSERT ALL \n  INTO APP.LOG (\"Id\", \"A\", \"B\") VALUES (LOG_SEQ.NEXTVAL, :A_0, :B_0)\nSELECT * FROM dual\n"
        );
        assert_eq!(plan.params.len(), 2);
    }

    #[test]
    fn test_without_id_column() {
        let schema = two_column_schema(None);
        let synth = InsertSynthesizer::new("LOG", &schema, BindMode::MultiRow).unwrap();
        let rows = vec![Row::from(vec![SqlValue::from("a"), SqlValue::Null])];
        let plan = synth.synthesize(&rows).unwrap();
        assert!(plan.sql.contains("(\"A\", \"B\") VALUES (:A_0, :B_0)"));
        assert_eq!(plan.params.get(":B_0"), Some(&ParamValue::Scalar(SqlValue::Null)));
    }

    #[test]
    fn test_array_bind_statement_and_params() {
        let schema = two_column_schema(Some("get_id()"));
        let synth = InsertSynthesizer::new("LOG", &schema, BindMode::ArrayBind).unwrap();
        let rows = vec![
            Row::from(vec![SqlValue::from("a0"), SqlValue::Int(0)]),
            Row::from(vec![SqlValue::from("a1"), SqlValue::Int(1)]),
            Row::from(vec![SqlValue::from("a2"), SqlValue::Int(2)]),
        ];
        let plan = synth.synthesize(&rows).unwrap();
        assert_eq!(
            plan.sql,
            "INSERT INTO LOG \n       (\"Id\", \"A\", \"B\") \nVALUES (get_id(), :v_A, :v_B) \n"
        );
        assert_eq!(plan.mode, BindMode::ArrayBind);
        assert_eq!(plan.row_count, 3);
        assert_eq!(
            plan.params.get(":v_B"),
            Some(&ParamValue::Array(vec![SqlValue::Int(0), SqlValue::Int(1), SqlValue::Int(2)]))
        );
    }

    #[test]
    fn test_modes_agree_on_columns_and_value_count() {
        let schema = two_column_schema(Some("seq.nextval"));
        let rows: Vec<Row> = (0..4)
            .map(|i| Row::from(vec![SqlValue::Int(i), SqlValue::Text(i.to_string())]))
            .collect();
        let multi = InsertSynthesizer::new("LOG", &schema, BindMode::MultiRow)
            .unwrap()
            .synthesize(&rows)
            .unwrap();
        let array = InsertSynthesizer::new("LOG", &schema, BindMode::ArrayBind)
            .unwrap()
            .synthesize(&rows)
            .unwrap();

        let column_list = "(\"Id\", \"A\", \"B\")";
        assert!(multi.sql.contains(column_list));
        assert!(array.sql.contains(column_list));
        assert_eq!(multi.params.scalar_count(), array.params.scalar_count());
        assert_eq!(multi.params.scalar_count(), 8);
    }

    #[test]
    fn test_empty_batch_is_refused() {
        let synth = InsertSynthesizer::new("LOG", &single_column_schema(), BindMode::MultiRow).unwrap();
        assert!(matches!(synth.synthesize(&[]), Err(SinkError::EmptyBatch)));
    }

    #[test]
    fn test_row_width_mismatch() {
        let synth = InsertSynthesizer::new("LOG", &single_column_schema(), BindMode::MultiRow).unwrap();
        let rows = vec![Row::from(vec![SqlValue::Null, SqlValue::Null])];
        assert!(matches!(
            synth.synthesize(&rows),
            Err(SinkError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn test_identifiers_quoted_and_placeholders_sanitized() {
        let schema = ColumnSchema::resolve(
            &ColumnOptions::custom_only(vec![AdditionalColumn::text("user \"name\"")]),
            None,
        )
        .unwrap();
        let plan = InsertSynthesizer::new("LOG", &schema, BindMode::MultiRow)
            .unwrap()
            .synthesize(&[Row::from(vec![SqlValue::from("x")])])
            .unwrap();
        assert!(plan.sql.contains("(\"user \"\"name\"\"\") VALUES (:user__name__0)"));
    }

    #[test]
    fn test_placeholder_collision_is_rejected() {
        let schema = ColumnSchema::resolve(
            &ColumnOptions::custom_only(vec![
                AdditionalColumn::text("a b"),
                AdditionalColumn::text("a_b"),
            ]),
            None,
        )
        .unwrap();
        assert!(matches!(
            InsertSynthesizer::new("LOG", &schema, BindMode::MultiRow),
            Err(SinkError::Configuration(_))
        ));
    }

    #[test]
    fn test_blank_table_is_rejected() {
        assert!(InsertSynthesizer::new(" ", &single_column_schema(), BindMode::MultiRow).is_err());
    }

    #[test]
    fn test_statement_is_stable() {
        let synth = InsertSynthesizer::new("LOG", &single_column_schema(), BindMode::MultiRow).unwrap();
        assert_eq!(
            synth.synthesize(&data_rows(3)).unwrap(),
            synth.synthesize(&data_rows(3)).unwrap()
        );
    }
}
