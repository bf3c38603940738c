//! Bulk insert statement synthesis.
//!
//! An [`InsertSynthesizer`] turns a batch of [`Row`](crate::columns::Row)s
//! into one [`InsertPlan`]: statement text plus named parameters.
//!
//! - [`BindMode::MultiRow`]: `INSERT ALL` with one `INTO` clause per row and
//!   a `:column_<row>` placeholder per value
//! - [`BindMode::ArrayBind`]: one single-row statement with a `:v_column`
//!   placeholder per column, each bound to an array of row values

mod array_bind;
mod multi_row;
mod plan;
mod synthesizer;

pub use plan::{BindMode, InsertPlan, ParamValue, Parameters};
pub use synthesizer::InsertSynthesizer;
