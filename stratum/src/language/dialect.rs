//! The per-dialect half of the compiler

use super::render::{self, Compiled};
use std::fmt::Debug;
use stratum_core::{quote_literal, Column, ConditionJoin, Result, Statement, Table};

/// SQL flavor: identifier quoting, type mapping, DDL text and catalog queries
///
/// DML rendering is shared and driven by [`Dialect::quote_identifier`].
pub trait Dialect: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn quote_identifier(&self, identifier: &str) -> String;

    fn quote_literal(&self, value: &str) -> String {
        quote_literal(value)
    }

    /// Concrete column type, e.g. `varchar(255)` or `int(11) UNSIGNED`
    fn column_type(&self, column: &Column) -> Result<String>;

    /// Full column definition as used in CREATE/ALTER TABLE
    fn column_definition(&self, column: &Column) -> Result<String>;

    fn create_table(&self, table: &Table) -> Result<String>;

    fn add_column(&self, table: &str, column: &Column) -> Result<String>;

    fn drop_table(&self, table: &str) -> String;

    fn drop_foreign_key(&self, table: &str, constraint: &str) -> String;

    fn truncate(&self, table: &str) -> String;

    fn create_database(&self, name: &str) -> String;

    fn drop_database(&self, name: &str) -> String;

    /// Count of tables named `table`; the current database when `database` is `None`
    fn has_table_query(&self, database: Option<&str>, table: &str) -> Compiled;

    /// Primary key column names of `table`, in key order
    fn primary_keys_query(&self, database: Option<&str>, table: &str) -> Compiled;

    /// Foreign key constraint names of `table`
    fn constraints_query(&self, database: Option<&str>, table: &str) -> Compiled;

    /// Render a DML statement with `?` placeholders
    fn render(&self, statement: &Statement, join: &dyn ConditionJoin) -> Result<Compiled> {
        render::render_statement(self, statement, join)
    }
}
