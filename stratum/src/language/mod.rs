//! The dialect compiler: schema and statements to SQL, executed on a connection

pub mod dialect;
pub mod mysql;
pub mod render;

pub use dialect::Dialect;
pub use mysql::MySql;
pub use render::Compiled;

use crate::connection::Connection;
use crate::driver::{Driver, QueryResult};
use crate::Config;
use serde::de::DeserializeOwned;
use stratum_core::{
    AdjacentColumnOr, Column, ConditionJoin, Delete, Error, Insert, Result, Row, Select,
    Statement, Table, Update, Value, Where, AUDIT_COLUMNS,
};
use tracing::{debug, warn};

/// Pick the dialect for a config `type`
pub fn dialect_for(kind: &str) -> Result<Box<dyn Dialect>> {
    match kind.to_ascii_lowercase().as_str() {
        "mysql" => Ok(Box::new(MySql)),
        other => Err(Error::configuration(format!(
            "Unsupported database type '{}'",
            other
        ))),
    }
}

/// Compiles schema objects and statements for one dialect and runs them
pub struct Language<D: Driver> {
    connection: Connection<D>,
    dialect: Box<dyn Dialect>,
    join: Box<dyn ConditionJoin>,
    database: Option<String>,
}

impl<D: Driver> Language<D> {
    pub fn new(connection: Connection<D>, config: &Config) -> Result<Self> {
        let dialect = dialect_for(&config.kind)?;
        Ok(Self {
            connection,
            dialect,
            join: Box::new(AdjacentColumnOr),
            database: Some(config.db.clone()).filter(|db| !db.is_empty()),
        })
    }

    /// Open a connection and build the compiler for it
    pub async fn connect(config: &Config) -> Result<Self> {
        let connection = Connection::open(config).await?;
        Self::new(connection, config)
    }

    /// Replace the strategy that joins consecutive WHERE conditions
    pub fn set_condition_join(&mut self, join: Box<dyn ConditionJoin>) {
        self.join = join;
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn connection(&self) -> &Connection<D> {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection<D> {
        &mut self.connection
    }

    /// Render a statement without running it
    pub fn compile(&self, statement: &Statement) -> Result<Compiled> {
        self.dialect.render(statement, self.join.as_ref())
    }

    pub fn quote(&self, value: &str) -> String {
        self.dialect.quote_literal(value)
    }

    pub fn quote_identifier(&self, identifier: &str) -> String {
        self.dialect.quote_identifier(identifier)
    }

    async fn run(&mut self, compiled: &Compiled) -> Result<QueryResult> {
        debug!(sql = %compiled.sql, params = compiled.params.len(), "Running compiled statement");
        self.connection.run(&compiled.sql, &compiled.params).await
    }

    async fn run_ddl(&mut self, sql: String) -> Result<QueryResult> {
        debug!(dialect = self.dialect.name(), sql = %sql, "Running DDL");
        self.connection.query(&sql).await
    }

    /// CREATE TABLE text for `table`
    pub fn create_sql(&self, table: &Table) -> Result<String> {
        self.dialect.create_table(table)
    }

    pub async fn create(&mut self, table: &Table) -> Result<()> {
        let sql = self.create_sql(table)?;
        self.run_ddl(sql).await?;
        Ok(())
    }

    pub async fn add_column(&mut self, table: &str, column: &Column) -> Result<()> {
        let sql = self.dialect.add_column(table, column)?;
        self.run_ddl(sql).await?;
        Ok(())
    }

    pub async fn drop_table(&mut self, table: &str) -> Result<()> {
        let sql = self.dialect.drop_table(table);
        self.run_ddl(sql).await?;
        Ok(())
    }

    /// Drop every foreign key of `table` in one transaction, then the table itself
    ///
    /// Each constraint is attempted even after an earlier one failed; any failure
    /// rolls the whole batch back and the table is left in place.
    pub async fn drop_table_with_foreign_keys(&mut self, table: &str) -> Result<()> {
        let constraints = self.get_table_constraints(table).await?;
        if !constraints.is_empty() {
            self.revoke_constraints(table, &constraints).await?;
        }
        self.drop_table(table).await
    }

    async fn revoke_constraints(&mut self, table: &str, constraints: &[String]) -> Result<()> {
        self.begin_transaction().await?;
        let mut first_error = None;
        for constraint in constraints {
            let sql = self.dialect.drop_foreign_key(table, constraint);
            if let Err(e) = self.run_ddl(sql).await {
                warn!(table, constraint = %constraint, error = %e, "Failed to drop foreign key");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            None => self.commit().await,
            Some(e) => {
                if let Err(rollback_error) = self.rollback().await {
                    warn!(table, error = %rollback_error, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    pub async fn drop_foreign_key(&mut self, table: &str, constraint: &str) -> Result<()> {
        let sql = self.dialect.drop_foreign_key(table, constraint);
        self.run_ddl(sql).await?;
        Ok(())
    }

    /// Drop all foreign keys of `table`, returning how many were dropped
    pub async fn drop_foreign_keys(&mut self, table: &str) -> Result<usize> {
        let constraints = self.get_table_constraints(table).await?;
        if constraints.is_empty() {
            return Err(Error::invalid_argument(format!(
                "table '{}' has no foreign key constraints",
                table
            )));
        }
        self.revoke_constraints(table, &constraints).await?;
        Ok(constraints.len())
    }

    /// Insert rows in one statement
    ///
    /// Columns are `saveable` when given. Otherwise they are every column seen
    /// across `rows`, in first-seen order, minus the audit columns, which the
    /// database fills in itself. Rows missing a column insert NULL for it.
    pub async fn insert(
        &mut self,
        table: &str,
        rows: &[Row],
        saveable: Option<&[String]>,
    ) -> Result<QueryResult> {
        if rows.is_empty() {
            return Err(Error::invalid_argument(format!(
                "nothing to insert into '{}'",
                table
            )));
        }
        let columns = match saveable {
            Some(columns) => columns.to_vec(),
            None => {
                let mut columns: Vec<String> = Vec::new();
                for column in rows.iter().flat_map(|row| row.columns()) {
                    if !AUDIT_COLUMNS.contains(&column.as_str()) && !columns.contains(column) {
                        columns.push(column.clone());
                    }
                }
                columns
            }
        };
        let statement = Statement::Insert(Insert::from_rows(table, columns, rows));
        let compiled = self.compile(&statement)?;
        self.run(&compiled).await
    }

    /// Update rows matching `conditions`; refuses to run without conditions
    pub async fn update(&mut self, table: &str, data: &Row, conditions: &[Where]) -> Result<u64> {
        let statement = Statement::Update(Update {
            table: table.to_string(),
            assignments: data
                .iter()
                .map(|(column, value)| (column.to_string(), value.clone()))
                .collect(),
            conditions: conditions.to_vec(),
        });
        let compiled = self.compile(&statement)?;
        Ok(self.run(&compiled).await?.rows_affected)
    }

    /// Delete rows matching `conditions`; refuses to run without conditions
    pub async fn delete_rows(&mut self, table: &str, conditions: &[Where]) -> Result<u64> {
        let statement = Statement::Delete(Delete {
            table: table.to_string(),
            conditions: conditions.to_vec(),
        });
        let compiled = self.compile(&statement)?;
        Ok(self.run(&compiled).await?.rows_affected)
    }

    pub async fn get_all_rows(&mut self, select: &Select) -> Result<Vec<Row>> {
        let compiled = self.compile(&Statement::Select(select.clone()))?;
        Ok(self.run(&compiled).await?.rows)
    }

    /// Fetch rows hydrated into `T`
    pub async fn get_all<T: DeserializeOwned>(&mut self, select: &Select) -> Result<Vec<T>> {
        self.get_all_rows(select)
            .await?
            .iter()
            .map(|row| row.deserialize())
            .collect()
    }

    /// Count rows matching the select's conditions
    ///
    /// Grouping, ordering and limits are ignored; the result is the total.
    pub async fn get_count(&mut self, select: &Select) -> Result<u64> {
        let mut counting = select.clone().count();
        counting.order_by.clear();
        counting.group_by.clear();
        counting.limit = None;
        let rows = self.get_all_rows(&counting).await?;
        first_value(&rows)
            .and_then(Value::as_i64)
            .map(|count| count.max(0) as u64)
            .ok_or_else(|| Error::driver(None, format!("COUNT on '{}' returned no number", select.table)))
    }

    pub async fn truncate(&mut self, table: &str) -> Result<()> {
        let sql = self.dialect.truncate(table);
        self.run_ddl(sql).await?;
        Ok(())
    }

    pub async fn create_database(&mut self, name: &str) -> Result<()> {
        let sql = self.dialect.create_database(name);
        self.run_ddl(sql).await?;
        Ok(())
    }

    pub async fn drop_database(&mut self, name: &str) -> Result<()> {
        let sql = self.dialect.drop_database(name);
        self.run_ddl(sql).await?;
        Ok(())
    }

    pub async fn has_table(&mut self, table: &str) -> Result<bool> {
        let compiled = self.dialect.has_table_query(self.database.as_deref(), table);
        let rows = self.run(&compiled).await?.rows;
        Ok(first_value(&rows).and_then(Value::as_i64).unwrap_or(0) > 0)
    }

    pub async fn get_table_primary_keys(&mut self, table: &str) -> Result<Vec<String>> {
        let compiled = self.dialect.primary_keys_query(self.database.as_deref(), table);
        let rows = self.run(&compiled).await?.rows;
        Ok(first_column_strings(&rows))
    }

    /// Names of the foreign key constraints on `table`
    pub async fn get_table_constraints(&mut self, table: &str) -> Result<Vec<String>> {
        let compiled = self.dialect.constraints_query(self.database.as_deref(), table);
        let rows = self.run(&compiled).await?.rows;
        Ok(first_column_strings(&rows))
    }

    pub async fn begin_transaction(&mut self) -> Result<()> {
        self.connection.begin().await
    }

    pub async fn commit(&mut self) -> Result<()> {
        self.connection.commit().await
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.connection.rollback().await
    }
}

fn first_value(rows: &[Row]) -> Option<&Value> {
    rows.first().and_then(|row| row.values().first())
}

fn first_column_strings(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.values().first())
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect()
}

impl<D: Driver> std::fmt::Debug for Language<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language")
            .field("dialect", &self.dialect.name())
            .field("join", &self.join)
            .field("database", &self.database)
            .field("connection", &self.connection)
            .finish()
    }
}
