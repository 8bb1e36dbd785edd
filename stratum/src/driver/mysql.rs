//! MySQL driver backed by a single sqlx connection

use crate::driver::{Driver, QueryResult};
use crate::Config;
use futures::TryStreamExt;
use sqlx::mysql::{
    MySql, MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow, MySqlSslMode,
    MySqlStatement,
};
use sqlx::query::Query;
use sqlx::{Column as _, Connection as _, Either, Executor, Row as _, Statement as _, TypeInfo as _, ValueRef as _};
use stratum_core::{Error, Result, Row, Value};
use tracing::debug;

type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

/// A live MySQL session
#[derive(Debug)]
pub struct MySqlDriver {
    conn: MySqlConnection,
}

impl MySqlDriver {
    /// Translate a [`Config`] into sqlx connect options
    ///
    /// Understood driver options: `charset`, `collation`,
    /// `statement_cache_capacity` and `ssl_mode`.
    pub fn connect_options(config: &Config) -> Result<MySqlConnectOptions> {
        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.pass);
        if !config.db.is_empty() {
            options = options.database(&config.db);
        }
        for (key, value) in &config.options {
            options = match key.as_str() {
                "charset" => options.charset(value),
                "collation" => options.collation(value),
                "statement_cache_capacity" => {
                    let capacity = value.parse::<usize>().map_err(|_| {
                        Error::configuration(format!(
                            "statement_cache_capacity must be a number, got '{}'",
                            value
                        ))
                    })?;
                    options.statement_cache_capacity(capacity)
                }
                "ssl_mode" => {
                    let mode = value.parse::<MySqlSslMode>().map_err(|_| {
                        Error::configuration(format!("unknown ssl_mode '{}'", value))
                    })?;
                    options.ssl_mode(mode)
                }
                other => {
                    debug!(option = other, "Ignoring unknown MySQL driver option");
                    options
                }
            };
        }
        Ok(options)
    }

    pub fn from_connection(conn: MySqlConnection) -> Self {
        Self { conn }
    }
}

impl Driver for MySqlDriver {
    type Statement = MySqlStatement<'static>;

    async fn connect(config: &Config) -> Result<Self> {
        let options = Self::connect_options(config)?;
        debug!(host = %config.host, port = config.port, db = %config.db, "Connecting to MySQL");
        let conn = MySqlConnection::connect_with(&options).await?;
        Ok(Self { conn })
    }

    async fn prepare(&mut self, sql: &str) -> Result<Self::Statement> {
        let statement = Executor::prepare(&mut self.conn, sql).await?;
        Ok(statement.to_owned())
    }

    async fn execute(&mut self, statement: &Self::Statement, params: &[Value]) -> Result<QueryResult> {
        let query = params
            .iter()
            .cloned()
            .fold(statement.query(), bind_value);

        if statement.columns().is_empty() {
            let done = query.execute(&mut self.conn).await?;
            Ok(QueryResult {
                rows: Vec::new(),
                rows_affected: done.rows_affected(),
                last_insert_id: Some(done.last_insert_id()).filter(|id| *id > 0),
            })
        } else {
            let rows = query.fetch_all(&mut self.conn).await?;
            let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;
            Ok(QueryResult::from_rows(rows))
        }
    }

    async fn query(&mut self, sql: &str) -> Result<QueryResult> {
        let mut result = QueryResult::default();
        let mut stream = Executor::fetch_many(&mut self.conn, sql);
        while let Some(item) = stream.try_next().await? {
            match item {
                Either::Left(done) => {
                    result.rows_affected += done.rows_affected();
                    if done.last_insert_id() > 0 {
                        result.last_insert_id = Some(done.last_insert_id());
                    }
                }
                Either::Right(row) => result.rows.push(decode_row(&row)?),
            }
        }
        Ok(result)
    }

    async fn begin_transaction(&mut self) -> Result<()> {
        Executor::execute(&mut self.conn, "START TRANSACTION").await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        Executor::execute(&mut self.conn, "COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        Executor::execute(&mut self.conn, "ROLLBACK").await?;
        Ok(())
    }
}

fn bind_value(query: MySqlQuery<'_>, value: Value) -> MySqlQuery<'_> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(b),
        Value::I32(i) => query.bind(i),
        Value::I64(i) => query.bind(i),
        Value::F32(f) => query.bind(f),
        Value::F64(f) => query.bind(f),
        Value::String(s) => query.bind(s),
        Value::Bytes(b) => query.bind(b),
        Value::Json(j) => query.bind(j.to_string()),
        // IN lists are rendered with one placeholder per element
        Value::Array(items) => items.into_iter().fold(query, bind_value),
    }
}

fn decode_row(row: &MySqlRow) -> Result<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let value = if row.try_get_raw(index)?.is_null() {
            Value::Null
        } else {
            decode_column(row, index, column.type_info().name())?
        };
        decoded.set(column.name(), value);
    }
    Ok(decoded)
}

fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value> {
    let value = match type_name {
        "BOOLEAN" => Value::Bool(row.try_get(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => Value::I64(row.try_get(index)?),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => {
            let unsigned: u64 = row.try_get(index)?;
            match i64::try_from(unsigned) {
                Ok(signed) => Value::I64(signed),
                Err(_) => Value::String(unsigned.to_string()),
            }
        }
        "FLOAT" => Value::F32(row.try_get(index)?),
        "DOUBLE" => Value::F64(row.try_get(index)?),
        "DATETIME" | "TIMESTAMP" => {
            let at: chrono::NaiveDateTime = row.try_get(index)?;
            Value::String(at.format("%Y-%m-%d %H:%M:%S").to_string())
        }
        "DATE" => {
            let day: chrono::NaiveDate = row.try_get(index)?;
            Value::String(day.format("%Y-%m-%d").to_string())
        }
        "TIME" => {
            let time: chrono::NaiveTime = row.try_get(index)?;
            Value::String(time.format("%H:%M:%S").to_string())
        }
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            Value::Bytes(row.try_get(index)?)
        }
        // DECIMAL, ENUM, SET, JSON and the text family come back as text
        _ => row
            .try_get_unchecked::<Option<String>, _>(index)?
            .map(Value::String)
            .unwrap_or(Value::Null),
    };
    Ok(value)
}
