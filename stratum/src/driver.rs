//! Database driver interface

use crate::Config;
use std::future::Future;
use stratum_core::{Result, Row, Value};

#[cfg(feature = "mysql")]
pub mod mysql;

/// Outcome of a statement: fetched rows, or the effect of a write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub rows_affected: u64,
    /// Id generated by an AUTO_INCREMENT column, when the statement produced one
    pub last_insert_id: Option<u64>,
}

impl QueryResult {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Default::default()
        }
    }

    pub fn inserted(rows_affected: u64, last_insert_id: u64) -> Self {
        Self {
            rows: Vec::new(),
            rows_affected,
            last_insert_id: Some(last_insert_id),
        }
    }
}

/// Primitives a database driver provides to a [`Connection`](crate::Connection)
///
/// A driver owns exactly one live session. Failures surface as
/// [`Error::Driver`](stratum_core::Error::Driver) carrying the driver's code and message.
pub trait Driver: Send {
    /// Prepared statement handle
    type Statement: Send + Sync;

    /// Open a session
    fn connect(config: &Config) -> impl Future<Output = Result<Self>> + Send
    where
        Self: Sized;

    /// Prepare a statement with `?` placeholders
    fn prepare(&mut self, sql: &str) -> impl Future<Output = Result<Self::Statement>> + Send;

    /// Run a prepared statement with one parameter per placeholder
    fn execute(
        &mut self,
        statement: &Self::Statement,
        params: &[Value],
    ) -> impl Future<Output = Result<QueryResult>> + Send;

    /// Run SQL text without parameters
    fn query(&mut self, sql: &str) -> impl Future<Output = Result<QueryResult>> + Send;

    fn begin_transaction(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Quote an identifier for this driver's SQL flavor
    fn quote_identifier(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }
}
