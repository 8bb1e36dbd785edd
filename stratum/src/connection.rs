//! A driver session with a prepared-statement cache and transaction state

use crate::driver::{Driver, QueryResult};
use crate::Config;
use std::collections::HashMap;
use stratum_core::{Error, Result, Value};
use tracing::{debug, error, warn};

/// Owns one driver session
///
/// Prepared statements are cached per connection, keyed by their exact SQL
/// text, and reused for every later execution of the same text.
pub struct Connection<D: Driver> {
    driver: D,
    statements: HashMap<String, D::Statement>,
    in_transaction: bool,
}

impl<D: Driver> Connection<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            statements: HashMap::new(),
            in_transaction: false,
        }
    }

    /// Connect through the driver
    pub async fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(D::connect(config).await?))
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Number of statements held in the cache
    pub fn cached_statements(&self) -> usize {
        self.statements.len()
    }

    /// Execute `sql` as a prepared statement, preparing it on first use
    pub async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        if !self.statements.contains_key(sql) {
            debug!(sql, "Preparing statement");
            let statement = self.driver.prepare(sql).await.map_err(|e| {
                error!(sql, error = %e, "Failed to prepare statement");
                e
            })?;
            self.statements.insert(sql.to_string(), statement);
        } else {
            debug!(sql, "Reusing cached statement");
        }

        let Self {
            driver, statements, ..
        } = self;
        let statement = statements
            .get(sql)
            .ok_or_else(|| Error::logic(format!("statement vanished from cache: {}", sql)))?;
        debug!(sql, params = params.len(), "Executing statement");
        driver.execute(statement, params).await.map_err(|e| {
            error!(sql, error = %e, "Statement failed");
            e
        })
    }

    /// Run SQL text directly, without preparing it
    pub async fn query(&mut self, sql: &str) -> Result<QueryResult> {
        debug!(sql, "Running query");
        self.driver.query(sql).await.map_err(|e| {
            error!(sql, error = %e, "Query failed");
            e
        })
    }

    /// Prepared path when there are parameters, plain query otherwise
    pub async fn run(&mut self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        if params.is_empty() {
            self.query(sql).await
        } else {
            self.execute(sql, params).await
        }
    }

    pub async fn begin(&mut self) -> Result<()> {
        if self.in_transaction {
            return Err(Error::logic("a transaction is already open on this connection"));
        }
        debug!("Beginning transaction");
        self.driver.begin_transaction().await?;
        self.in_transaction = true;
        Ok(())
    }

    /// Commit the open transaction
    ///
    /// A failed commit is rolled back and ends the transaction either way.
    pub async fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(Error::logic("commit without an open transaction"));
        }
        debug!("Committing transaction");
        self.in_transaction = false;
        if let Err(e) = self.driver.commit().await {
            error!(error = %e, "Commit failed, rolling back");
            if let Err(rollback_error) = self.driver.rollback().await {
                warn!(error = %rollback_error, "Rollback after failed commit failed");
            }
            return Err(e);
        }
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(Error::logic("rollback without an open transaction"));
        }
        warn!("Rolling back transaction");
        // The transaction is over either way once the driver has been asked to roll back
        self.in_transaction = false;
        self.driver.rollback().await
    }

    pub fn quote_identifier(&self, identifier: &str) -> String {
        self.driver.quote_identifier(identifier)
    }
}

impl<D: Driver> std::fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("cached_statements", &self.statements.len())
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}
