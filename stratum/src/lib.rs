//! Stratum - schema definition, a MySQL statement compiler and record mapping
//!
//! Stratum describes tables in a dialect-independent schema model, compiles
//! schema and statements into MySQL, runs them over a single connection with
//! a prepared-statement cache, and maps typed records and their relations onto
//! rows.
//!
//! ```
//! use stratum::{Column, DataType, MySql, Dialect, Table, TableOptions};
//!
//! let mut table = Table::with_options("user", TableOptions::default().with_id()).unwrap();
//! table.add_column(Column::new("name", DataType::String)).unwrap();
//!
//! let sql = MySql.create_table(&table).unwrap();
//! assert!(sql.starts_with("CREATE TABLE `user` (`id` int(11)"));
//! ```

pub mod builder;
pub mod config;
pub mod connection;
pub mod driver;
pub mod language;
pub mod model;

#[cfg(test)]
mod mock;

// Re-export main types
pub use builder::QueryBuilder;
pub use config::Config;
pub use connection::Connection;
pub use driver::{Driver, QueryResult};
pub use language::{dialect_for, Compiled, Dialect, Language, MySql};
pub use model::{
    short_name, DefaultNaming, Model, ModelConfig, NamingStrategy, Related, Repository,
};
pub use stratum_core::*;

#[cfg(feature = "mysql")]
pub use driver::mysql::MySqlDriver;

/// Create a new query builder over raw rows of the given table
///
/// # Examples
///
/// ```
/// use stratum::{from, op};
///
/// let query = from("post").where_(("views", op::GT, 10)).limit(3);
/// assert_eq!(query.select().table, "post");
/// ```
pub fn from(table: &str) -> QueryBuilder<Row> {
    QueryBuilder::new(table)
}
