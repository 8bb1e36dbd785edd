//! Stratum Core - schema model, values and statement AST
//!
//! This crate holds the I/O-free half of Stratum: the dialect-independent
//! schema model, parameter values and rows, WHERE conditions with their join
//! strategy, and the statement AST that a dialect renders into SQL.

pub mod ast;
pub mod condition;
pub mod error;
pub mod operator;
pub mod row;
pub mod schema;
pub mod value;

// Re-export main types
pub use ast::{Delete, Insert, IntoColumns, OrderBy, Projection, Select, SortDirection, Statement, Update};
pub use condition::{join_conditions, AdjacentColumnOr, AllAnd, ConditionJoin, Connector, IntoCondition, Where};
pub use error::{Error, Result};
pub use operator::{op, IntoOperator, Operator};
pub use row::Row;
pub use schema::{
    Column, ColumnDefault, ColumnOptions, ColumnSize, DataType, ForeignKey, ForeignKeyAction,
    ForeignKeyOptions, Table, TableOptions, AUDIT_COLUMNS, CREATED_AT, DELETED_AT, MODIFIED_AT,
};
pub use value::{quote_literal, Value};
