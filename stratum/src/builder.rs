//! Lazy SELECT builder with typed hydration

use crate::driver::Driver;
use crate::language::Language;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use stratum_core::{
    Error, IntoColumns, IntoCondition, Operator, Result, Row, Select, SortDirection, Value, Where,
};

/// Accumulates a SELECT and runs it only when asked
///
/// Every call to [`get`](Self::get) re-executes the query; nothing is cached.
/// Rows are hydrated into `R` through serde, restricted to the fillable
/// columns when a fillable list is set.
///
/// # Examples
/// ```
/// use stratum::QueryBuilder;
/// use stratum_core::{op, Row};
///
/// let query = QueryBuilder::<Row>::new("post")
///     .where_(("views", op::GT, 100))
///     .order_by_desc("created_at")
///     .limit(5);
/// assert_eq!(query.select().limit, Some(5));
/// ```
pub struct QueryBuilder<R = Row> {
    select: Select,
    fillable: Option<Vec<String>>,
    marker: PhantomData<fn() -> R>,
}

impl<R> Clone for QueryBuilder<R> {
    fn clone(&self) -> Self {
        Self {
            select: self.select.clone(),
            fillable: self.fillable.clone(),
            marker: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for QueryBuilder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("select", &self.select)
            .field("fillable", &self.fillable)
            .finish()
    }
}

impl<R: DeserializeOwned> QueryBuilder<R> {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            select: Select::from(table),
            fillable: None,
            marker: PhantomData,
        }
    }

    /// Only these columns are handed to `R` when hydrating
    pub fn fillable(mut self, fillable: Option<Vec<String>>) -> Self {
        self.fillable = fillable;
        self
    }

    pub fn columns<C: IntoColumns>(mut self, columns: C) -> Self {
        self.select = self.select.columns(columns);
        self
    }

    /// Add a WHERE condition
    ///
    /// Accepts `("col", value)`, `("col", op, value)` or a [`Where`].
    pub fn where_<C: IntoCondition>(mut self, condition: C) -> Self {
        self.select = self.select.where_(condition);
        self
    }

    pub fn where_in(self, column: &str, values: impl Into<Value>) -> Self {
        self.where_(Where::new(column, Operator::IN, values))
    }

    /// Order by a column; ordering the same column again replaces its direction
    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.select = self.select.order_by(column, direction);
        self
    }

    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Asc)
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Desc)
    }

    pub fn group_by<C: IntoColumns>(mut self, columns: C) -> Self {
        self.select = self.select.group_by(columns);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.select = self.select.limit(limit);
        self
    }

    pub fn select(&self) -> &Select {
        &self.select
    }

    pub fn into_select(self) -> Select {
        self.select
    }

    /// Execute and hydrate every row
    pub async fn get<D: Driver>(&self, language: &mut Language<D>) -> Result<Vec<R>> {
        let rows = language.get_all_rows(&self.select).await?;
        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    /// Execute and return the row at `index`; an index past the end is a logic error
    pub async fn get_at<D: Driver>(&self, language: &mut Language<D>, index: usize) -> Result<R> {
        let mut records = self.get(language).await?;
        if index >= records.len() {
            return Err(Error::logic(format!(
                "index {} is out of range for {} result(s) from '{}'",
                index,
                records.len(),
                self.select.table
            )));
        }
        Ok(records.swap_remove(index))
    }

    /// Execute with `LIMIT 1`
    pub async fn first<D: Driver>(&self, language: &mut Language<D>) -> Result<Option<R>> {
        let limited = self.select.clone().limit(1);
        let rows = language.get_all_rows(&limited).await?;
        rows.into_iter().next().map(|row| self.hydrate(row)).transpose()
    }

    pub async fn count<D: Driver>(&self, language: &mut Language<D>) -> Result<u64> {
        language.get_count(&self.select).await
    }

    fn hydrate(&self, mut row: Row) -> Result<R> {
        if let Some(fillable) = &self.fillable {
            row.retain(|column| fillable.iter().any(|f| f == column));
        }
        row.deserialize()
    }
}
