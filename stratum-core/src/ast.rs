//! Statement AST rendered to SQL by a dialect

use crate::{Error, IntoCondition, Row, Value, Where};
use std::fmt;
use std::str::FromStr;

/// Sort direction for ORDER BY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(Error::invalid_argument(format!("Unknown sort direction '{}'", s)))
        }
    }
}

/// ORDER BY entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// Trait for types that can be converted to column lists
pub trait IntoColumns {
    fn into_columns(self) -> Vec<String>;
}

impl IntoColumns for &str {
    fn into_columns(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoColumns for String {
    fn into_columns(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> Vec<String> {
        self.into_iter().map(|s| s.to_string()).collect()
    }
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> Vec<String> {
        self
    }
}

impl IntoColumns for &[String] {
    fn into_columns(self) -> Vec<String> {
        self.to_vec()
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl IntoColumns for (&str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

impl IntoColumns for (&str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string(), self.2.to_string()]
    }
}

/// What a SELECT returns
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    /// `*`
    #[default]
    All,
    Columns(Vec<String>),
    /// `COUNT(*)` when empty, otherwise `COUNT(col, ..)`
    Count(Vec<String>),
}

impl Projection {
    /// Listed columns; an empty list means all columns
    pub fn columns(columns: Vec<String>) -> Self {
        if columns.is_empty() {
            Projection::All
        } else {
            Projection::Columns(columns)
        }
    }
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    pub table: String,
    pub projection: Projection,
    pub conditions: Vec<Where>,
    pub order_by: Vec<OrderBy>,
    pub group_by: Vec<String>,
    pub limit: Option<u64>,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn columns<C: IntoColumns>(mut self, columns: C) -> Self {
        self.projection = Projection::columns(columns.into_columns());
        self
    }

    pub fn count(mut self) -> Self {
        let columns = match self.projection {
            Projection::Columns(columns) => columns,
            Projection::Count(columns) => columns,
            Projection::All => Vec::new(),
        };
        self.projection = Projection::Count(columns);
        self
    }

    pub fn where_<C: IntoCondition>(mut self, condition: C) -> Self {
        self.conditions.push(condition.into_condition());
        self
    }

    pub fn conditions(mut self, conditions: impl IntoIterator<Item = Where>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    /// Order by a column; ordering the same column again replaces its direction in place
    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        let column = column.into();
        match self.order_by.iter_mut().find(|o| o.column == column) {
            Some(existing) => existing.direction = direction,
            None => self.order_by.push(OrderBy { column, direction }),
        }
        self
    }

    pub fn group_by<C: IntoColumns>(mut self, columns: C) -> Self {
        for column in columns.into_columns() {
            if !self.group_by.contains(&column) {
                self.group_by.push(column);
            }
        }
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_count(&self) -> bool {
        matches!(self.projection, Projection::Count(_))
    }
}

/// Multi-row INSERT; every row supplies one value per column
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Insert {
    /// Project rows onto `columns`, filling absent columns with NULL
    pub fn from_rows(table: impl Into<String>, columns: Vec<String>, rows: &[Row]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| row.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self {
            table: table.into(),
            columns,
            rows,
        }
    }
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<(String, Value)>,
    pub conditions: Vec<Where>,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub conditions: Vec<Where>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl From<Select> for Statement {
    fn from(select: Select) -> Self {
        Statement::Select(select)
    }
}

impl From<Insert> for Statement {
    fn from(insert: Insert) -> Self {
        Statement::Insert(insert)
    }
}

impl From<Update> for Statement {
    fn from(update: Update) -> Self {
        Statement::Update(update)
    }
}

impl From<Delete> for Statement {
    fn from(delete: Delete) -> Self {
        Statement::Delete(delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op;

    #[test]
    fn test_order_by_replaces_direction() {
        let select = Select::from("post")
            .order_by("created_at", SortDirection::Asc)
            .order_by("title", SortDirection::Asc)
            .order_by("created_at", SortDirection::Desc);
        assert_eq!(
            select.order_by,
            vec![
                OrderBy {
                    column: "created_at".into(),
                    direction: SortDirection::Desc
                },
                OrderBy {
                    column: "title".into(),
                    direction: SortDirection::Asc
                },
            ]
        );
    }

    #[test]
    fn test_count_keeps_columns() {
        let select = Select::from("post").columns(("id", "title")).count();
        assert_eq!(
            select.projection,
            Projection::Count(vec!["id".into(), "title".into()])
        );
        assert!(Select::from("post").count().is_count());
        assert_eq!(Select::from("post").columns(Vec::<String>::new()).projection, Projection::All);
    }

    #[test]
    fn test_where_shorthands() {
        let select = Select::from("user")
            .where_(("age", op::GT, 18))
            .where_(("name", "John"));
        assert_eq!(select.conditions.len(), 2);
        assert_eq!(select.conditions[1], Where::eq("name", "John"));
    }

    #[test]
    fn test_insert_fills_missing_with_null() {
        let rows = vec![
            Row::from_pairs([("a", 1)]),
            Row::from_pairs([("b", 2), ("a", 3)]),
        ];
        let insert = Insert::from_rows("t", vec!["a".into(), "b".into()], &rows);
        assert_eq!(
            insert.rows,
            vec![
                vec![Value::I32(1), Value::Null],
                vec![Value::I32(3), Value::I32(2)],
            ]
        );
    }

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("sideways".parse::<SortDirection>().is_err());
    }
}
