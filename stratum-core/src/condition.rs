//! WHERE conditions and how consecutive conditions are joined

use crate::{IntoOperator, Operator, Value};
use std::fmt::Debug;

/// A single comparison: `column <operator> value`
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

impl Where {
    pub fn new(column: impl Into<String>, operator: impl IntoOperator, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator: operator.into_operator(),
            value: value.into(),
        }
    }

    /// Equality shorthand
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Operator::EQ, value)
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::new(column, Operator::IS_NULL, Value::Null)
    }

    /// Render as a standalone fragment with the value inlined as a literal
    ///
    /// Numbers are emitted unquoted and everything else single-quoted, e.g.
    /// `` `age` > 5 `` or `` `name` = 'x' ``. Statements sent to the driver use
    /// placeholders instead; this form is meant for logging and ad-hoc SQL.
    pub fn to_sql(&self) -> String {
        let column = quote_column(&self.column);
        if !self.operator.takes_value() {
            return format!("{} {}", column, self.operator);
        }
        let value = match &self.value {
            list @ Value::Array(_) if self.operator.is_list() => list.to_literal(),
            other if self.operator.is_list() => format!("({})", other.to_literal()),
            other => other.to_literal(),
        };
        format!("{} {} {}", column, self.operator, value)
    }

    /// Render a condition list with literals, joined by `strategy`
    pub fn join_sql(conditions: &[Where], strategy: &dyn ConditionJoin) -> String {
        let fragments: Vec<String> = conditions.iter().map(Where::to_sql).collect();
        join_conditions(conditions, &fragments, strategy)
    }
}

fn quote_column(column: &str) -> String {
    column
        .split('.')
        .map(|part| format!("`{}`", part.replace('`', "``")))
        .collect::<Vec<_>>()
        .join(".")
}

/// How two conditions are connected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// Decides the connector placed between two consecutive conditions
pub trait ConditionJoin: Send + Sync + Debug {
    fn connector(&self, previous: &Where, current: &Where) -> Connector;
}

/// Conditions on the same column as their predecessor are OR-ed, all others AND-ed
///
/// `[age > 5, age < 2]` reads `age > 5 OR age < 2` while `[age > 5, name = 'x']`
/// reads `age > 5 AND name = 'x'`. Only adjacency counts, so `(a OR b) AND c`
/// is expressible only when `a` and `b` sit next to each other on one column.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdjacentColumnOr;

impl ConditionJoin for AdjacentColumnOr {
    fn connector(&self, previous: &Where, current: &Where) -> Connector {
        if previous.column == current.column {
            Connector::Or
        } else {
            Connector::And
        }
    }
}

/// Every condition AND-ed
#[derive(Debug, Clone, Copy, Default)]
pub struct AllAnd;

impl ConditionJoin for AllAnd {
    fn connector(&self, _previous: &Where, _current: &Where) -> Connector {
        Connector::And
    }
}

/// Join pre-rendered fragments, one per condition, with the connectors `strategy` picks
pub fn join_conditions(conditions: &[Where], fragments: &[String], strategy: &dyn ConditionJoin) -> String {
    let mut sql = String::new();
    for (i, (condition, fragment)) in conditions.iter().zip(fragments).enumerate() {
        if i > 0 {
            sql.push(' ');
            sql.push_str(strategy.connector(&conditions[i - 1], condition).as_str());
            sql.push(' ');
        }
        sql.push_str(fragment);
    }
    sql
}

/// Trait for conditions that can be used in WHERE clauses
pub trait IntoCondition {
    fn into_condition(self) -> Where;
}

impl IntoCondition for Where {
    fn into_condition(self) -> Where {
        self
    }
}

// Shorthand equality: where_(("age", 18))
impl<T> IntoCondition for (&str, T)
where
    T: Into<Value>,
{
    fn into_condition(self) -> Where {
        Where::eq(self.0, self.1)
    }
}

// Explicit operators: where_(("age", op::GT, 18)) or where_(("age", ">", 18))
impl<T, O> IntoCondition for (&str, O, T)
where
    T: Into<Value>,
    O: IntoOperator,
{
    fn into_condition(self) -> Where {
        Where::new(self.0, self.1, self.2)
    }
}
