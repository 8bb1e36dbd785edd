//! Rendering of the statement AST into SQL text and positional parameters

use super::dialect::Dialect;
use stratum_core::{
    join_conditions, ConditionJoin, Delete, Error, Insert, Operator, Projection, Result, Select,
    Statement, Update, Value, Where,
};

/// SQL text with its parameters, one per `?` in order
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Compiled {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameters(&self) -> &[Value] {
        &self.params
    }
}

pub fn render_statement<D: Dialect + ?Sized>(
    dialect: &D,
    statement: &Statement,
    join: &dyn ConditionJoin,
) -> Result<Compiled> {
    match statement {
        Statement::Select(select) => render_select(dialect, select, join),
        Statement::Insert(insert) => render_insert(dialect, insert),
        Statement::Update(update) => render_update(dialect, update, join),
        Statement::Delete(delete) => render_delete(dialect, delete, join),
    }
}

/// `WHERE`-clause body for `conditions`, without the keyword
pub fn render_conditions<D: Dialect + ?Sized>(
    dialect: &D,
    conditions: &[Where],
    join: &dyn ConditionJoin,
) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let fragments: Vec<String> = conditions
        .iter()
        .map(|condition| render_condition(dialect, condition, &mut params))
        .collect();
    (join_conditions(conditions, &fragments, join), params)
}

fn render_condition<D: Dialect + ?Sized>(
    dialect: &D,
    condition: &Where,
    params: &mut Vec<Value>,
) -> String {
    let column = dialect.quote_identifier(&condition.column);
    let operator = condition.operator;

    if !operator.takes_value() {
        return format!("{} {}", column, operator);
    }
    if operator.is_list() {
        let items = match &condition.value {
            Value::Array(items) => items.clone(),
            single => vec![single.clone()],
        };
        if items.is_empty() {
            // Nothing is IN an empty list and everything is NOT IN it
            return if operator == Operator::IN {
                "1 = 0".to_string()
            } else {
                "1 = 1".to_string()
            };
        }
        let placeholders = vec!["?"; items.len()].join(", ");
        params.extend(items);
        return format!("{} {} ({})", column, operator, placeholders);
    }
    params.push(single_param(&condition.value));
    format!("{} {} ?", column, operator)
}

fn where_clause<D: Dialect + ?Sized>(
    dialect: &D,
    sql: &mut String,
    params: &mut Vec<Value>,
    conditions: &[Where],
    join: &dyn ConditionJoin,
) {
    if conditions.is_empty() {
        return;
    }
    let (clause, clause_params) = render_conditions(dialect, conditions, join);
    sql.push_str(" WHERE ");
    sql.push_str(&clause);
    params.extend(clause_params);
}

fn quote_list<D: Dialect + ?Sized>(dialect: &D, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| dialect.quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ")
}

// Arrays only expand inside IN lists; anywhere else they travel as JSON
fn single_param(value: &Value) -> Value {
    match value {
        Value::Array(_) => Value::Json(value.to_json()),
        other => other.clone(),
    }
}

pub fn render_select<D: Dialect + ?Sized>(
    dialect: &D,
    select: &Select,
    join: &dyn ConditionJoin,
) -> Result<Compiled> {
    let projection = match &select.projection {
        Projection::All => "*".to_string(),
        Projection::Columns(columns) => quote_list(dialect, columns),
        Projection::Count(columns) => match columns.as_slice() {
            [] => "COUNT(*)".to_string(),
            [column] => format!("COUNT({})", dialect.quote_identifier(column)),
            _ => {
                return Err(Error::invalid_argument(format!(
                    "COUNT takes at most one column, got {}",
                    columns.len()
                )))
            }
        },
    };

    let mut sql = format!(
        "SELECT {} FROM {}",
        projection,
        dialect.quote_identifier(&select.table)
    );
    let mut params = Vec::new();
    where_clause(dialect, &mut sql, &mut params, &select.conditions, join);

    if !select.group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&quote_list(dialect, &select.group_by));
    }
    if !select.order_by.is_empty() {
        let order: Vec<String> = select
            .order_by
            .iter()
            .map(|o| format!("{} {}", dialect.quote_identifier(&o.column), o.direction))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));
    }
    if let Some(limit) = select.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    Ok(Compiled::new(sql, params))
}

pub fn render_insert<D: Dialect + ?Sized>(dialect: &D, insert: &Insert) -> Result<Compiled> {
    if insert.columns.is_empty() {
        return Err(Error::invalid_argument(format!(
            "INSERT into '{}' has no columns",
            insert.table
        )));
    }
    if insert.rows.is_empty() {
        return Err(Error::invalid_argument(format!(
            "INSERT into '{}' has no rows",
            insert.table
        )));
    }

    let group = format!("({})", vec!["?"; insert.columns.len()].join(", "));
    let mut params = Vec::with_capacity(insert.columns.len() * insert.rows.len());
    for (i, row) in insert.rows.iter().enumerate() {
        if row.len() != insert.columns.len() {
            return Err(Error::invalid_argument(format!(
                "INSERT row {} has {} values for {} columns",
                i,
                row.len(),
                insert.columns.len()
            )));
        }
        params.extend(row.iter().map(single_param));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        dialect.quote_identifier(&insert.table),
        quote_list(dialect, &insert.columns),
        vec![group; insert.rows.len()].join(", ")
    );
    Ok(Compiled::new(sql, params))
}

pub fn render_update<D: Dialect + ?Sized>(
    dialect: &D,
    update: &Update,
    join: &dyn ConditionJoin,
) -> Result<Compiled> {
    if update.conditions.is_empty() {
        return Err(Error::logic(format!(
            "UPDATE of '{}' without conditions would touch every row",
            update.table
        )));
    }
    if update.assignments.is_empty() {
        return Err(Error::invalid_argument(format!(
            "UPDATE of '{}' has nothing to set",
            update.table
        )));
    }

    let mut params = Vec::new();
    let assignments: Vec<String> = update
        .assignments
        .iter()
        .map(|(column, value)| {
            params.push(single_param(value));
            format!("{} = ?", dialect.quote_identifier(column))
        })
        .collect();

    let mut sql = format!(
        "UPDATE {} SET {}",
        dialect.quote_identifier(&update.table),
        assignments.join(", ")
    );
    where_clause(dialect, &mut sql, &mut params, &update.conditions, join);
    Ok(Compiled::new(sql, params))
}

pub fn render_delete<D: Dialect + ?Sized>(
    dialect: &D,
    delete: &Delete,
    join: &dyn ConditionJoin,
) -> Result<Compiled> {
    if delete.conditions.is_empty() {
        return Err(Error::logic(format!(
            "DELETE from '{}' without conditions would remove every row; use truncate",
            delete.table
        )));
    }
    let mut sql = format!("DELETE FROM {}", dialect.quote_identifier(&delete.table));
    let mut params = Vec::new();
    where_clause(dialect, &mut sql, &mut params, &delete.conditions, join);
    Ok(Compiled::new(sql, params))
}
