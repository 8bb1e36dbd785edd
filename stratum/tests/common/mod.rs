//! In-memory driver understanding the statement shapes the MySQL compiler emits

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use stratum::{Config, Driver, Error, QueryResult, Result, Row, Value};

const NOW: &str = "2024-01-01 00:00:00";

#[derive(Debug, Default)]
struct MemoryTable {
    columns: Vec<String>,
    timestamp_defaults: Vec<String>,
    auto_increment: Option<String>,
    next_id: u64,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
pub struct Database {
    tables: HashMap<String, MemoryTable>,
    pub log: Vec<String>,
    pub transactions: Vec<&'static str>,
}

impl Database {
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    db: Arc<Mutex<Database>>,
    fail_prefix: Option<String>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every statement starting with `prefix` fails like a driver error
    pub fn failing_on(mut self, prefix: &str) -> Self {
        self.fail_prefix = Some(prefix.to_string());
        self
    }

    pub fn database(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap()
    }

    fn run(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        if let Some(prefix) = &self.fail_prefix {
            if sql.starts_with(prefix.as_str()) {
                return Err(Error::driver(Some("HY000".into()), format!("refused: {}", sql)));
            }
        }
        let mut db = self.db.lock().unwrap();
        db.log.push(sql.to_string());
        let mut params = params.iter().cloned();

        if sql.starts_with("CREATE TABLE") {
            create_table(&mut db, sql)
        } else if sql.starts_with("DROP TABLE") {
            db.tables.remove(&identifiers(sql)[0]);
            Ok(QueryResult::default())
        } else if sql.starts_with("INSERT INTO") {
            insert(&mut db, sql, params.collect())
        } else if sql.starts_with("SELECT") {
            select(&db, sql, &mut params)
        } else if sql.starts_with("UPDATE") {
            update(&mut db, sql, &mut params)
        } else if sql.starts_with("DELETE FROM") {
            delete(&mut db, sql, &mut params)
        } else {
            Ok(QueryResult::default())
        }
    }
}

impl Driver for MemoryDriver {
    type Statement = String;

    async fn connect(_config: &Config) -> Result<Self> {
        Ok(Self::new())
    }

    async fn prepare(&mut self, sql: &str) -> Result<Self::Statement> {
        Ok(sql.to_string())
    }

    async fn execute(&mut self, statement: &Self::Statement, params: &[Value]) -> Result<QueryResult> {
        self.run(statement, params)
    }

    async fn query(&mut self, sql: &str) -> Result<QueryResult> {
        self.run(sql, &[])
    }

    async fn begin_transaction(&mut self) -> Result<()> {
        self.database().transactions.push("begin");
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.database().transactions.push("commit");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.database().transactions.push("rollback");
        Ok(())
    }
}

/// Backticked identifiers in order of appearance
fn identifiers(sql: &str) -> Vec<String> {
    sql.split('`')
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, name)| name.to_string())
        .collect()
}

fn table_mut<'a>(db: &'a mut Database, name: &str) -> Result<&'a mut MemoryTable> {
    db.tables
        .get_mut(name)
        .ok_or_else(|| Error::driver(Some("1146".into()), format!("Table '{}' doesn't exist", name)))
}

fn create_table(db: &mut Database, sql: &str) -> Result<QueryResult> {
    let name = identifiers(sql)[0].clone();
    let open = sql.find('(').unwrap_or(0);
    let close = sql.rfind(") ENGINE").unwrap_or(sql.len());
    let mut table = MemoryTable {
        next_id: 1,
        ..Default::default()
    };
    for definition in sql[open + 1..close].split(", ") {
        if !definition.starts_with('`') {
            continue;
        }
        let column = identifiers(definition)[0].clone();
        if definition.contains("AUTO_INCREMENT") {
            table.auto_increment = Some(column.clone());
        }
        if definition.contains("DEFAULT CURRENT_TIMESTAMP") {
            table.timestamp_defaults.push(column.clone());
        }
        table.columns.push(column);
    }
    db.tables.insert(name, table);
    Ok(QueryResult::default())
}

fn insert(db: &mut Database, sql: &str, params: Vec<Value>) -> Result<QueryResult> {
    let names = identifiers(sql);
    let table = table_mut(db, &names[0])?;
    let columns = &names[1..];
    let mut last_id = None;
    let mut inserted = 0;
    for values in params.chunks(columns.len().max(1)) {
        let mut row = Row::new();
        for column in &table.columns {
            let value = columns
                .iter()
                .position(|c| c == column)
                .map(|i| values[i].clone())
                .unwrap_or(Value::Null);
            row.set(column.clone(), value);
        }
        if let Some(key) = &table.auto_increment {
            match row.get(key).and_then(Value::as_i64) {
                Some(id) => table.next_id = table.next_id.max(id as u64 + 1),
                None => {
                    row.set(key.clone(), table.next_id as i64);
                    last_id = Some(table.next_id);
                    table.next_id += 1;
                }
            }
        }
        for column in &table.timestamp_defaults {
            if row.get(column).map_or(true, Value::is_null) {
                row.set(column.clone(), NOW);
            }
        }
        table.rows.push(row);
        inserted += 1;
    }
    Ok(QueryResult {
        rows: Vec::new(),
        rows_affected: inserted,
        last_insert_id: last_id,
    })
}

fn same(left: &Value, right: &Value) -> bool {
    match (left.as_i64(), right.as_i64()) {
        (Some(l), Some(r)) if left.is_numeric() || right.is_numeric() => l == r,
        _ => left == right,
    }
}

fn satisfies(row: &Row, clause: &str, params: &mut impl Iterator<Item = Value>) -> Result<bool> {
    if clause.is_empty() {
        return Ok(true);
    }
    if clause.contains(" OR ") {
        return Err(Error::driver(None, "memory driver only supports AND"));
    }
    let mut keep = true;
    for condition in clause.split(" AND ") {
        let hit = match condition {
            "1 = 0" => false,
            "1 = 1" => true,
            _ => {
                let column = identifiers(condition)[0].clone();
                let current = row.get(&column).cloned().unwrap_or(Value::Null);
                let rest = condition.rsplit('`').next().unwrap_or("").trim();
                if rest == "IS NULL" {
                    current.is_null()
                } else if rest == "IS NOT NULL" {
                    !current.is_null()
                } else if rest.starts_with("IN (") {
                    let count = rest.matches('?').count();
                    let candidates: Vec<Value> = params.by_ref().take(count).collect();
                    candidates.iter().any(|v| same(&current, v))
                } else {
                    let value = params.next().unwrap_or(Value::Null);
                    match rest {
                        "= ?" => same(&current, &value),
                        "!= ?" => !same(&current, &value),
                        _ => return Err(Error::driver(None, format!("unsupported condition {}", condition))),
                    }
                }
            }
        };
        keep &= hit;
    }
    Ok(keep)
}

/// Split `sql` at ` WHERE ` and cut any trailing clause
fn where_part(sql: &str) -> (&str, &str) {
    match sql.split_once(" WHERE ") {
        None => (sql, ""),
        Some((head, tail)) => {
            let end = [" GROUP BY ", " ORDER BY ", " LIMIT "]
                .iter()
                .filter_map(|marker| tail.find(marker))
                .min()
                .unwrap_or(tail.len());
            (head, &tail[..end])
        }
    }
}

fn select(db: &Database, sql: &str, params: &mut impl Iterator<Item = Value>) -> Result<QueryResult> {
    let (head, clause) = where_part(sql);
    let (projection, table_part) = head
        .trim_start_matches("SELECT ")
        .split_once(" FROM ")
        .unwrap_or(("*", head));
    let table_name = identifiers(table_part)[0].clone();
    let table = db
        .tables
        .get(&table_name)
        .ok_or_else(|| Error::driver(Some("1146".into()), format!("Table '{}' doesn't exist", table_name)))?;

    let condition_params: Vec<Value> = params.collect();
    let mut rows = Vec::new();
    for row in &table.rows {
        if satisfies(row, clause, &mut condition_params.clone().into_iter())? {
            rows.push(row.clone());
        }
    }

    if let Some((_, order)) = sql.split_once(" ORDER BY ") {
        let column = identifiers(order)[0].clone();
        let descending = order.contains(" DESC");
        rows.sort_by(|a, b| {
            let ordering = a
                .get(&column)
                .and_then(Value::as_i64)
                .cmp(&b.get(&column).and_then(Value::as_i64));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
    if let Some((_, limit)) = sql.split_once(" LIMIT ") {
        if let Ok(limit) = limit.trim().parse::<usize>() {
            rows.truncate(limit);
        }
    }

    if projection.starts_with("COUNT(") {
        let count = Row::from_pairs([(projection.to_string(), Value::I64(rows.len() as i64))]);
        return Ok(QueryResult::from_rows(vec![count]));
    }
    if projection != "*" {
        let wanted = identifiers(projection);
        for row in &mut rows {
            row.retain(|column| wanted.iter().any(|w| w == column));
        }
    }
    Ok(QueryResult::from_rows(rows))
}

fn update(db: &mut Database, sql: &str, params: &mut impl Iterator<Item = Value>) -> Result<QueryResult> {
    let (head, clause) = where_part(sql);
    let names = identifiers(head);
    let assignments: Vec<(String, Value)> = names[1..]
        .iter()
        .map(|column| (column.clone(), params.next().unwrap_or(Value::Null)))
        .collect();
    let condition_params: Vec<Value> = params.collect();
    let table = table_mut(db, &names[0])?;
    let mut affected = 0;
    for row in &mut table.rows {
        if satisfies(row, clause, &mut condition_params.clone().into_iter())? {
            for (column, value) in &assignments {
                row.set(column.clone(), value.clone());
            }
            affected += 1;
        }
    }
    Ok(QueryResult::affected(affected))
}

fn delete(db: &mut Database, sql: &str, params: &mut impl Iterator<Item = Value>) -> Result<QueryResult> {
    let (head, clause) = where_part(sql);
    let condition_params: Vec<Value> = params.collect();
    let table = table_mut(db, &identifiers(head)[0])?;
    let mut doomed = Vec::new();
    for row in &table.rows {
        doomed.push(satisfies(row, clause, &mut condition_params.clone().into_iter())?);
    }
    let mut flags = doomed.iter();
    table.rows.retain(|_| !flags.next().copied().unwrap_or(false));
    Ok(QueryResult::affected(doomed.iter().filter(|d| **d).count() as u64))
}
