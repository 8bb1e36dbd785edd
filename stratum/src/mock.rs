//! Recording driver for unit tests

use crate::driver::{Driver, QueryResult};
use crate::Config;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use stratum_core::{Error, Result, Row, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Statement(String),
    Begin,
    Commit,
    Rollback,
}

#[derive(Debug, Default)]
struct MockState {
    executed: Vec<(String, Vec<Value>)>,
    events: Vec<Event>,
    prepares: usize,
    results: VecDeque<QueryResult>,
    failures: Vec<(String, String, String)>,
    commit_failure: Option<(String, String)>,
}

impl MockState {
    fn check_failure(&self, sql: &str) -> Result<()> {
        match self.failures.iter().find(|(prefix, _, _)| sql.starts_with(prefix.as_str())) {
            Some((_, code, message)) => Err(Error::driver(Some(code.clone()), message.clone())),
            None => Ok(()),
        }
    }

    fn record(&mut self, sql: &str, params: &[Value]) -> QueryResult {
        self.executed.push((sql.to_string(), params.to_vec()));
        self.events.push(Event::Statement(sql.to_string()));
        self.results.pop_front().unwrap_or_default()
    }
}

/// Shared view of what a [`MockDriver`] has seen
#[derive(Debug, Clone, Default)]
pub struct MockHandle(Arc<Mutex<MockState>>);

impl MockHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.0.lock().unwrap()
    }

    /// Queue the result of the next executed statement
    pub fn push_result(&self, result: QueryResult) {
        self.lock().results.push_back(result);
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        self.push_result(QueryResult::from_rows(rows));
    }

    /// Make every statement starting with `prefix` fail
    pub fn fail_on(&self, prefix: &str, code: &str, message: &str) {
        self.lock()
            .failures
            .push((prefix.to_string(), code.to_string(), message.to_string()));
    }

    /// Make every commit fail
    pub fn fail_commit(&self, code: &str, message: &str) {
        self.lock().commit_failure = Some((code.to_string(), message.to_string()));
    }

    pub fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.lock().executed.clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.lock().executed.iter().map(|(sql, _)| sql.clone()).collect()
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    pub fn prepare_count(&self) -> usize {
        self.lock().prepares
    }
}

pub struct MockDriver {
    state: MockHandle,
}

impl MockDriver {
    pub fn new() -> (Self, MockHandle) {
        let state = MockHandle::default();
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl Driver for MockDriver {
    type Statement = String;

    async fn connect(_config: &Config) -> Result<Self> {
        Ok(Self::new().0)
    }

    async fn prepare(&mut self, sql: &str) -> Result<Self::Statement> {
        let mut state = self.state.lock();
        state.check_failure(sql)?;
        state.prepares += 1;
        Ok(sql.to_string())
    }

    async fn execute(&mut self, statement: &Self::Statement, params: &[Value]) -> Result<QueryResult> {
        let mut state = self.state.lock();
        state.check_failure(statement)?;
        Ok(state.record(statement, params))
    }

    async fn query(&mut self, sql: &str) -> Result<QueryResult> {
        let mut state = self.state.lock();
        state.check_failure(sql)?;
        Ok(state.record(sql, &[]))
    }

    async fn begin_transaction(&mut self) -> Result<()> {
        self.state.lock().events.push(Event::Begin);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if let Some((code, message)) = state.commit_failure.clone() {
            return Err(Error::driver(Some(code), message));
        }
        state.events.push(Event::Commit);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.state.lock().events.push(Event::Rollback);
        Ok(())
    }
}
