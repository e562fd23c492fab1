#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use oxide_sqly_core::{
    AnyDialect, ColumnType, Connection, DbValue, ExecOutcome, Executor, Result, RowCursor, Sqly,
    SqlyError, TxHandle,
};

/// A result set served by [`MockConn::query`].
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<DbValue>>,
}

impl ResultSet {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, values: Vec<DbValue>) -> Self {
        self.rows.push(values);
        self
    }
}

#[derive(Debug, Default)]
struct State {
    log: Vec<String>,
    results: VecDeque<ResultSet>,
    fail_on: Option<String>,
    fail_close: bool,
    scans: usize,
    closes: usize,
}

/// In-memory connection that records every statement it receives.
#[derive(Debug, Clone, Default)]
pub struct MockConn {
    state: Arc<Mutex<State>>,
}

impl MockConn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a result set for the next query.
    pub fn push_result(&self, set: ResultSet) {
        self.state.lock().unwrap().results.push_back(set);
    }

    /// Makes every statement containing `needle` fail.
    pub fn fail_on(&self, needle: &str) {
        self.state.lock().unwrap().fail_on = Some(needle.to_string());
    }

    /// Makes every cursor fail to close.
    pub fn fail_close(&self) {
        self.state.lock().unwrap().fail_close = true;
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn scans(&self) -> usize {
        self.state.lock().unwrap().scans
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    fn record(&self, entry: &str) {
        self.state.lock().unwrap().log.push(entry.to_string());
    }

    fn run(&self, statement: &str) -> Result<()> {
        self.record(statement);
        let state = self.state.lock().unwrap();
        match &state.fail_on {
            Some(needle) if statement.contains(needle.as_str()) => {
                Err(SqlyError::Driver(format!("rejected: {statement}").into()))
            }
            _ => Ok(()),
        }
    }

    fn next_result(&self) -> MockCursor {
        let mut state = self.state.lock().unwrap();
        let set = state.results.pop_front().unwrap_or_default();
        MockCursor {
            set,
            next_row: 0,
            current: None,
            state: Arc::clone(&self.state),
        }
    }
}

/// Sqly session over a mock connection.
pub fn session(dialect: AnyDialect) -> (Sqly<MockConn>, MockConn) {
    let conn = MockConn::new();
    (Sqly::new(conn.clone(), dialect), conn)
}

#[derive(Debug)]
pub struct MockOutcome {
    pub last_insert_id: i64,
    pub rows_affected: i64,
}

impl ExecOutcome for MockOutcome {
    fn last_insert_id(&self) -> Result<i64> {
        Ok(self.last_insert_id)
    }

    fn rows_affected(&self) -> Result<i64> {
        Ok(self.rows_affected)
    }
}

#[derive(Debug)]
pub struct MockCursor {
    set: ResultSet,
    next_row: usize,
    current: Option<usize>,
    state: Arc<Mutex<State>>,
}

impl RowCursor for MockCursor {
    fn columns(&self) -> Result<Vec<String>> {
        Ok(self.set.columns.clone())
    }

    fn column_types(&self) -> Result<Vec<ColumnType>> {
        Ok(Vec::new())
    }

    async fn next(&mut self) -> Result<bool> {
        if self.next_row < self.set.rows.len() {
            self.current = Some(self.next_row);
            self.next_row += 1;
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn scan(&mut self) -> Result<Vec<DbValue>> {
        self.state.lock().unwrap().scans += 1;
        let index = self
            .current
            .ok_or_else(|| SqlyError::Driver("scan without a current row".into()))?;
        Ok(self.set.rows[index].clone())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.closes += 1;
        if state.fail_close {
            Err(SqlyError::Driver("connection reset while closing".into()))
        } else {
            Ok(())
        }
    }
}

impl Executor for MockConn {
    type Cursor = MockCursor;
    type Outcome = MockOutcome;

    async fn execute(&mut self, statement: &str) -> Result<MockOutcome> {
        self.run(statement)?;
        Ok(MockOutcome {
            last_insert_id: 41,
            rows_affected: 2,
        })
    }

    async fn query(&mut self, statement: &str) -> Result<MockCursor> {
        self.run(statement)?;
        Ok(self.next_result())
    }
}

impl Connection for MockConn {
    type Transaction = MockTx;

    async fn begin(&mut self) -> Result<MockTx> {
        self.record("BEGIN");
        Ok(MockTx {
            conn: self.clone(),
            finished: false,
        })
    }
}

/// Transaction over a [`MockConn`]; logs `ROLLBACK` when dropped unfinished.
#[derive(Debug)]
pub struct MockTx {
    conn: MockConn,
    finished: bool,
}

impl Executor for MockTx {
    type Cursor = MockCursor;
    type Outcome = MockOutcome;

    async fn execute(&mut self, statement: &str) -> Result<MockOutcome> {
        self.conn.execute(statement).await
    }

    async fn query(&mut self, statement: &str) -> Result<MockCursor> {
        self.conn.query(statement).await
    }
}

impl TxHandle for MockTx {
    async fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.conn.record("COMMIT");
        Ok(())
    }

    async fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.conn.record("ROLLBACK");
        Ok(())
    }
}

impl Drop for MockTx {
    fn drop(&mut self) {
        if !self.finished {
            self.conn.record("ROLLBACK");
        }
    }
}

pub fn text(s: &str) -> DbValue {
    DbValue::Text(s.to_string())
}
