#![allow(dead_code)]

use rowbind::{Connection, ExecResult, OrmResult, RawRow, Record, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A statement the stub received.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub args: Vec<Value>,
}

/// Records every statement and replays queued results in order.
#[derive(Debug, Default)]
pub struct StubConnection {
    calls: Mutex<Vec<Call>>,
    rows: Mutex<VecDeque<Vec<RawRow>>>,
    affected: Mutex<VecDeque<u64>>,
}

impl StubConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result set of the next query.
    pub fn push_rows(&self, rows: Vec<RawRow>) -> &Self {
        self.rows.lock().unwrap().push_back(rows);
        self
    }

    /// Queue the affected-row count of the next write; unqueued writes affect one row.
    pub fn push_affected(&self, n: u64) -> &Self {
        self.affected.lock().unwrap().push_back(n);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> Call {
        self.calls
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no statement was executed")
    }

    fn record(&self, sql: &str, args: &[Value]) {
        self.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
    }
}

impl Connection for StubConnection {
    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.record(sql, args);
        let n = self.affected.lock().unwrap().pop_front().unwrap_or(1);
        Ok(ExecResult::new(n))
    }

    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<RawRow>> {
        self.record(sql, args);
        Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        self.record(sql, &[]);
        Ok(())
    }
}

/// Render values the way the Postgres adapter hands them back.
pub fn row_of(values: &[Value]) -> RawRow {
    let cells: Vec<Option<String>> = values
        .iter()
        .map(|v| match v {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Value::Json(j) => Some(j.to_string()),
        })
        .collect();
    RawRow::from_text(cells.iter().map(|c| c.as_deref()))
}

pub fn text_row(cells: &[Option<&str>]) -> RawRow {
    RawRow::from_text(cells.iter().copied())
}

#[derive(Debug, Clone, Default, PartialEq, Record)]
#[orm(table = "people")]
pub struct Person {
    pub id: i64,
    pub name: String,
    #[orm(column = "email_address")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Record)]
pub struct Post {
    pub id: Option<i64>,
    pub title: String,
    pub published: bool,
    pub score: f64,
    pub author_id: i64,
    #[orm(relation)]
    pub author: Option<Person>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Record)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub post_id: i64,
    #[orm(relation)]
    pub post: Box<Post>,
}

#[derive(Debug, Clone, Default, PartialEq, Record)]
pub struct Reply {
    pub id: i64,
    pub body: String,
    pub author_id: i64,
    #[orm(relation)]
    pub author: Option<Box<Person>>,
}

#[derive(Debug, Clone, Default, PartialEq, Record)]
pub struct Widget {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Record)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Record)]
pub struct Article {
    pub id: i64,
    pub title: String,
    #[orm(json_agg = "id", column = "tag_ids")]
    pub tags: Vec<Tag>,
}

/// No primary key.
#[derive(Debug, Clone, Default, PartialEq, Record)]
pub struct AuditEntry {
    pub message: String,
}
