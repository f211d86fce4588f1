//! Driver boundary.

use crate::error::OrmResult;
use crate::value::Value;
use bytes::Bytes;

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Identifier generated by the statement, for drivers that report one.
    pub last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }
}

/// One result row as raw, type-erased column values (`None` is SQL NULL).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    values: Vec<Option<Bytes>>,
}

impl RawRow {
    pub fn new(values: Vec<Option<Bytes>>) -> Self {
        Self { values }
    }

    /// Build a row from textual cells.
    pub fn from_text<'a>(cells: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        Self {
            values: cells
                .into_iter()
                .map(|c| c.map(|s| Bytes::copy_from_slice(s.as_bytes())))
                .collect(),
        }
    }

    /// Raw bytes of column `index`; `None` for NULL or an out-of-range index.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A relational connection that understands positional `?` placeholders.
///
/// Statements are built once and executed in a single driver call, so `args` always lines up
/// with the placeholders left to right.
pub trait Connection: Send + Sync {
    /// Execute a statement and report affected rows.
    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<ExecResult>> + Send;

    /// Execute a query and return every row.
    fn query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<RawRow>>> + Send;

    /// Execute SQL text that may contain several statements and no placeholders.
    fn batch_execute(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<()>> + Send;
}

impl<C: Connection> Connection for &C {
    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<ExecResult>> + Send {
        (**self).execute(sql, args)
    }

    fn query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<RawRow>>> + Send {
        (**self).query(sql, args)
    }

    fn batch_execute(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<()>> + Send {
        (**self).batch_execute(sql)
    }
}
