//! Execution facade.
//!
//! [`Db`] pairs a [`Connection`] with the [`Statement`] being configured. Fluent calls mutate
//! the statement; each terminal operation takes it out of the handle, builds the SQL, runs it
//! and materializes the result, so the next call always starts from a clean state.
//!
//! ```ignore
//! let mut db = Db::new(client);
//! let posts: Vec<Post> = db
//!     .join::<Person>("author_id")
//!     .eq("published", true)
//!     .order_by("id", Direction::Desc)
//!     .limit(10)
//!     .get()
//!     .await?;
//! ```

use crate::builder::{BuiltStatement, SelectPlan};
use crate::client::{Connection, ExecResult, RawRow};
use crate::entity::Record;
use crate::error::{OrmError, OrmResult};
use crate::materialize::{decode, materialize_all};
use crate::statement::{Direction, Statement};
use crate::value::Value;

const MAX_LOGGED_SQL: usize = 200;

/// The kind of statement being executed, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Exists,
    Insert,
    Update,
    Delete,
    Raw,
}

/// A connection handle plus the statement being configured on it.
#[derive(Debug)]
pub struct Db<C> {
    conn: C,
    state: Statement,
}

impl<C: Connection> Db<C> {
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            state: Statement::new(),
        }
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn into_inner(self) -> C {
        self.conn
    }

    /// The statement configured so far.
    pub fn statement(&self) -> &Statement {
        &self.state
    }

    pub fn select(&mut self, columns: &[&str]) -> &mut Self {
        self.state.select(columns);
        self
    }

    /// Join `T` through `foreign_key` on the bound table.
    pub fn join<T: Record>(&mut self, foreign_key: &str) -> &mut Self {
        self.state.join::<T>(foreign_key);
        self
    }

    /// Populate JSON-aggregate fields holding `T`.
    pub fn aggregate<T: Record>(&mut self) -> &mut Self {
        self.state.aggregate::<T>();
        self
    }

    pub fn filter(&mut self, column: &str, operator: &str, value: impl Into<Value>) -> &mut Self {
        self.state.filter(column, operator, value);
        self
    }

    pub fn eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.state.eq(column, value);
        self
    }

    pub fn group_by(&mut self, columns: &[&str]) -> &mut Self {
        self.state.group_by(columns);
        self
    }

    pub fn having(&mut self, expr: &str) -> &mut Self {
        self.state.having(expr);
        self
    }

    pub fn order_by(&mut self, column: &str, direction: Direction) -> &mut Self {
        self.state.order_by(column, direction);
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.state.limit(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.state.offset(offset);
        self
    }

    /// Discard everything configured so far.
    pub fn reset(&mut self) -> &mut Self {
        self.state.reset();
        self
    }

    fn take(&mut self) -> Statement {
        std::mem::take(&mut self.state)
    }

    /// Fetch every `T` matching the configured statement.
    pub async fn get<T: Record>(&mut self) -> OrmResult<Vec<T>> {
        let SelectPlan { statement, layout } = self.take().build_select::<T>()?;
        let rows = self.query(StatementKind::Select, &statement).await?;
        materialize_all(&rows, &layout)
    }

    /// Fetch the first matching `T`, if any.
    pub async fn first<T: Record>(&mut self) -> OrmResult<Option<T>> {
        self.state.limit(1);
        Ok(self.get::<T>().await?.into_iter().next())
    }

    /// Whether any `T` matches the configured conditions.
    pub async fn exists<T: Record>(&mut self) -> OrmResult<bool> {
        let statement = self.take().build_exists::<T>()?;
        let rows = self.query(StatementKind::Exists, &statement).await?;
        match rows.as_slice() {
            [row] => Ok(decode::boolean(row.get(0))),
            _ => Err(OrmError::UnexpectedRowCount {
                expected: 1,
                got: rows.len(),
            }),
        }
    }

    /// Insert `record` into its table.
    pub async fn insert<T: Record>(&mut self, record: &T) -> OrmResult<ExecResult> {
        let statement = self.take().build_insert(record)?;
        self.execute(StatementKind::Insert, &statement).await
    }

    /// Update `record`, by primary key unless conditions were configured.
    ///
    /// Touching no row is an error.
    pub async fn save<T: Record>(&mut self, record: &T) -> OrmResult<u64> {
        let statement = self.take().build_update(record)?;
        let result = self.execute(StatementKind::Update, &statement).await?;
        if result.rows_affected == 0 {
            return Err(OrmError::NoRowsAffected(format!(
                "update of `{}` matched no rows",
                T::entity().type_name()
            )));
        }
        Ok(result.rows_affected)
    }

    /// Delete `record`, by primary key unless conditions were configured.
    pub async fn delete<T: Record>(&mut self, record: &T) -> OrmResult<u64> {
        let statement = self.take().build_delete(record)?;
        let result = self.execute(StatementKind::Delete, &statement).await?;
        Ok(result.rows_affected)
    }

    /// Run SQL text as-is. Configured state is discarded.
    pub async fn execute_raw(&mut self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.take();
        log_statement(StatementKind::Raw, sql, args.len());
        self.conn.execute(sql, args).await
    }

    /// Query with SQL text as-is. Configured state is discarded.
    pub async fn query_raw(&mut self, sql: &str, args: &[Value]) -> OrmResult<Vec<RawRow>> {
        self.take();
        log_statement(StatementKind::Raw, sql, args.len());
        self.conn.query(sql, args).await
    }

    /// Run SQL text that may hold several statements and no placeholders.
    pub async fn batch_execute(&mut self, sql: &str) -> OrmResult<()> {
        self.take();
        log_statement(StatementKind::Raw, sql, 0);
        self.conn.batch_execute(sql).await
    }

    async fn query(
        &self,
        kind: StatementKind,
        statement: &BuiltStatement,
    ) -> OrmResult<Vec<RawRow>> {
        log_statement(kind, &statement.sql, statement.args.len());
        self.conn.query(&statement.sql, &statement.args).await
    }

    async fn execute(
        &self,
        kind: StatementKind,
        statement: &BuiltStatement,
    ) -> OrmResult<ExecResult> {
        log_statement(kind, &statement.sql, statement.args.len());
        self.conn.execute(&statement.sql, &statement.args).await
    }
}

fn log_statement(kind: StatementKind, sql: &str, param_count: usize) {
    tracing::debug!(
        target: "rowbind.sql",
        statement = ?kind,
        param_count,
        sql = %truncate_sql(sql, MAX_LOGGED_SQL),
    );
}

fn truncate_sql(sql: &str, max_bytes: usize) -> std::borrow::Cow<'_, str> {
    if sql.len() <= max_bytes {
        return sql.into();
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end]).into()
}
