//! Statement builders.
//!
//! Each builder consumes a [`Statement`], maps the record type into it, composes conditions
//! and joins, and returns the final SQL text with its positional arguments.
//!
//! ```ignore
//! let mut st = Statement::new();
//! st.eq("title", "hello").join::<Person>("author_id");
//! let plan = st.build_select::<Post>()?;
//! assert_eq!(
//!     plan.statement.sql,
//!     "SELECT posts.id,posts.title,posts.author_id,people.id,people.name FROM posts \
//!      LEFT JOIN people ON people.id = posts.author_id WHERE posts.title = ?"
//! );
//! ```

mod delete;
mod insert;
mod select;
mod update;

use crate::entity::Record;
use crate::error::{OrmError, OrmResult};
use crate::statement::Statement;
use crate::value::Value;

pub use select::SelectPlan;

/// Final SQL text and its arguments, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltStatement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl BuiltStatement {
    /// Number of `?` markers in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

impl Statement {
    /// ` WHERE <table>.<pk> = ?` and the record's primary-key value.
    fn default_predicate<T: Record>(&self, record: &T) -> OrmResult<(String, Value)> {
        let entity = T::entity();
        let pk = entity
            .qualified_primary_key()
            .ok_or(OrmError::MissingPrimaryKey(entity.type_name()))?;
        let value = record.primary_key_value().unwrap_or_default();
        Ok((format!(" WHERE {pk} = ?"), value))
    }

    /// Append the explicit WHERE clause, or the primary-key default when none was registered.
    fn push_predicate<T: Record>(
        &mut self,
        sql: &mut String,
        args: &mut Vec<Value>,
        record: &T,
    ) -> OrmResult<()> {
        if self.where_sql.is_empty() {
            let (clause, value) = self.default_predicate(record)?;
            sql.push_str(&clause);
            args.push(value);
        } else {
            sql.push_str(&self.where_sql);
            args.append(&mut self.args);
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "derive"))]
mod tests;
