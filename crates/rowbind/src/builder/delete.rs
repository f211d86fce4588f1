//! DELETE builder.

use super::BuiltStatement;
use crate::entity::Record;
use crate::error::OrmResult;
use crate::statement::Statement;

impl Statement {
    /// Build `DELETE FROM <table> WHERE ...`.
    ///
    /// Without registered conditions the statement targets the record's primary key.
    pub fn build_delete<T: Record>(mut self, record: &T) -> OrmResult<BuiltStatement> {
        self.map_record(Some(record), false)?;
        self.compose_conditions();

        let mut sql = format!("DELETE FROM {}", self.table);
        let mut args = Vec::new();
        self.push_predicate(&mut sql, &mut args, record)?;
        Ok(BuiltStatement { sql, args })
    }
}
