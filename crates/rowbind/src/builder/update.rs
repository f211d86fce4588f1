//! UPDATE builder.

use super::BuiltStatement;
use crate::entity::Record;
use crate::error::{OrmError, OrmResult};
use crate::naming::qualify;
use crate::statement::Statement;

/// Audit columns never written by an update.
const AUDIT_COLUMNS: [&str; 2] = ["created_at", "updated_at"];

impl Statement {
    /// Build `UPDATE <table> SET col=?,... WHERE ...` from `record`.
    ///
    /// The primary key and the audit columns are not written. Without registered conditions
    /// the statement targets the record's primary key.
    pub fn build_update<T: Record>(mut self, record: &T) -> OrmResult<BuiltStatement> {
        self.map_record(Some(record), false)?;
        self.compose_conditions();

        let entity = T::entity();
        let pk = entity
            .qualified_primary_key()
            .unwrap_or_else(|| qualify(&self.table, "id"));
        let mut excluded = vec![pk];
        excluded.extend(AUDIT_COLUMNS.iter().map(|c| qualify(&self.table, c)));

        let mut set = Vec::new();
        let mut args = Vec::new();
        for (i, column) in self.columns.iter().enumerate() {
            if excluded.contains(column) {
                continue;
            }
            set.push(format!("{}=?", self.bare_columns[i]));
            args.push(self.values[i].clone());
        }

        if set.is_empty() {
            return Err(OrmError::Build(format!(
                "nothing to update on `{}`",
                entity.type_name()
            )));
        }

        let mut sql = format!("UPDATE {} SET {}", self.table, set.join(","));
        self.push_predicate(&mut sql, &mut args, record)?;
        Ok(BuiltStatement { sql, args })
    }
}
