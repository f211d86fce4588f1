//! INSERT builder.

use super::BuiltStatement;
use crate::entity::Record;
use crate::error::OrmResult;
use crate::statement::Statement;

impl Statement {
    /// Build `INSERT INTO <table> (<columns>) VALUES (?,...)` from `record`.
    ///
    /// A primary key whose value is NULL is left out so the database assigns it.
    pub fn build_insert<T: Record>(mut self, record: &T) -> OrmResult<BuiltStatement> {
        self.map_record(Some(record), false)?;

        let pk = T::entity().qualified_primary_key();
        let values = std::mem::take(&mut self.values);

        let mut columns = Vec::with_capacity(values.len());
        let mut args = Vec::with_capacity(values.len());
        for ((qualified, bare), value) in self.columns.iter().zip(&self.bare_columns).zip(values) {
            if value.is_null() && pk.as_deref() == Some(qualified.as_str()) {
                continue;
            }
            columns.push(bare.as_str());
            args.push(value);
        }

        let placeholders = vec!["?"; columns.len()].join(",");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(","),
            placeholders
        );
        Ok(BuiltStatement { sql, args })
    }
}
