//! SELECT and existence-check builders.

use super::BuiltStatement;
use crate::entity::Record;
use crate::error::{OrmError, OrmResult};
use crate::materialize::Layout;
use crate::statement::Statement;

/// A built SELECT plus the layout needed to materialize its rows.
#[derive(Debug, Clone)]
pub struct SelectPlan {
    pub statement: BuiltStatement,
    pub layout: Layout,
}

impl Statement {
    /// Build `SELECT ... FROM <table>` for `T`, including registered relations.
    pub fn build_select<T: Record>(mut self) -> OrmResult<SelectPlan> {
        let layout = self.map_record::<T>(None, true)?;
        self.compose_conditions();

        let sql = self.render_select();
        Ok(SelectPlan {
            statement: BuiltStatement {
                sql,
                args: self.args,
            },
            layout,
        })
    }

    /// Build `SELECT EXISTS(SELECT 1 FROM <table> ... LIMIT 1)` for `T`.
    pub fn build_exists<T: Record>(mut self) -> OrmResult<BuiltStatement> {
        let entity = T::entity();
        if entity.scalar_count() == 0 {
            return Err(OrmError::InvalidRecord(entity.type_name()));
        }
        self.bind(entity);
        self.compose_conditions();

        self.select.clear();
        self.select(&["1"]);
        self.limit(1);

        let sql = format!("SELECT EXISTS({})", self.render_select());
        Ok(BuiltStatement {
            sql,
            args: self.args,
        })
    }

    /// Assemble the clauses in their fixed order.
    fn render_select(&self) -> String {
        let mut sql = if self.select.is_empty() {
            format!("SELECT {}", self.columns.join(","))
        } else {
            self.select.clone()
        };

        sql.push_str(" FROM ");
        sql.push_str(&self.table);
        for clause in [
            &self.joins,
            &self.where_sql,
            &self.group_by,
            &self.having,
            &self.order_by,
            &self.offset,
            &self.limit,
        ] {
            sql.push_str(clause);
        }
        sql
    }
}
