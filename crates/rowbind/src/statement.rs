//! Per-operation statement state and its fluent configuration.

use crate::entity::{Entity, Record, RelationTarget};
use crate::value::Value;
use std::fmt;

/// A `column op ?` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: String,
    pub value: Value,
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("ASC"),
            Direction::Desc => f.write_str("DESC"),
        }
    }
}

/// How a registered relation is joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// `LEFT JOIN related ON related.pk = parent.<foreign key>`
    ForeignKey(String),
    /// JSON array column aggregated from the related table.
    JsonAggregate,
}

/// A related record type registered for joining.
#[derive(Debug, Clone)]
pub struct Relation {
    pub kind: RelationKind,
    pub target: RelationTarget,
}

impl Relation {
    fn key(&self) -> RegistryKey<'_> {
        match &self.kind {
            RelationKind::ForeignKey(fk) => RegistryKey::ForeignKey(fk),
            RelationKind::JsonAggregate => RegistryKey::Aggregate(self.target.type_id()),
        }
    }
}

#[derive(PartialEq)]
enum RegistryKey<'a> {
    ForeignKey(&'a str),
    Aggregate(std::any::TypeId),
}

/// Accumulated clauses, columns and arguments for one logical statement.
///
/// The state is reset after every terminal operation; see [`crate::Db`].
#[derive(Debug, Clone, Default)]
pub struct Statement {
    pub(crate) select: String,
    pub(crate) joins: String,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) where_sql: String,
    pub(crate) group_by: String,
    pub(crate) having: String,
    pub(crate) order_by: String,
    pub(crate) limit: String,
    pub(crate) offset: String,

    /// Qualified column names; parallel to `values`.
    pub(crate) columns: Vec<String>,
    /// Bare column names; parallel to `columns`.
    pub(crate) bare_columns: Vec<String>,
    pub(crate) values: Vec<Value>,
    /// Arguments for placeholders in predicate clauses, in placeholder order.
    pub(crate) args: Vec<Value>,

    /// `<table>.<pk>` of every joined relation, in join order.
    pub(crate) joined_keys: Vec<String>,
    /// Whether a JSON-aggregate column was mapped.
    pub(crate) aggregated: bool,

    pub(crate) model: Option<&'static Entity>,
    pub(crate) table: String,
    pub(crate) relations: Vec<Relation>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to the zero state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Override the projection: `SELECT a`, then `,b` for every further column.
    pub fn select(&mut self, columns: &[&str]) -> &mut Self {
        for column in columns {
            if self.select.is_empty() {
                self.select = format!("SELECT {column}");
            } else {
                self.select.push(',');
                self.select.push_str(column);
            }
        }
        self
    }

    /// Register `T` as joined through `foreign_key` on the parent table.
    ///
    /// Registering the same foreign key again replaces the earlier relation in place.
    pub fn join<T: Record>(&mut self, foreign_key: &str) -> &mut Self {
        self.register(Relation {
            kind: RelationKind::ForeignKey(foreign_key.to_string()),
            target: RelationTarget::of::<T>(),
        })
    }

    /// Register `T` for a JSON-aggregate relation field.
    pub fn aggregate<T: Record>(&mut self) -> &mut Self {
        self.register(Relation {
            kind: RelationKind::JsonAggregate,
            target: RelationTarget::of::<T>(),
        })
    }

    fn register(&mut self, relation: Relation) -> &mut Self {
        match self
            .relations
            .iter()
            .position(|r| r.key() == relation.key())
        {
            Some(i) => self.relations[i] = relation,
            None => self.relations.push(relation),
        }
        self
    }

    /// Append a `column operator ?` condition.
    pub fn filter(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.conditions.push(Condition {
            column: column.to_string(),
            operator: operator.to_string(),
            value: value.into(),
        });
        self
    }

    /// Append a `column = ?` condition.
    pub fn eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.filter(column, "=", value)
    }

    pub fn group_by(&mut self, columns: &[&str]) -> &mut Self {
        for column in columns {
            if self.group_by.is_empty() {
                self.group_by = format!(" GROUP BY {column}");
            } else {
                self.group_by.push(',');
                self.group_by.push_str(column);
            }
        }
        self
    }

    /// Append a raw `HAVING` expression; further calls are `AND`-joined.
    pub fn having(&mut self, expr: &str) -> &mut Self {
        if self.having.is_empty() {
            self.having = format!(" HAVING {expr}");
        } else {
            self.having.push_str(" AND ");
            self.having.push_str(expr);
        }
        self
    }

    pub fn order_by(&mut self, column: &str, direction: Direction) -> &mut Self {
        if self.order_by.is_empty() {
            self.order_by = format!(" ORDER BY {column} {direction}");
        } else {
            self.order_by.push_str(&format!(",{column} {direction}"));
        }
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = format!(" LIMIT {limit}");
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = format!(" OFFSET {offset}");
        self
    }

    /// Registered relations, in registration order.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Table bound by the first record mapped into this statement.
    pub fn table(&self) -> Option<&str> {
        self.model.map(|_| self.table.as_str())
    }

    /// Bind `entity` as the statement's model unless one is already bound.
    pub(crate) fn bind(&mut self, entity: &'static Entity) {
        if self.model.is_none() {
            self.model = Some(entity);
            self.table = entity.table().to_string();
        }
    }
}
