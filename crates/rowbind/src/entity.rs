//! Record descriptors.
//!
//! An [`Entity`] is the table/column/relation metadata of a record type. It is built once per
//! type by the code `#[derive(Record)]` generates and cached for the life of the process.

use crate::client::RawRow;
use crate::error::OrmResult;
use crate::materialize::Slot;
use crate::naming;
use crate::value::Value;
use std::any::TypeId;
use std::fmt;

/// Decoding rule of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bytes,
    Text,
    Bool,
    Int,
    Float,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Bytes => "bytes",
            ScalarKind::Text => "string",
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
        }
    }
}

/// The related record type of a relation field.
#[derive(Clone, Copy)]
pub struct RelationTarget {
    entity: fn() -> &'static Entity,
    type_id: fn() -> TypeId,
}

impl RelationTarget {
    pub fn of<T: Record>() -> Self {
        Self {
            entity: T::entity,
            type_id: TypeId::of::<T>,
        }
    }

    pub fn entity(&self) -> &'static Entity {
        (self.entity)()
    }

    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }
}

impl fmt::Debug for RelationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Resolving the entity here could recurse through cyclic relations.
        f.debug_struct("RelationTarget")
            .field("type_id", &self.type_id())
            .finish()
    }
}

/// Classification of a record field, computed once per record type.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Mapped directly to one column.
    Scalar(ScalarKind),
    /// A related record populated through a foreign-key join.
    Relation(RelationTarget),
    /// A collection of related records aggregated into one JSON column.
    ///
    /// `contains` is the related table's column whose values are listed in this record's JSON
    /// array column.
    JsonAggregate {
        target: RelationTarget,
        contains: &'static str,
    },
}

impl FieldKind {
    pub fn is_scalar(&self) -> bool {
        matches!(self, FieldKind::Scalar(_))
    }
}

/// Field declaration emitted by `#[derive(Record)]`.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub column: Option<&'static str>,
    pub kind: FieldKind,
    pub primary_key: bool,
}

impl FieldSpec {
    pub fn scalar(name: &'static str, kind: ScalarKind) -> Self {
        Self {
            name,
            column: None,
            kind: FieldKind::Scalar(kind),
            primary_key: false,
        }
    }

    pub fn relation<T: Record>(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            kind: FieldKind::Relation(RelationTarget::of::<T>()),
            primary_key: false,
        }
    }

    pub fn json_aggregate<T: Record>(name: &'static str, contains: &'static str) -> Self {
        Self {
            name,
            column: None,
            kind: FieldKind::JsonAggregate {
                target: RelationTarget::of::<T>(),
                contains,
            },
            primary_key: false,
        }
    }

    pub fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// A field with its resolved column name.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub column: String,
    pub kind: FieldKind,
}

/// Table/column/relation metadata for a record type.
#[derive(Debug, Clone)]
pub struct Entity {
    type_name: &'static str,
    table: String,
    fields: Vec<FieldDescriptor>,
    primary_key: Option<usize>,
}

impl Entity {
    /// Resolve names for a record type.
    ///
    /// The table defaults to the pluralized snake_case type name and columns to the snake_case
    /// field names. The primary key is the field marked as such, else the field mapped to `id`.
    pub fn new(type_name: &'static str, table: Option<&str>, specs: &[FieldSpec]) -> Self {
        let table = table.map_or_else(|| naming::table_name(type_name), str::to_string);

        let fields: Vec<FieldDescriptor> = specs
            .iter()
            .map(|spec| FieldDescriptor {
                name: spec.name,
                column: spec
                    .column
                    .map_or_else(|| naming::column_name(spec.name), str::to_string),
                kind: spec.kind,
            })
            .collect();

        let primary_key = specs.iter().position(|s| s.primary_key).or_else(|| {
            fields
                .iter()
                .position(|f| f.kind.is_scalar() && f.column == "id")
        });

        Self {
            type_name,
            table,
            fields,
            primary_key,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Index of the primary-key field.
    pub fn primary_key_index(&self) -> Option<usize> {
        self.primary_key
    }

    pub fn primary_key(&self) -> Option<&FieldDescriptor> {
        self.primary_key.map(|i| &self.fields[i])
    }

    /// `<table>.<pk column>`, if the record has a primary key.
    pub fn qualified_primary_key(&self) -> Option<String> {
        self.primary_key()
            .map(|f| naming::qualify(&self.table, &f.column))
    }

    /// Number of fields mapped directly to columns.
    pub fn scalar_count(&self) -> usize {
        self.fields.iter().filter(|f| f.kind.is_scalar()).count()
    }
}

/// A typed row of a table.
///
/// Implemented by `#[derive(Record)]`; field indexes refer to [`Entity::fields`].
pub trait Record: Default + Send + Sync + 'static {
    /// Cached descriptor of this type.
    fn entity() -> &'static Entity;

    /// Value of the scalar field at `index`, `None` for relation fields.
    fn value(&self, index: usize) -> Option<Value>;

    /// Decode a raw column value into the scalar field at `index`.
    fn decode_field(&mut self, index: usize, raw: Option<&[u8]>) -> OrmResult<()>;

    /// Populate the relation field at `index` from `row`.
    fn fill_relation(&mut self, index: usize, row: &RawRow, slot: &Slot) -> OrmResult<()> {
        let _ = (index, row, slot);
        Ok(())
    }

    /// Value of the primary key, if the type has one.
    fn primary_key_value(&self) -> Option<Value> {
        Self::entity()
            .primary_key_index()
            .and_then(|i| self.value(i))
    }
}

/// Container types a relation field may use around its related record.
///
/// `Option<Box<T>>` is not covered here, since it would overlap `Option<T>`; the derive fills
/// such fields with [`crate::fill_boxed`].
pub trait Related: Default {
    type Target: Record;

    /// Store materialized related records; single-record containers keep the first.
    fn assign(&mut self, items: Vec<Self::Target>);
}

impl<T: Record> Related for Option<T> {
    type Target = T;

    fn assign(&mut self, items: Vec<T>) {
        *self = items.into_iter().next();
    }
}

impl<T: Record> Related for Box<T> {
    type Target = T;

    fn assign(&mut self, items: Vec<T>) {
        if let Some(first) = items.into_iter().next() {
            **self = first;
        }
    }
}

impl<T: Record> Related for Vec<T> {
    type Target = T;

    fn assign(&mut self, items: Vec<T>) {
        *self = items;
    }
}
