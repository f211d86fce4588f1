//! Record mapping plus condition and join composition.

use crate::entity::{Entity, FieldDescriptor, FieldKind, Record, RelationTarget};
use crate::error::{OrmError, OrmResult};
use crate::materialize::{Layout, Slot};
use crate::naming::qualify;
use crate::statement::{RelationKind, Statement};
use crate::value::Value;

impl Statement {
    /// Map `T` (and the values of `record`, for writes) into the column and value lists.
    ///
    /// The first record mapped binds the statement's table. With `with_relations`, registered
    /// relation fields add their columns and join clauses; the returned [`Layout`] records where
    /// each field's columns landed.
    pub(crate) fn map_record<T: Record>(
        &mut self,
        record: Option<&T>,
        with_relations: bool,
    ) -> OrmResult<Layout> {
        let entity = T::entity();
        if entity.scalar_count() == 0 {
            return Err(OrmError::InvalidRecord(entity.type_name()));
        }
        self.bind(entity);

        let values: Option<Vec<Option<Value>>> =
            record.map(|r| (0..entity.fields().len()).map(|i| r.value(i)).collect());

        let mut claimed = vec![false; self.relations.len()];
        let layout = self.map_entity(entity, values.as_deref(), with_relations, &mut claimed);

        if self.aggregated {
            self.group_aggregate(entity);
        }
        Ok(layout)
    }

    /// Group by the bound record's key and the key of every joined relation, so each joined
    /// column is functionally dependent on the grouping.
    fn group_aggregate(&mut self, entity: &'static Entity) {
        let keys: Vec<String> = entity
            .qualified_primary_key()
            .into_iter()
            .chain(std::mem::take(&mut self.joined_keys))
            .collect();
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.group_by(&keys);
    }

    fn map_entity(
        &mut self,
        entity: &'static Entity,
        values: Option<&[Option<Value>]>,
        with_relations: bool,
        claimed: &mut [bool],
    ) -> Layout {
        let mut slots = Vec::with_capacity(entity.fields().len());

        for (i, field) in entity.fields().iter().enumerate() {
            let slot = match field.kind {
                FieldKind::Scalar(_) => {
                    let value = values.and_then(|v| v[i].clone()).unwrap_or_default();
                    Slot::Column(self.push_column(
                        qualify(entity.table(), &field.column),
                        &field.column,
                        value,
                    ))
                }
                FieldKind::Relation(target) if with_relations => {
                    match self.claim(target, false, claimed) {
                        Some(foreign_key) => {
                            Slot::Joined(self.compose_join(entity, target, &foreign_key, claimed))
                        }
                        None => Slot::Unmapped,
                    }
                }
                FieldKind::JsonAggregate { target, contains } if with_relations => {
                    match self.claim(target, true, claimed) {
                        Some(_) => Slot::Aggregate(self.compose_aggregate(
                            entity,
                            field,
                            target.entity(),
                            contains,
                        )),
                        None => Slot::Unmapped,
                    }
                }
                _ => Slot::Unmapped,
            };
            slots.push(slot);
        }

        Layout::new(entity, slots)
    }

    fn push_column(&mut self, qualified: String, bare: &str, value: Value) -> usize {
        self.columns.push(qualified);
        self.bare_columns.push(bare.to_string());
        self.values.push(value);
        self.columns.len() - 1
    }

    /// Find the first unclaimed registration for `target` and return its foreign key.
    fn claim(
        &self,
        target: RelationTarget,
        aggregate: bool,
        claimed: &mut [bool],
    ) -> Option<String> {
        let type_id = target.type_id();
        let index = self.relations.iter().enumerate().position(|(i, r)| {
            !claimed[i]
                && r.target.type_id() == type_id
                && matches!(r.kind, RelationKind::JsonAggregate) == aggregate
        })?;
        claimed[index] = true;
        match &self.relations[index].kind {
            RelationKind::ForeignKey(fk) => Some(fk.clone()),
            RelationKind::JsonAggregate => Some(String::new()),
        }
    }

    fn compose_join(
        &mut self,
        parent: &'static Entity,
        target: RelationTarget,
        foreign_key: &str,
        claimed: &mut [bool],
    ) -> Layout {
        let related = target.entity();
        let related_table = related.table();
        let related_pk = related.primary_key().map_or("id", |f| f.column.as_str());

        self.joins.push_str(&format!(
            " LEFT JOIN {related_table} ON {related_table}.{related_pk} = {}.{foreign_key}",
            parent.table()
        ));
        self.joined_keys.push(qualify(related_table, related_pk));

        self.map_entity(related, None, true, claimed)
    }

    fn compose_aggregate(
        &mut self,
        parent: &'static Entity,
        field: &FieldDescriptor,
        related: &'static Entity,
        contains: &str,
    ) -> usize {
        let table = parent.table();
        let related_table = related.table();
        let related_pk = related.primary_key().map_or("id", |f| f.column.as_str());

        let members: Vec<String> = related
            .fields()
            .iter()
            .filter(|f| f.kind.is_scalar())
            .map(|f| format!("'{0}', {related_table}.{0}", f.column))
            .collect();

        let expr = format!(
            "COALESCE(json_agg(json_build_object({})) FILTER (WHERE {related_table}.{related_pk} IS NOT NULL), '[]') AS {}",
            members.join(", "),
            field.column
        );
        let index = self.push_column(expr, &field.column, Value::Null);

        self.joins.push_str(&format!(
            " LEFT JOIN {related_table} ON {table}.{}::jsonb @> to_jsonb({related_table}.{contains}::text)",
            field.column
        ));

        self.aggregated = true;
        index
    }

    /// Render registered conditions into `where_sql`, appending one argument per placeholder.
    pub(crate) fn compose_conditions(&mut self) {
        for condition in &self.conditions {
            let column = if !condition.column.contains('.') && self.model.is_some() {
                qualify(&self.table, &condition.column)
            } else {
                condition.column.clone()
            };

            if self.where_sql.is_empty() {
                self.where_sql = format!(" WHERE {column} {} ?", condition.operator);
            } else {
                self.where_sql
                    .push_str(&format!(" AND {column} {} ?", condition.operator));
            }
            self.args.push(condition.value.clone());
        }
    }
}
