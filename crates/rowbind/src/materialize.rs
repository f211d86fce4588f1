//! Result materialization: raw rows back into records.

use crate::client::RawRow;
use crate::entity::{Entity, FieldKind, Record, Related};
use crate::error::OrmResult;
use serde_json::Value as JsonValue;

/// Where each field of a record was mapped in the projected column list.
#[derive(Debug, Clone)]
pub struct Layout {
    entity: &'static Entity,
    slots: Vec<Slot>,
}

/// Column position of one field.
#[derive(Debug, Clone)]
pub enum Slot {
    /// Not projected; the field keeps its default value.
    Unmapped,
    /// Scalar field read from the column at this index.
    Column(usize),
    /// Relation field populated from a joined table.
    Joined(Layout),
    /// JSON-aggregate field read from the computed column at this index.
    Aggregate(usize),
}

impl Layout {
    pub(crate) fn new(entity: &'static Entity, slots: Vec<Slot>) -> Self {
        Self { entity, slots }
    }

    pub fn entity(&self) -> &'static Entity {
        self.entity
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Whether a left-joined record is missing from `row` (its primary key is NULL).
    fn is_absent(&self, row: &RawRow) -> bool {
        match self.entity.primary_key_index().map(|i| &self.slots[i]) {
            Some(Slot::Column(c)) => row.get(*c).is_none(),
            _ => false,
        }
    }
}

/// Decode one row into a `T` according to `layout`.
pub fn materialize<T: Record>(row: &RawRow, layout: &Layout) -> OrmResult<T> {
    let mut record = T::default();

    for (index, slot) in layout.slots.iter().enumerate() {
        match slot {
            Slot::Unmapped => {}
            Slot::Column(c) => record.decode_field(index, row.get(*c))?,
            Slot::Joined(_) | Slot::Aggregate(_) => record.fill_relation(index, row, slot)?,
        }
    }

    Ok(record)
}

/// Decode every row; zero rows is an empty result.
pub fn materialize_all<T: Record>(rows: &[RawRow], layout: &Layout) -> OrmResult<Vec<T>> {
    rows.iter().map(|row| materialize(row, layout)).collect()
}

/// Populate a relation field held in a container (`Option<T>`, `Box<T>`, `Vec<T>`, ...).
pub fn fill_related<R: Related>(
    target: &mut R,
    field: &str,
    row: &RawRow,
    slot: &Slot,
) -> OrmResult<()> {
    match slot {
        Slot::Joined(layout) => {
            if !layout.is_absent(row) {
                target.assign(vec![materialize::<R::Target>(row, layout)?]);
            }
        }
        Slot::Aggregate(c) => target.assign(decode_aggregate::<R::Target>(row.get(*c), field)?),
        Slot::Unmapped | Slot::Column(_) => {}
    }
    Ok(())
}

/// Populate a relation field that holds the related record directly.
pub fn fill_record<T: Record>(
    target: &mut T,
    field: &str,
    row: &RawRow,
    slot: &Slot,
) -> OrmResult<()> {
    let mut holder: Option<T> = None;
    fill_related(&mut holder, field, row, slot)?;
    if let Some(record) = holder {
        *target = record;
    }
    Ok(())
}

/// Populate an `Option<Box<T>>` relation field.
pub fn fill_boxed<T: Record>(
    target: &mut Option<Box<T>>,
    field: &str,
    row: &RawRow,
    slot: &Slot,
) -> OrmResult<()> {
    let mut holder: Option<T> = None;
    fill_related(&mut holder, field, row, slot)?;
    if let Some(record) = holder {
        *target = Some(Box::new(record));
    }
    Ok(())
}

/// Decode a JSON array of objects into related records.
///
/// Best effort: a missing or malformed array yields no records. Object members are decoded
/// with the same rules as raw columns, so a member that does not fit its field is still an
/// error.
fn decode_aggregate<T: Record>(raw: Option<&[u8]>, field: &str) -> OrmResult<Vec<T>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let objects: Vec<serde_json::Map<String, JsonValue>> = match serde_json::from_slice(raw) {
        Ok(objects) => objects,
        Err(err) => {
            tracing::warn!(target: "rowbind.decode", field, error = %err, "ignoring malformed JSON aggregate");
            return Ok(Vec::new());
        }
    };

    let entity = T::entity();
    let mut items = Vec::with_capacity(objects.len());
    for object in objects {
        let mut item = T::default();
        for (index, f) in entity.fields().iter().enumerate() {
            if !matches!(f.kind, FieldKind::Scalar(_)) {
                continue;
            }
            let text = object.get(&f.column).and_then(json_member_text);
            item.decode_field(index, text.as_deref().map(str::as_bytes))?;
        }
        items.push(item);
    }
    Ok(items)
}

fn json_member_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(true) => Some(decode::TRUTHY.to_string()),
        JsonValue::Bool(false) => Some("0".to_string()),
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Decoding rules for raw column bytes, one per [`crate::ScalarKind`].
pub mod decode {
    use crate::error::{OrmError, OrmResult};
    use std::str::FromStr;

    /// Raw value a boolean column must equal to decode as `true`.
    pub const TRUTHY: &str = "1";

    pub fn bytes(raw: Option<&[u8]>) -> Vec<u8> {
        raw.map(<[u8]>::to_vec).unwrap_or_default()
    }

    pub fn text(raw: Option<&[u8]>, field: &str) -> OrmResult<String> {
        match raw {
            None => Ok(String::new()),
            Some(b) => String::from_utf8(b.to_vec())
                .map_err(|e| OrmError::decode(field, format!("as string: {e}"))),
        }
    }

    pub fn boolean(raw: Option<&[u8]>) -> bool {
        raw == Some(TRUTHY.as_bytes())
    }

    pub fn integer<T>(raw: Option<&[u8]>, field: &str) -> OrmResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let text = text(raw, field)?;
        text.parse::<T>()
            .map_err(|e| OrmError::decode(field, format!("as int: {e}")))
    }

    pub fn float<T>(raw: Option<&[u8]>, field: &str) -> OrmResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let text = text(raw, field)?;
        text.parse::<T>()
            .map_err(|e| OrmError::decode(field, format!("as float: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_compares_against_truthy_marker() {
        assert!(decode::boolean(Some(b"1")));
        assert!(!decode::boolean(Some(b"0")));
        assert!(!decode::boolean(Some(b"true")));
        assert!(!decode::boolean(None));
    }

    #[test]
    fn null_text_and_bytes_are_empty() {
        assert_eq!(decode::text(None, "name").unwrap(), "");
        assert!(decode::bytes(None).is_empty());
    }

    #[test]
    fn numeric_null_is_a_decode_error() {
        let err = decode::integer::<i64>(None, "age").unwrap_err();
        assert!(err.to_string().contains("'age'"));
        assert!(decode::float::<f64>(None, "score").is_err());
    }

    #[test]
    fn numbers_parse_base_ten() {
        assert_eq!(decode::integer::<i32>(Some(b"-42"), "n").unwrap(), -42);
        assert_eq!(decode::float::<f64>(Some(b"2.5"), "x").unwrap(), 2.5);
        assert!(decode::integer::<u8>(Some(b"300"), "n").is_err());
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        assert!(decode::text(Some(&[0xff, 0xfe]), "name").is_err());
    }

    #[cfg(feature = "derive")]
    mod layouts {
        use super::*;
        use crate::fixtures::{Article, Person, Post, Tag, Widget};
        use crate::statement::Statement;

        fn post_layout() -> Layout {
            let mut st = Statement::new();
            st.join::<Person>("author_id");
            st.build_select::<Post>().unwrap().layout
        }

        #[test]
        fn joined_relation_reads_its_own_offsets() {
            let row = RawRow::from_text([
                Some("1"),
                Some("hello"),
                Some("9"),
                Some("9"),
                Some("ada"),
                Some("2024-01-01"),
                None,
            ]);
            let post: Post = materialize(&row, &post_layout()).unwrap();

            assert_eq!(post.id, 1);
            assert_eq!(post.title, "hello");
            assert_eq!(post.created_at, "2024-01-01");
            assert_eq!(post.updated_at, "");
            assert_eq!(
                post.author,
                Some(Person {
                    id: 9,
                    name: "ada".into()
                })
            );
        }

        #[test]
        fn missing_left_join_leaves_relation_unset() {
            let row = RawRow::from_text([
                Some("1"),
                Some("orphan"),
                Some("0"),
                None,
                None,
                Some("c"),
                Some("u"),
            ]);
            let post: Post = materialize(&row, &post_layout()).unwrap();
            assert_eq!(post.author, None);
        }

        #[test]
        fn unmatched_relation_keeps_default() {
            let layout = Statement::new().build_select::<Post>().unwrap().layout;
            assert!(matches!(layout.slots()[3], Slot::Unmapped));

            let row = RawRow::from_text([Some("1"), Some("t"), Some("2"), Some("c"), Some("u")]);
            let post: Post = materialize(&row, &layout).unwrap();
            assert_eq!(post.author, None);
            assert_eq!(post.updated_at, "u");
        }

        #[test]
        fn decode_error_discards_the_record() {
            let layout = Statement::new().build_select::<Post>().unwrap().layout;
            let row = RawRow::from_text([Some("x"), Some("t"), Some("2"), None, None]);

            let err = materialize::<Post>(&row, &layout).unwrap_err();
            assert!(err.is_decode());
            assert!(err.to_string().contains("'id'"));
        }

        #[test]
        fn zero_rows_is_an_empty_result() {
            let layout = Statement::new().build_select::<Widget>().unwrap().layout;
            let widgets: Vec<Widget> = materialize_all(&[], &layout).unwrap();
            assert!(widgets.is_empty());
        }

        #[test]
        fn boolean_columns_use_truthy_marker() {
            let layout = Statement::new().build_select::<Widget>().unwrap().layout;
            let rows = [
                RawRow::from_text([Some("a"), Some("on"), Some("1")]),
                RawRow::from_text([Some("b"), None, Some("0")]),
            ];
            let widgets: Vec<Widget> = materialize_all(&rows, &layout).unwrap();
            assert!(widgets[0].active);
            assert!(!widgets[1].active);
            assert_eq!(widgets[1].label, "");
        }

        fn article_layout() -> Layout {
            let mut st = Statement::new();
            st.aggregate::<Tag>();
            st.build_select::<Article>().unwrap().layout
        }

        #[test]
        fn json_aggregate_decodes_members() {
            let row = RawRow::from_text([
                Some("3"),
                Some(r#"[{"id": 1, "name": "rust"}, {"id": 2, "name": "sql"}]"#),
            ]);
            let article: Article = materialize(&row, &article_layout()).unwrap();

            assert_eq!(article.id, 3);
            assert_eq!(
                article.tags,
                vec![
                    Tag {
                        id: 1,
                        name: "rust".into()
                    },
                    Tag {
                        id: 2,
                        name: "sql".into()
                    },
                ]
            );
        }

        #[test]
        fn malformed_json_aggregate_is_left_empty() {
            let row = RawRow::from_text([Some("3"), Some("[{not json")]);
            let article: Article = materialize(&row, &article_layout()).unwrap();
            assert!(article.tags.is_empty());

            let row = RawRow::from_text([Some("3"), None]);
            let article: Article = materialize(&row, &article_layout()).unwrap();
            assert!(article.tags.is_empty());
        }
    }
}
