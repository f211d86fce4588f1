use super::*;
use crate::fixtures::{Article, Hollow, LogLine, Person, Post, Story, Tag, Widget};
use crate::statement::Direction;

const POST_COLUMNS: &str =
    "posts.id,posts.title,posts.author_id,posts.created_at,posts.updated_at";

#[test]
fn select_lists_qualified_columns() {
    let plan = Statement::new().build_select::<Post>().unwrap();

    assert_eq!(plan.statement.sql, format!("SELECT {POST_COLUMNS} FROM posts"));
    assert!(plan.statement.args.is_empty());
}

#[test]
fn select_clauses_follow_fixed_order() {
    let mut st = Statement::new();
    st.limit(5)
        .order_by("title", Direction::Desc)
        .offset(20)
        .having("COUNT(*) > 1")
        .group_by(&["posts.id"])
        .filter("author_id", ">", 3);

    let plan = st.build_select::<Post>().unwrap();
    assert_eq!(
        plan.statement.sql,
        format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE posts.author_id > ? GROUP BY posts.id \
             HAVING COUNT(*) > 1 ORDER BY title DESC OFFSET 20 LIMIT 5"
        )
    );
}

#[test]
fn explicit_select_replaces_column_list() {
    let mut st = Statement::new();
    st.select(&["COUNT(*)"]);
    let plan = st.build_select::<Widget>().unwrap();
    assert_eq!(plan.statement.sql, "SELECT COUNT(*) FROM widgets");
}

#[test]
fn conditions_align_with_placeholders() {
    let mut st = Statement::new();
    st.eq("label", "a").filter("active", "=", true).filter("id", "<>", "9");

    let built = st.build_select::<Widget>().unwrap().statement;
    assert!(built.sql.ends_with(
        " WHERE widgets.label = ? AND widgets.active = ? AND widgets.id <> ?"
    ));
    assert_eq!(built.placeholder_count(), 3);
    assert_eq!(
        built.args,
        vec![
            Value::Text("a".into()),
            Value::Bool(true),
            Value::Text("9".into())
        ]
    );
}

#[test]
fn qualified_condition_columns_are_kept() {
    let mut st = Statement::new();
    st.join::<Person>("author_id").eq("people.name", "ada");

    let built = st.build_select::<Post>().unwrap().statement;
    assert!(built.sql.ends_with(" WHERE people.name = ?"));
}

#[test]
fn registered_relation_emits_one_join() {
    let mut st = Statement::new();
    st.join::<Person>("author_id").eq("title", "hello");

    let plan = st.build_select::<Post>().unwrap();
    assert_eq!(
        plan.statement.sql,
        "SELECT posts.id,posts.title,posts.author_id,people.id,people.name,\
         posts.created_at,posts.updated_at FROM posts \
         LEFT JOIN people ON people.id = posts.author_id WHERE posts.title = ?"
    );
    assert_eq!(plan.statement.sql.matches("LEFT JOIN").count(), 1);
}

#[test]
fn unregistered_relation_is_skipped() {
    let plan = Statement::new().build_select::<Post>().unwrap();
    assert!(!plan.statement.sql.contains("JOIN"));
    assert!(!plan.statement.sql.contains("people"));
}

#[test]
fn reregistering_a_foreign_key_replaces_it() {
    let mut st = Statement::new();
    st.join::<Tag>("author_id").join::<Person>("author_id");
    assert_eq!(st.relations().len(), 1);

    let plan = st.build_select::<Post>().unwrap();
    assert!(plan.statement.sql.contains("LEFT JOIN people"));
}

#[test]
fn aggregate_relation_projects_json_column() {
    let mut st = Statement::new();
    st.aggregate::<Tag>();

    let plan = st.build_select::<Article>().unwrap();
    assert_eq!(
        plan.statement.sql,
        "SELECT articles.id,COALESCE(json_agg(json_build_object('id', tags.id, 'name', tags.name)) \
         FILTER (WHERE tags.id IS NOT NULL), '[]') AS tags FROM articles \
         LEFT JOIN tags ON articles.tags::jsonb @> to_jsonb(tags.id::text) GROUP BY articles.id"
    );
}

#[test]
fn aggregate_groups_by_every_joined_key() {
    let mut st = Statement::new();
    st.join::<Person>("author_id").aggregate::<Tag>();

    let plan = st.build_select::<Story>().unwrap();
    assert_eq!(
        plan.statement.sql,
        "SELECT stories.id,stories.author_id,people.id,people.name,\
         COALESCE(json_agg(json_build_object('id', tags.id, 'name', tags.name)) \
         FILTER (WHERE tags.id IS NOT NULL), '[]') AS tags FROM stories \
         LEFT JOIN people ON people.id = stories.author_id \
         LEFT JOIN tags ON stories.tags::jsonb @> to_jsonb(tags.id::text) \
         GROUP BY stories.id,people.id"
    );
}

#[test]
fn joins_without_aggregate_are_not_grouped() {
    let mut st = Statement::new();
    st.join::<Person>("author_id");

    let plan = st.build_select::<Story>().unwrap();
    assert!(!plan.statement.sql.contains("GROUP BY"));
}

#[test]
fn mapping_keeps_columns_and_values_parallel() {
    let post = Post {
        id: 1,
        title: "t".into(),
        author_id: 2,
        ..Default::default()
    };
    let mut st = Statement::new();
    st.map_record(Some(&post), false).unwrap();

    assert_eq!(st.columns.len(), st.values.len());
    assert_eq!(st.columns.len(), st.bare_columns.len());
    assert_eq!(st.columns[1], "posts.title");
    assert_eq!(st.values[1], Value::Text("t".into()));
    assert_eq!(st.columns[2], "posts.author_id");
    assert_eq!(st.values[2], Value::Int(2));
}

#[test]
fn first_mapped_record_binds_the_table() {
    let mut st = Statement::new();
    st.join::<Person>("author_id");
    st.map_record::<Post>(None, true).unwrap();
    assert_eq!(st.table(), Some("posts"));
}

#[test]
fn insert_uses_bare_columns() {
    let post = Post {
        id: 5,
        title: "hello".into(),
        author_id: 1,
        created_at: "2024-01-01".into(),
        ..Default::default()
    };
    let built = Statement::new().build_insert(&post).unwrap();

    assert_eq!(
        built.sql,
        "INSERT INTO posts (id,title,author_id,created_at,updated_at) VALUES (?,?,?,?,?)"
    );
    assert_eq!(
        built.args,
        vec![
            Value::Int(5),
            Value::Text("hello".into()),
            Value::Int(1),
            Value::Text("2024-01-01".into()),
            Value::Null,
        ]
    );
}

#[test]
fn insert_omits_null_primary_key() {
    let widget = Widget {
        label: "knob".into(),
        active: true,
        ..Default::default()
    };
    let built = Statement::new().build_insert(&widget).unwrap();

    assert_eq!(built.sql, "INSERT INTO widgets (label,active) VALUES (?,?)");
    assert_eq!(
        built.args,
        vec![Value::Text("knob".into()), Value::Bool(true)]
    );
}

#[test]
fn update_excludes_key_and_audit_columns() {
    let post = Post {
        id: 7,
        title: "t".into(),
        author_id: 3,
        created_at: "c".into(),
        updated_at: "u".into(),
        ..Default::default()
    };
    let built = Statement::new().build_update(&post).unwrap();

    assert_eq!(
        built.sql,
        "UPDATE posts SET title=?,author_id=? WHERE posts.id = ?"
    );
    assert_eq!(
        built.args,
        vec![Value::Text("t".into()), Value::Int(3), Value::Int(7)]
    );
    for excluded in ["id=", "created_at", "updated_at"] {
        assert!(!built.sql.contains(&format!("SET {excluded}")));
        assert!(!built.sql.contains(&format!(",{excluded}")));
    }
}

#[test]
fn update_with_condition_appends_predicate_args_last() {
    let widget = Widget {
        id: "42".into(),
        label: "knob".into(),
        active: false,
    };
    let mut st = Statement::new();
    st.eq("label", "old");

    let built = st.build_update(&widget).unwrap();
    assert_eq!(
        built.sql,
        "UPDATE widgets SET label=?,active=? WHERE widgets.label = ?"
    );
    assert_eq!(
        built.args,
        vec![
            Value::Text("knob".into()),
            Value::Bool(false),
            Value::Text("old".into())
        ]
    );
    assert_eq!(built.placeholder_count(), built.args.len());
}

#[test]
fn delete_defaults_to_primary_key() {
    let widget = Widget {
        id: "42".into(),
        ..Default::default()
    };
    let built = Statement::new().build_delete(&widget).unwrap();

    assert_eq!(built.sql, "DELETE FROM widgets WHERE widgets.id = ?");
    assert_eq!(built.args, vec![Value::Text("42".into())]);
}

#[test]
fn delete_with_conditions_ignores_primary_key() {
    let mut st = Statement::new();
    st.filter("active", "=", false).eq("label", "x");

    let built = st.build_delete(&Widget::default()).unwrap();
    assert_eq!(
        built.sql,
        "DELETE FROM widgets WHERE widgets.active = ? AND widgets.label = ?"
    );
    assert_eq!(built.args.len(), 2);
}

#[test]
fn default_predicate_requires_primary_key() {
    let err = Statement::new()
        .build_delete(&LogLine::default())
        .unwrap_err();
    assert!(matches!(err, OrmError::MissingPrimaryKey("LogLine")));

    let mut st = Statement::new();
    st.eq("message", "boom");
    let built = st.build_delete(&LogLine::default()).unwrap();
    assert_eq!(built.sql, "DELETE FROM log_lines WHERE log_lines.message = ?");
}

#[test]
fn record_without_columns_is_rejected() {
    let err = Statement::new().build_select::<Hollow>().unwrap_err();
    assert!(matches!(err, OrmError::InvalidRecord("Hollow")));

    let err = Statement::new().build_exists::<Hollow>().unwrap_err();
    assert!(matches!(err, OrmError::InvalidRecord(_)));
}

#[test]
fn exists_forces_projection_and_limit() {
    let mut st = Statement::new();
    st.select(&["label"]).limit(50).eq("label", "a");

    let built = st.build_exists::<Widget>().unwrap();
    assert_eq!(
        built.sql,
        "SELECT EXISTS(SELECT 1 FROM widgets WHERE widgets.label = ? LIMIT 1)"
    );
    assert_eq!(built.args, vec![Value::Text("a".into())]);
}
