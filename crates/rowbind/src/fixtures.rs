//! Records shared by the unit tests.

use crate::Record;

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[orm(table = "people")]
pub struct Person {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    #[orm(relation)]
    pub author: Option<Person>,
    pub created_at: String,
    pub updated_at: String,
}

/// String primary key.
#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Widget {
    pub id: String,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Tags listed by id in a JSON array column.
#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Article {
    pub id: i64,
    #[orm(json_agg = "id")]
    pub tags: Vec<Tag>,
}

/// A joined author next to aggregated tags.
#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Story {
    pub id: i64,
    pub author_id: i64,
    #[orm(relation)]
    pub author: Option<Person>,
    #[orm(json_agg = "id")]
    pub tags: Vec<Tag>,
}

/// No `id` column and no marked key.
#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct LogLine {
    pub message: String,
}

/// Maps no columns at all.
#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct Hollow {}
