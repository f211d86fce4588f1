//! # rowbind
//!
//! A small record-mapping ORM for Postgres.
//!
//! ## Features
//!
//! - **Convention over configuration**: `Post` maps to table `posts`, `author_id` to column
//!   `author_id`; override either with `#[orm(table = "...")]` / `#[orm(column = "...")]`
//! - **Fluent statements**: configure conditions, joins and paging on a [`Db`] handle, then
//!   finish with `get`, `first`, `exists`, `insert`, `save` or `delete`
//! - **One level of relations**: foreign-key joins and JSON-aggregate columns are mapped back
//!   into nested records
//! - **Clean state**: every terminal operation starts the next statement from scratch
//!
//! ```ignore
//! use rowbind::prelude::*;
//!
//! #[derive(Debug, Default, Record)]
//! #[orm(table = "people")]
//! struct Person {
//!     id: i64,
//!     name: String,
//! }
//!
//! #[derive(Debug, Default, Record)]
//! struct Post {
//!     id: Option<i64>,
//!     title: String,
//!     author_id: i64,
//!     #[orm(relation)]
//!     author: Option<Person>,
//! }
//!
//! let mut db = rowbind::connect(&ConnectionConfig::from_env()).await?;
//! db.insert(&Post { title: "hello".into(), author_id: 1, ..Default::default() }).await?;
//!
//! let posts: Vec<Post> = db
//!     .join::<Person>("author_id")
//!     .eq("title", "hello")
//!     .get()
//!     .await?;
//! ```

// Lets `#[derive(Record)]` output refer to `::rowbind` from inside this crate.
extern crate self as rowbind;

pub mod builder;
pub mod client;
pub mod column;
mod compose;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod materialize;
pub mod naming;
pub mod postgres;
pub mod prelude;
pub mod statement;
pub mod value;

#[cfg(all(test, feature = "derive"))]
mod fixtures;

pub use builder::{BuiltStatement, SelectPlan};
pub use client::{Connection, ExecResult, RawRow};
pub use column::Column;
pub use config::{ConnectionConfig, connect};
pub use db::{Db, StatementKind};
pub use entity::{
    Entity, FieldDescriptor, FieldKind, FieldSpec, Record, Related, RelationTarget, ScalarKind,
};
pub use error::{OrmError, OrmResult};
pub use materialize::{
    Layout, Slot, fill_boxed, fill_record, fill_related, materialize, materialize_all,
};
pub use statement::{Condition, Direction, Relation, RelationKind, Statement};
pub use value::Value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config, pooled};

#[cfg(feature = "migrate")]
pub mod migrate;

#[cfg(feature = "derive")]
pub use rowbind_derive::Record;
