//! Convenient imports for typical `rowbind` usage.
//!
//! ```ignore
//! use rowbind::prelude::*;
//! ```

pub use crate::{
    Column, Connection, ConnectionConfig, Db, Direction, ExecResult, OrmError, OrmResult, Record,
    Value, connect,
};

#[cfg(feature = "pool")]
pub use crate::{create_pool, pooled};
