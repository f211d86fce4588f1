//! Error types for rowbind

use thiserror::Error;

/// Result type alias for rowbind operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for mapping, building and executing statements
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database connection error (bad URL, missing credentials)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error, passed through from the driver
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Driver error that does not originate from tokio-postgres
    #[error("Driver error: {0}")]
    Driver(String),

    /// Record type cannot be mapped to a table
    #[error("Invalid record `{0}`: it maps no columns")]
    InvalidRecord(&'static str),

    /// Clause combination that cannot form a valid statement
    #[error("Build error: {0}")]
    Build(String),

    /// A default `WHERE <pk> = ?` predicate was needed but the record has no primary key
    #[error("Record `{0}` has no primary key; register a condition explicitly")]
    MissingPrimaryKey(&'static str),

    /// Column value could not be coerced into the destination field
    #[error("Decode error on field '{field}': {message}")]
    Decode { field: String, message: String },

    /// Destination field has no decoding rule for the value it received
    #[error("Unsupported type for field '{field}': {kind}")]
    UnsupportedType { field: String, kind: String },

    /// A statement expected a fixed number of result rows
    #[error("Expected {expected} row(s), got {got}")]
    UnexpectedRowCount { expected: usize, got: usize },

    /// UPDATE matched nothing
    #[error("No rows affected: {0}")]
    NoRowsAffected(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Migration error
    #[cfg(feature = "migrate")]
    #[error("Migration error: {0}")]
    Migration(String),
}

impl OrmError {
    /// Create a decode error for a specific field
    pub fn decode(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported-type error for a specific field
    pub fn unsupported(field: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnsupportedType {
            field: field.into(),
            kind: kind.into(),
        }
    }

    /// Check if this is a decode error (including unsupported types)
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::UnsupportedType { .. })
    }

    /// Check if this is a no-rows-affected error
    pub fn is_no_rows_affected(&self) -> bool {
        matches!(self, Self::NoRowsAffected(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
