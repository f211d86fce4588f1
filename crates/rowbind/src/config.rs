//! Connection settings and bootstrap.

use crate::db::Db;
use crate::error::{OrmError, OrmResult};
use std::env;
use std::fmt;

/// Database credentials, usually read from `DB_*` environment variables.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Driver name; `postgres` and `postgresql` are accepted.
    pub driver: String,
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: String,
    pub database: String,
    /// Full connection URL; takes precedence over the individual fields.
    pub url: Option<String>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ConnectionConfig {
    /// Read `DB_CONNECTION`, `DB_USERNAME`, `DB_PASSWORD`, `DB_HOST`, `DB_PORT`, `DB_DATABASE`
    /// and the optional `DATABASE_URL` override.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`ConnectionConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).unwrap_or_default();
        Self {
            driver: var("DB_CONNECTION"),
            username: var("DB_USERNAME"),
            password: var("DB_PASSWORD"),
            host: var("DB_HOST"),
            port: var("DB_PORT"),
            database: var("DB_DATABASE"),
            url: lookup("DATABASE_URL").filter(|u| !u.is_empty()),
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Check that every credential except the password is present.
    pub fn validate(&self) -> OrmResult<()> {
        if self.url.is_some() {
            return Ok(());
        }
        let required = [
            &self.driver,
            &self.username,
            &self.host,
            &self.port,
            &self.database,
        ];
        if required.iter().any(|v| v.is_empty()) {
            return Err(OrmError::Connection(
                "missing database credentials".to_string(),
            ));
        }
        if !matches!(self.driver.as_str(), "postgres" | "postgresql" | "pgsql") {
            return Err(OrmError::Connection(format!(
                "unsupported driver `{}`",
                self.driver
            )));
        }
        Ok(())
    }

    /// Driver configuration: the parsed URL when one is set, else the individual fields.
    ///
    /// Credentials are passed as-is; they never go through URL syntax.
    pub fn to_pg_config(&self) -> OrmResult<tokio_postgres::Config> {
        self.validate()?;
        if let Some(url) = &self.url {
            return url
                .parse()
                .map_err(|e: tokio_postgres::Error| OrmError::Connection(e.to_string()));
        }

        let port: u16 = self
            .port
            .parse()
            .map_err(|_| OrmError::Connection(format!("invalid port `{}`", self.port)))?;

        let mut config = tokio_postgres::Config::new();
        config
            .user(&self.username)
            .host(&self.host)
            .port(port)
            .dbname(&self.database);
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        Ok(config)
    }
}

/// Open a connection and wrap it in a [`Db`].
///
/// The connection task is spawned onto the current tokio runtime.
pub async fn connect(config: &ConnectionConfig) -> OrmResult<Db<tokio_postgres::Client>> {
    let (client, connection) = config
        .to_pg_config()?
        .connect(tokio_postgres::NoTls)
        .await
        .map_err(|e| OrmError::Connection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(target: "rowbind.sql", error = %e, "connection closed with error");
        }
    });

    Ok(Db::new(client))
}
