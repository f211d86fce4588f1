//! Connection pool utilities

use crate::config::ConnectionConfig;
use crate::db::Db;
use crate::error::{OrmError, OrmResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod};
use tokio_postgres::NoTls;

/// Create a connection pool from connection settings.
///
/// Uses `NoTls` and a small default size (suitable for local/dev).
///
/// ```ignore
/// let pool = rowbind::create_pool(&ConnectionConfig::from_env())?;
/// let mut db = rowbind::pooled(&pool).await?;
/// ```
pub fn create_pool(config: &ConnectionConfig) -> OrmResult<Pool> {
    create_pool_with_config(config, 16)
}

/// Create a connection pool holding at most `max_size` connections.
pub fn create_pool_with_config(config: &ConnectionConfig, max_size: usize) -> OrmResult<Pool> {
    create_pool_with_builder(config, |builder| builder.max_size(max_size))
}

/// Create a connection pool, letting the caller tune the `deadpool_postgres::PoolBuilder`.
pub fn create_pool_with_builder(
    config: &ConnectionConfig,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> OrmResult<Pool> {
    let pg_config = config.to_pg_config()?;
    let mgr = Manager::from_config(pg_config, NoTls, default_manager_config());
    configure_pool(Pool::builder(mgr))
        .build()
        .map_err(|e| OrmError::Pool(e.to_string()))
}

/// Check a connection out of `pool` and wrap it in a [`Db`].
pub async fn pooled(pool: &Pool) -> OrmResult<Db<deadpool_postgres::Client>> {
    Ok(Db::new(pool.get().await?))
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}
