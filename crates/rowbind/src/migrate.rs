//! Directory-based SQL migrations.
//!
//! Every `*.sql` file in the migrations directory is one migration, identified by its file
//! name and applied in file-name order. Applied migrations are recorded in the `migrations`
//! table together with the batch they ran in; all files applied by one [`run`] share a batch.
//!
//! ```ignore
//! let mut db = rowbind::connect(&ConnectionConfig::from_env()).await?;
//! let report = rowbind::migrate::run(&mut db, migrate::DEFAULT_DIR).await?;
//! println!("{} migration(s) in batch {:?}", report.migrated.len(), report.batch);
//! ```

use crate::client::Connection;
use crate::db::Db;
use crate::error::{OrmError, OrmResult};
use crate::materialize::decode;
use crate::statement::Direction;
use crate::Record;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio_postgres::error::SqlState;

/// Directory scanned when none is given.
pub const DEFAULT_DIR: &str = "database/migrations";

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS migrations (\
     id SERIAL PRIMARY KEY, \
     migration VARCHAR(191) NOT NULL, \
     batch INT NOT NULL)";

/// A row of the `migrations` bookkeeping table.
#[derive(Debug, Clone, Default, PartialEq, Record)]
#[orm(table = "migrations")]
pub struct Migration {
    #[orm(id)]
    pub id: Option<i64>,
    pub migration: String,
    pub batch: i64,
}

/// A migration file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// File name, the migration's identity.
    pub name: String,
    pub path: PathBuf,
}

/// Whether a migration file has run, and in which batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub name: String,
    pub batch: Option<i64>,
}

impl MigrationStatus {
    pub fn ran(&self) -> bool {
        self.batch.is_some()
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Batch the migrations were recorded under; `None` when nothing was pending.
    pub batch: Option<i64>,
    /// Applied file names, in order.
    pub migrated: Vec<String>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.migrated.is_empty()
    }
}

/// Progress notifications emitted while migrating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress<'a> {
    Migrating(&'a str),
    Migrated(&'a str),
}

/// List the `*.sql` files of `dir`, sorted by file name.
pub fn discover(dir: impl AsRef<Path>) -> OrmResult<Vec<MigrationFile>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| {
        OrmError::Migration(format!(
            "failed to read migrations dir {}: {e}",
            dir.display()
        ))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            OrmError::Migration(format!("failed to read entry in {}: {e}", dir.display()))
        })?;
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "sql") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        files.push(MigrationFile {
            name: name.to_string(),
            path,
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Create the bookkeeping table if it does not exist.
pub async fn ensure_table<C: Connection>(db: &mut Db<C>) -> OrmResult<()> {
    db.batch_execute(CREATE_TABLE_SQL).await
}

/// Recorded migrations, oldest first. A missing bookkeeping table reads as empty.
pub async fn applied<C: Connection>(db: &mut Db<C>) -> OrmResult<Vec<Migration>> {
    match db.order_by("id", Direction::Asc).get::<Migration>().await {
        Ok(rows) => Ok(rows),
        Err(OrmError::Query(err)) if err.code() == Some(&SqlState::UNDEFINED_TABLE) => {
            Ok(Vec::new())
        }
        Err(err) => Err(err),
    }
}

/// Batch number for the next run: one past the highest recorded, starting at 1.
pub async fn next_batch<C: Connection>(db: &mut Db<C>) -> OrmResult<i64> {
    let rows = db
        .query_raw("SELECT COALESCE(MAX(batch), 0) + 1 FROM migrations", &[])
        .await?;
    match rows.first() {
        Some(row) => decode::integer(row.get(0), "batch"),
        None => Ok(1),
    }
}

/// Apply every migration in `dir` that has not been recorded yet.
pub async fn run<C: Connection>(db: &mut Db<C>, dir: impl AsRef<Path>) -> OrmResult<Report> {
    run_with(db, dir, |_| {}).await
}

/// [`run`], reporting each migration before and after it is applied.
pub async fn run_with<C, F>(
    db: &mut Db<C>,
    dir: impl AsRef<Path>,
    mut on_progress: F,
) -> OrmResult<Report>
where
    C: Connection,
    F: FnMut(Progress<'_>),
{
    ensure_table(db).await?;

    let files = discover(dir)?;
    let recorded: Vec<String> = applied(db)
        .await?
        .into_iter()
        .map(|m| m.migration)
        .collect();
    let pending: Vec<MigrationFile> = files
        .into_iter()
        .filter(|f| !recorded.contains(&f.name))
        .collect();

    if pending.is_empty() {
        tracing::info!(target: "rowbind.migrate", "nothing to migrate");
        return Ok(Report::default());
    }

    let batch = next_batch(db).await?;
    let mut report = Report {
        batch: Some(batch),
        migrated: Vec::with_capacity(pending.len()),
    };

    for file in pending {
        on_progress(Progress::Migrating(&file.name));

        let sql = fs::read_to_string(&file.path).map_err(|e| {
            OrmError::Migration(format!(
                "failed to read migration {}: {e}",
                file.path.display()
            ))
        })?;
        db.batch_execute(&sql).await?;
        db.insert(&Migration {
            id: None,
            migration: file.name.clone(),
            batch,
        })
        .await?;

        tracing::info!(target: "rowbind.migrate", migration = %file.name, batch, "migrated");
        on_progress(Progress::Migrated(&file.name));
        report.migrated.push(file.name);
    }

    Ok(report)
}

/// Drop every base table in the current schema. Returns the dropped table names.
pub async fn drop_all_tables<C: Connection>(db: &mut Db<C>) -> OrmResult<Vec<String>> {
    let rows = db
        .query_raw(
            "SELECT tablename FROM pg_tables WHERE schemaname = current_schema() ORDER BY tablename",
            &[],
        )
        .await?;

    let mut tables = Vec::with_capacity(rows.len());
    for row in &rows {
        tables.push(decode::text(row.get(0), "tablename")?);
    }

    if !tables.is_empty() {
        let quoted: Vec<String> = tables
            .iter()
            .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
            .collect();
        db.batch_execute(&format!("DROP TABLE {} CASCADE", quoted.join(",")))
            .await?;
    }

    tracing::info!(target: "rowbind.migrate", dropped = tables.len(), "dropped all tables");
    Ok(tables)
}

/// Drop every table, then apply all migrations in `dir` as one batch.
pub async fn fresh<C: Connection>(db: &mut Db<C>, dir: impl AsRef<Path>) -> OrmResult<Report> {
    drop_all_tables(db).await?;
    run(db, dir).await
}

/// Every migration file in `dir` with the batch it ran in, if it has.
pub async fn status<C: Connection>(
    db: &mut Db<C>,
    dir: impl AsRef<Path>,
) -> OrmResult<Vec<MigrationStatus>> {
    let files = discover(dir)?;
    let batches: HashMap<String, i64> = applied(db)
        .await?
        .into_iter()
        .map(|m| (m.migration, m.batch))
        .collect();

    Ok(files
        .into_iter()
        .map(|f| MigrationStatus {
            batch: batches.get(&f.name).copied(),
            name: f.name,
        })
        .collect())
}
