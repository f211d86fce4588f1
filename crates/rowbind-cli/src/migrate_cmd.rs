use crate::cli::{MigrateAction, MigrateArgs};
use anyhow::Context;
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use rowbind::migrate::{self, MigrationStatus, Progress, Report};
use rowbind::{Connection, ConnectionConfig, Db};

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = connection_config(&args);
    let mut db = rowbind::connect(&config)
        .await
        .context("failed to connect to database")?;

    match args.action {
        MigrateAction::Run => run_pending(&mut db, &args).await,
        MigrateAction::Fresh => run_fresh(&mut db, &args).await,
        MigrateAction::Status => run_status(&mut db, &args).await,
    }
}

/// `--database` wins over the environment.
fn connection_config(args: &MigrateArgs) -> ConnectionConfig {
    match &args.database {
        Some(url) => ConnectionConfig::from_url(url.as_str()),
        None => ConnectionConfig::from_env(),
    }
}

async fn run_pending<C: Connection>(db: &mut Db<C>, args: &MigrateArgs) -> anyhow::Result<()> {
    let report = migrate::run_with(db, &args.dir, print_progress)
        .await
        .with_context(|| format!("failed to migrate {}", args.dir.display()))?;
    print_report(&report);
    Ok(())
}

async fn run_fresh<C: Connection>(db: &mut Db<C>, args: &MigrateArgs) -> anyhow::Result<()> {
    migrate::drop_all_tables(db)
        .await
        .context("failed to drop tables")?;
    println!("{}", "Dropped all tables successfully.".green());
    run_pending(db, args).await
}

async fn run_status<C: Connection>(db: &mut Db<C>, args: &MigrateArgs) -> anyhow::Result<()> {
    let status = migrate::status(db, &args.dir)
        .await
        .with_context(|| format!("failed to read status of {}", args.dir.display()))?;
    println!("{}", status_table(&status));
    Ok(())
}

fn print_progress(progress: Progress<'_>) {
    match progress {
        Progress::Migrating(name) => println!("{} {name}", format!("{:<12}", "Migrating:").yellow()),
        Progress::Migrated(name) => println!("{} {name}", format!("{:<12}", "Migrated:").green()),
    }
}

fn print_report(report: &Report) {
    if report.is_empty() {
        println!("{}", "Nothing to migrate.".green());
    }
}

fn status_table(status: &[MigrationStatus]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Ran?", "Migration", "Batch"]);
    for row in status {
        let ran = if row.ran() {
            Cell::new("Yes").fg(Color::Green)
        } else {
            Cell::new("No").fg(Color::Red)
        };
        let batch = row.batch.map(|b| b.to_string()).unwrap_or_default();
        table.add_row(vec![ran, Cell::new(&row.name), Cell::new(batch)]);
    }
    table
}
