use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Migrate,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Migrate(MigrateArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    /// Apply pending migrations.
    Run,
    /// Drop every table, then apply all migrations.
    Fresh,
    /// Show which migrations have run.
    Status,
}

#[derive(Debug, Clone)]
pub struct MigrateArgs {
    pub action: MigrateAction,
    pub dir: PathBuf,
    pub database: Option<String>,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "migrate" => parse_migrate(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn parse_migrate<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut action: Option<MigrateAction> = None;
    let mut dir = PathBuf::from(rowbind::migrate::DEFAULT_DIR);
    let mut database: Option<String> = None;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Migrate)),
            "run" | "migrate" if action.is_none() => action = Some(MigrateAction::Run),
            "fresh" if action.is_none() => action = Some(MigrateAction::Fresh),
            "status" if action.is_none() => action = Some(MigrateAction::Status),
            "refresh" | "reset" | "rollback" if action.is_none() => {
                anyhow::bail!("`migrate {token}` is not supported");
            }
            "--dir" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--dir requires a value");
                };
                dir = PathBuf::from(v);
            }
            _ if token.starts_with("--dir=") => {
                dir = PathBuf::from(token.trim_start_matches("--dir="));
            }
            "--database" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--database requires a value");
                };
                database = Some(v.to_string());
            }
            _ if token.starts_with("--database=") => {
                database = Some(token.trim_start_matches("--database=").to_string());
            }
            _ if token.starts_with('-') => anyhow::bail!("unknown option: {token}"),
            _ => anyhow::bail!("command \"{token}\" is not defined"),
        }
    }

    Ok(Command::Migrate(MigrateArgs {
        action: action.unwrap_or(MigrateAction::Run),
        dir,
        database,
    }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
rowbind - migration CLI for rowbind

USAGE:
  rowbind <COMMAND> [OPTIONS]

COMMANDS:
  migrate       Apply SQL migrations (run/fresh/status)

Run `rowbind <command> --help` for more."
            );
        }
        HelpTopic::Migrate => {
            println!(
                "\
USAGE:
  rowbind migrate [run] [OPTIONS]
  rowbind migrate fresh [OPTIONS]
  rowbind migrate status [OPTIONS]

OPTIONS:
  --dir <DIR>           Migrations directory (default: {})
  --database <URL>      Database URL (default: DB_* variables or DATABASE_URL)
  -h, --help            Print help

Credentials are read from the environment; a .env file in the working directory is loaded
first.",
                rowbind::migrate::DEFAULT_DIR
            );
        }
    }
}
