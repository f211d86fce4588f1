mod cli;
mod migrate_cmd;

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Migrate(args) => {
            // A missing .env file is fine; the variables may come from the environment.
            dotenvy::dotenv().ok();
            migrate_cmd::run(args).await
        }
    }
}
