use clap::Parser;
use tracing_subscriber::EnvFilter;

use mollerdb::cli::Args;
use mollerdb::config;
use mollerdb::db::Database;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let connection = args.connection;
    let output = args.command.run(
        || {
            let config = config::resolve_from_environment(connection.as_deref())?;
            Ok(Database::from_config(config)?)
        },
        args.format,
    )?;
    println!("{}", output);
    Ok(())
}
