//! Replace a table's contents with a CSV file
//!
//! Run with:
//! ```
//! cargo run -p zipcode-seed --bin seed -- data/zipcodes.csv --columns zip,city,state
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use zipcode_seed::command::{
    AssumeYes, CommandError, Outcome, PromptConfirm, SeedArgs, SeedCommand,
};
use zipcode_seed::config::SeedConfig;
use zipcode_seed::db::{self, Seeder};

/// Seed the database with a CSV file.
#[derive(Debug, Parser)]
#[command(name = "seed", version)]
struct Cli {
    /// Data source as CSV file
    source: Option<PathBuf>,

    /// Comma delimited list of columns to include in the seed
    #[arg(short, long)]
    columns: Option<String>,

    /// Config file (defaults to ./seed.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Table to reseed
    #[arg(long)]
    table: Option<String>,

    /// Database connection URL
    #[arg(long)]
    database_url: Option<String>,

    /// Maximum rows per INSERT statement
    #[arg(long)]
    batch_size: Option<usize>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = SeedConfig::load(cli.config.as_deref())?;
    if let Some(table) = cli.table {
        config.table = table;
    }
    if let Some(url) = cli.database_url {
        config.connection = url;
    }
    if let Some(size) = cli.batch_size {
        config.batch_size = size;
    }
    config.validate()?;

    let pool = db::connect(&config.connection).await?;
    tracing::info!("Connected to database {}", config.connection_label());

    let seeder = Seeder::new(pool, config.table.clone()).with_batch_size(config.batch_size);
    let command = SeedCommand::new(config, seeder);

    let args = SeedArgs {
        source: cli.source,
        columns: cli.columns,
    };

    let outcome = if cli.yes {
        command.run(&args, &mut AssumeYes).await
    } else {
        command.run(&args, &mut PromptConfirm::stdio()).await
    };

    match outcome {
        Ok(Outcome::Cancelled) => Ok(ExitCode::SUCCESS),
        Ok(Outcome::Seeded(result)) => {
            tracing::info!("Seed completed!");
            tracing::info!("  Table: {}", command.seeder().table());
            tracing::info!("  Rows: {}", result.rows);
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ CommandError::HeaderValidation { .. }) => {
            tracing::error!("{err}");
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}
