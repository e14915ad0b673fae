use std::path::PathBuf;

use clap::{Parser, Subcommand};
use continuum::config::Config;
use continuum::storage::MemoryStore;
use continuum_cli::commands::{ConfigCommand, ConsolidateCommand, MemoryCommand, StatsCommand};
use continuum_cli::error::CliResult;
use continuum_cli::output::OutputFormat;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "continuum-cli")]
#[command(about = "Continuum CLI - Management tool for the Continuum memory store")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(long, short = 'c', global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[clap(
        long,
        short = 's',
        global = true,
        help = "Path to snapshot file (overrides config)"
    )]
    pub snapshot: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Record storage and retrieval commands")]
    Memory(MemoryCommand),

    #[clap(about = "Rank, prune and compress the store")]
    Consolidate(ConsolidateCommand),

    #[clap(about = "Show store statistics")]
    Stats(StatsCommand),

    #[clap(about = "Configuration commands")]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,continuum=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(snapshot) = cli.snapshot.clone() {
        config.store.snapshot_path = snapshot;
    }

    match &cli.command {
        Command::Config(cmd) => cmd.execute(&config, format),
        Command::Memory(_) | Command::Consolidate(_) | Command::Stats(_) => {
            tracing::debug!(
                snapshot = %config.store.snapshot_path.display(),
                "Opening memory store"
            );
            let mut store = MemoryStore::open(&config).await?;

            match &cli.command {
                Command::Memory(cmd) => cmd.execute(&mut store, format).await,
                Command::Consolidate(cmd) => cmd.execute(&mut store, format).await,
                Command::Stats(cmd) => cmd.execute(&store, format).await,
                Command::Config(_) => unreachable!(),
            }
        }
    }
}
