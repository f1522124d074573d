//! `itinex`: reads tickets and booking confirmations and prints the
//! reservations they contain.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{batch, config, extract, profiles};

/// Turn travel documents (tickets, booking confirmations) into structured
/// reservations using declarative vendor profiles
#[derive(Parser)]
#[command(name = "itinex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file instead of the one in the user config directory
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find reservations in one PDF or text document
    Extract(extract::ExtractArgs),

    /// Run extraction over every document matching a glob
    Batch(batch::BatchArgs),

    /// List, show, check or export vendor profiles
    Profiles(profiles::ProfilesArgs),

    /// Show or edit the configuration file
    Config(config::ConfigArgs),
}

fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Profiles(args) => profiles::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
