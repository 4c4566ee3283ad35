//! Cartwatch CLI - entrypoint for the analytics API server

mod commands;

use clap::{Parser, Subcommand};
use commands::ServeCommand;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "CARTWATCH_LOG_LEVEL", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve(ServeCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // If RUST_LOG is set, use it directly; otherwise default all cartwatch
    // crates to the chosen level and keep noisy dependencies at warn.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .expect("Invalid RUST_LOG environment variable")
    } else {
        tracing_subscriber::EnvFilter::new(format!(
            "cartwatch_cli={level},\
             cartwatch_core={level},\
             cartwatch_entities={level},\
             cartwatch_events={level},\
             cartwatch_funnels={level},\
             sea_orm=warn,\
             sqlx=warn",
            level = cli.log_level
        ))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve(command) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(command.run())
        }
    }
}
