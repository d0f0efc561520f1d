//! OralVis CLI - scan server and operator commands

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{account, serve, status};

/// OralVis - dental scan ingestion and reports
#[derive(Parser)]
#[command(name = "oralvis", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Listen address (overrides settings and ORALVIS_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Keep everything in memory (nothing is written to the data directory)
        #[arg(long)]
        ephemeral: bool,
    },

    /// Show account and scan counts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage login accounts
    Account {
        #[command(subcommand)]
        command: account::AccountCommands,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("oralvis=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { bind, ephemeral } => serve::run(bind, ephemeral).await,
        Commands::Status { json } => status::run(json).await,
        Commands::Account { command } => account::run(command).await,
    }
}
