//! logrelay CLI tool.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod gateway;

#[derive(Parser)]
#[command(name = "logrelay")]
#[command(about = "Build log delivery pipeline CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a relay configuration
    Validate {
        /// Path to the configuration file
        #[arg(default_value = "logrelay.kdl")]
        path: String,
    },
    /// Run the pipeline in-process against a development gateway
    Simulate {
        /// Path to the configuration file
        #[arg(long, env = "LOGRELAY_CONFIG", default_value = "logrelay.kdl")]
        config: String,
        /// Number of synthetic log events to publish
        #[arg(long, default_value = "10")]
        events: usize,
        /// Fail this many apply attempts before the gateway recovers
        #[arg(long, default_value = "0")]
        fail_first: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            commands::validate(&path)?;
        }
        Commands::Simulate {
            config,
            events,
            fail_first,
        } => {
            commands::simulate(&config, events, fail_first).await?;
        }
    }

    Ok(())
}
