mod commands;
mod config;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(clap::Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// Path to the config file
    #[clap(long, short, default_value = "dockgate.yaml")]
    config: PathBuf,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run Dockgate
    Run,
    /// Validate the config file
    Check,
    /// Test container listing against a Docker daemon endpoint
    TestTarget {
        host: String,

        #[clap(long, default_value_t = 2375)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run => crate::commands::run::command(&cli).await,
        Commands::Check => crate::commands::check::command(&cli).await,
        Commands::TestTarget { host, port } => {
            crate::commands::test_target::command(&cli, host, *port).await
        }
    }
}
