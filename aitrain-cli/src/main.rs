//! AI Training CLI
//!
//! Command-line front end for the training client: submit a job, wait for it,
//! and inspect or control jobs by id. Results are printed as JSON on stdout;
//! progress logs go to stderr.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aitrain")]
#[command(about = "Run and manage remote AI training jobs", long_about = None)]
struct Cli {
    /// API bearer token
    #[arg(long, env = "AITRAIN_TOKEN", hide_env_values = true)]
    token: String,

    /// API base URL
    #[arg(long, env = "AITRAIN_BASE_URL", default_value = aitrain_client::DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aitrain_cli=info,aitrain_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        base_url: cli.base_url,
        token: cli.token,
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
