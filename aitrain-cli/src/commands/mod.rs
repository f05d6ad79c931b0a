//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;

pub use job::JobArgs;

use aitrain_client::JobApi;
use anyhow::Result;
use clap::Subcommand;
use colored::*;
use serde::Serialize;

use crate::config::{Config, NotifyArgs, PollArgs};

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the identity behind the token
    Me,
    /// Submit a job and return immediately
    Submit {
        #[command(flatten)]
        job: JobArgs,
    },
    /// Submit a job and wait until it finishes
    Run {
        #[command(flatten)]
        job: JobArgs,

        #[command(flatten)]
        poll: PollArgs,

        #[command(flatten)]
        notify: NotifyArgs,
    },
    /// Get job details
    Info {
        /// Job ID
        id: String,
    },
    /// Get job logs
    Logs {
        /// Job ID
        id: String,
    },
    /// Start a stopped job
    Start {
        /// Job ID
        id: String,
    },
    /// Stop a running job
    Stop {
        /// Job ID
        id: String,
    },
    /// Delete a job
    Delete {
        /// Job ID
        id: String,
    },
}

/// Handle a CLI command
///
/// Every command connects with a freshly validated client before it runs.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = config.connect().await?;

    match command {
        Commands::Me => print_json(&client.me().await?),
        Commands::Submit { job } => job::submit(&client, &job).await,
        Commands::Run { job, poll, notify } => job::run(client, &job, &poll, &notify).await,
        Commands::Info { id } => print_json(&client.get_info(&id).await?),
        Commands::Logs { id } => {
            print!("{}", client.get_logs(&id).await?);
            Ok(())
        }
        Commands::Start { id } => {
            let body = client.start_job(&id).await?;
            print_done(&format!("Started job {}", id), &body)
        }
        Commands::Stop { id } => {
            let body = client.stop_job(&id).await?;
            print_done(&format!("Stopped job {}", id), &body)
        }
        Commands::Delete { id } => {
            let body = client.delete_job(&id).await?;
            print_done(&format!("Deleted job {}", id), &body)
        }
    }
}

/// Print a result as pretty JSON on stdout
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a confirmation on stderr and any response body on stdout
fn print_done(message: &str, body: &str) -> Result<()> {
    eprintln!("{} {}", "✓".green(), message);
    if !body.is_empty() {
        println!("{}", body);
    }
    Ok(())
}
