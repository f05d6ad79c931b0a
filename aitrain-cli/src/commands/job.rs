//! Job command handlers
//!
//! Builds a job spec from flags, submits it, and optionally waits for it.

use aitrain_client::{ChatNotifier, ClientError, JobApi, JobPoller, TrainingClient};
use aitrain_core::domain::job::JobState;
use aitrain_core::domain::spec::{DEFAULT_HTTP_PORT, JobSpec, Volume};
use anyhow::Result;
use clap::Args;
use colored::*;
use std::sync::Arc;

use super::print_json;
use crate::config::{NotifyArgs, PollArgs, parse_key_value, parse_volume};

/// Flags describing the job to submit
#[derive(Debug, Clone, Args)]
pub struct JobArgs {
    /// Container image
    #[arg(long)]
    pub image: String,

    /// Job name
    #[arg(long)]
    pub name: Option<String>,

    /// Number of CPUs; any value above 0 disables GPUs
    #[arg(long, default_value_t = 0)]
    pub cpu: u32,

    /// Number of GPUs
    #[arg(long, default_value_t = 1)]
    pub gpu: u32,

    /// Port exposed over HTTP
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT)]
    pub port: u16,

    /// Environment variable, repeatable
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub env_vars: Vec<(String, String)>,

    /// Label, repeatable
    #[arg(long = "label", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub labels: Vec<(String, String)>,

    /// SSH public key allowed into the job, repeatable
    #[arg(long = "ssh-key")]
    pub ssh_keys: Vec<String>,

    /// Object storage volume, repeatable, mounted in the order given
    #[arg(
        long = "volume",
        value_name = "CONTAINER@ALIAS:MOUNT_PATH[:ro|rw|rwd][:cache]",
        value_parser = parse_volume
    )]
    pub volumes: Vec<Volume>,

    /// Remote time limit in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Command to run inside the container
    #[arg(trailing_var_arg = true)]
    pub command: Vec<String>,
}

impl JobArgs {
    pub fn to_spec(&self) -> JobSpec {
        let mut spec = JobSpec::new(&self.image)
            .with_command(self.command.iter().cloned())
            .with_resources(self.cpu, self.gpu)
            .with_http_port(self.port);

        for (key, value) in &self.env_vars {
            spec = spec.with_env(key, value);
        }
        for (key, value) in &self.labels {
            spec = spec.with_label(key, value);
        }
        for key in &self.ssh_keys {
            spec = spec.with_ssh_key(key);
        }
        for volume in &self.volumes {
            spec = spec.with_volume(volume.clone());
        }
        if let Some(name) = &self.name {
            spec = spec.with_name(name);
        }
        if let Some(timeout) = self.timeout {
            spec = spec.with_timeout(timeout);
        }

        spec
    }
}

/// Submit a job and print its handle
pub async fn submit(client: &TrainingClient, args: &JobArgs) -> Result<()> {
    let handle = client.submit_job(&args.to_spec()).await?;

    eprintln!(
        "{} Submitted job {} ({})",
        "✓".green(),
        handle.id.cyan(),
        colorize_state(&handle.state)
    );
    print_json(&handle)
}

/// Submit a job, wait for it, and print the final record
pub async fn run(
    client: TrainingClient,
    args: &JobArgs,
    poll: &PollArgs,
    notify: &NotifyArgs,
) -> Result<()> {
    let mut poller = JobPoller::new(client, poll.to_config()?);
    if let Some(notifier) = ChatNotifier::from_config(&notify.to_config()?) {
        poller = poller.with_notifier(Arc::new(notifier));
    }

    match poller.run(&args.to_spec()).await {
        Ok(job) => {
            eprintln!(
                "{} Job {} finished: {}",
                "✓".green(),
                job.id.cyan(),
                colorize_state(job.state())
            );
            print_json(&job)
        }
        Err(e @ ClientError::JobFailed { .. }) => {
            eprintln!("{} {}", "✗".red(), "Job failed".red().bold());
            Err(e.into())
        }
        Err(e @ ClientError::Timeout { .. }) => {
            eprintln!(
                "{} {}",
                "⏱".yellow(),
                "Stopped waiting; the job may still be running".yellow()
            );
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Colorize a job state for terminal display
fn colorize_state(state: &JobState) -> ColoredString {
    if state.is_success() {
        state.as_str().green()
    } else if state.is_failure() {
        state.as_str().red()
    } else {
        state.as_str().yellow()
    }
}
