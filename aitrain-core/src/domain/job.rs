//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Job record as reported by the training service
///
/// Fields the client does not interpret are kept in `extra`, and optional
/// blocks are only written back when the service sent them, so the record
/// serializes back to what the service sent. `created_at` is kept as the raw
/// string for the same reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<JobSpecInfo>,
    pub status: JobStatus,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Job {
    /// Current lifecycle state
    pub fn state(&self) -> &JobState {
        &self.status.state
    }

    /// Time limit the service enforces on this job, if any
    ///
    /// A missing or zero timeout means the job is unbounded.
    pub fn remote_timeout(&self) -> Option<Duration> {
        self.spec
            .as_ref()
            .and_then(|spec| spec.timeout)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// The part of a job's spec the client reads back
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSpecInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Job status block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Job lifecycle state
///
/// `Done` is the only successful terminal state. `Interrupted`, `Failed` and
/// `Error` are failure terminals. Everything else, including states this
/// client does not know about, is still in progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    Queued,
    Initializing,
    Pending,
    Running,
    Interrupting,
    Finalizing,
    Done,
    Interrupted,
    Failed,
    Error,
    Other(String),
}

impl JobState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "QUEUED",
            Self::Initializing => "INITIALIZING",
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Interrupting => "INTERRUPTING",
            Self::Finalizing => "FINALIZING",
            Self::Done => "DONE",
            Self::Interrupted => "INTERRUPTED",
            Self::Failed => "FAILED",
            Self::Error => "ERROR",
            Self::Other(state) => state,
        }
    }

    /// No further transitions happen after a terminal state
    pub fn is_terminal(&self) -> bool {
        self.is_success() || self.is_failure()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Interrupted | Self::Failed | Self::Error)
    }
}

impl From<String> for JobState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "QUEUED" => Self::Queued,
            "INITIALIZING" => Self::Initializing,
            "PENDING" => Self::Pending,
            "RUNNING" => Self::Running,
            "INTERRUPTING" => Self::Interrupting,
            "FINALIZING" => Self::Finalizing,
            "DONE" => Self::Done,
            "INTERRUPTED" => Self::Interrupted,
            "FAILED" => Self::Failed,
            "ERROR" => Self::Error,
            _ => Self::Other(state),
        }
    }
}

impl From<&str> for JobState {
    fn from(state: &str) -> Self {
        Self::from(state.to_string())
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Other(state) => state,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
