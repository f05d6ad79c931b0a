//! Error types for the training client

use aitrain_core::domain::job::JobState;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Which poll budget ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Time limit carried in the job metadata, counted from submission
    Remote,
    /// Caller-supplied limit, counted from the start of the poll loop
    Local,
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => f.write_str("remote"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Errors that can occur when driving a training job
///
/// Every variant ends the current operation. Nothing here is retried by the
/// client itself.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The identity probe rejected the token
    #[error("invalid token (status {status}): {message}")]
    Auth { status: u16, message: String },

    /// The job-create request was refused
    #[error("job submission failed (status {status}): {body}")]
    Submission { status: u16, body: String },

    #[error("failed to fetch info of job {id} (status {status}): {body}")]
    InfoFetch { id: String, status: u16, body: String },

    #[error("failed to fetch logs of job {id} (status {status}): {body}")]
    LogFetch { id: String, status: u16, body: String },

    #[error("failed to start job {id} (status {status}): {body}")]
    Start { id: String, status: u16, body: String },

    #[error("failed to stop job {id} (status {status}): {body}")]
    Stop { id: String, status: u16, body: String },

    #[error("failed to delete job {id} (status {status}): {body}")]
    Delete { id: String, status: u16, body: String },

    /// The job reached a failure terminal state
    #[error("job {id} ended in state {state}, logs:\n{logs}")]
    JobFailed {
        id: String,
        state: JobState,
        logs: String,
    },

    /// A poll budget expired before the job finished
    #[error("job {id} exceeded the {budget} timeout ({elapsed:?} >= {limit:?})")]
    Timeout {
        id: String,
        budget: Budget,
        elapsed: Duration,
        limit: Duration,
    },

    /// The chat integration refused a message
    #[error("notification delivery failed (status {status}): {body}")]
    Notification { status: u16, body: String },

    /// The request never produced a response
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A success response carried a body that could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The job id cannot address a single job resource
    #[error("invalid job id {0:?}")]
    InvalidJobId(String),

    /// Base URL, poll or notifier settings are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    pub fn auth(status: u16, message: impl Into<String>) -> Self {
        Self::Auth {
            status,
            message: message.into(),
        }
    }

    pub fn submission(status: u16, body: impl Into<String>) -> Self {
        Self::Submission {
            status,
            body: body.into(),
        }
    }

    /// HTTP status attached to the error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. }
            | Self::Submission { status, .. }
            | Self::InfoFetch { status, .. }
            | Self::LogFetch { status, .. }
            | Self::Start { status, .. }
            | Self::Stop { status, .. }
            | Self::Delete { status, .. }
            | Self::Notification { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            Self::JobFailed { .. }
            | Self::Timeout { .. }
            | Self::Parse(_)
            | Self::InvalidJobId(_)
            | Self::InvalidConfig(_) => None,
        }
    }

    /// Check if the server reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Job operations that map a failed response to their own error variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobOperation {
    Info,
    Logs,
    Start,
    Stop,
    Delete,
}

impl JobOperation {
    pub(crate) fn error(self, id: &str, status: u16, body: String) -> ClientError {
        let id = id.to_string();
        match self {
            Self::Info => ClientError::InfoFetch { id, status, body },
            Self::Logs => ClientError::LogFetch { id, status, body },
            Self::Start => ClientError::Start { id, status, body },
            Self::Stop => ClientError::Stop { id, status, body },
            Self::Delete => ClientError::Delete { id, status, body },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_maps_to_its_variant() {
        let err = JobOperation::Stop.error("abc", 404, "not found".to_string());
        assert!(matches!(err, ClientError::Stop { status: 404, .. }));
        assert!(err.is_not_found());

        let err = JobOperation::Delete.error("abc", 500, String::new());
        assert!(matches!(err, ClientError::Delete { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_job_failed_message_embeds_state_and_logs() {
        let err = ClientError::JobFailed {
            id: "abc".to_string(),
            state: JobState::Failed,
            logs: "Traceback: division by zero".to_string(),
        };
        let message = err.to_string();

        assert!(message.contains("FAILED"));
        assert!(message.contains("division by zero"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_timeout_names_budget() {
        let err = ClientError::Timeout {
            id: "abc".to_string(),
            budget: Budget::Local,
            elapsed: Duration::from_secs(6),
            limit: Duration::from_secs(5),
        };

        assert!(err.is_timeout());
        assert!(err.to_string().contains("local timeout"));
    }

    #[test]
    fn test_auth_error_message() {
        let err = ClientError::auth(401, "unauthorized");
        assert!(err.to_string().starts_with("invalid token"));
        assert_eq!(err.status(), Some(401));
    }
}
