//! Job-related API endpoints

use aitrain_core::domain::job::{Job, JobState};
use aitrain_core::domain::spec::JobSpec;
use aitrain_core::dto::job::CreateJobRequest;
use async_trait::async_trait;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::TrainingClient;
use crate::api::JobApi;
use crate::error::{ClientError, JobOperation, Result};

/// A submitted job and the last state observed for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobHandle {
    pub id: String,
    pub state: JobState,
    /// When the job was submitted; the remote budget counts from here
    #[serde(skip)]
    pub submitted_at: Instant,
}

impl JobHandle {
    /// Creates a handle for a job submitted just now
    pub fn new(id: impl Into<String>, state: JobState) -> Self {
        Self {
            id: id.into(),
            state,
            submitted_at: Instant::now(),
        }
    }
}

#[async_trait]
impl JobApi for TrainingClient {
    // =============================================================================
    // Job Submission
    // =============================================================================

    /// Submit a new job
    ///
    /// # Example
    /// ```no_run
    /// # use aitrain_client::{JobApi, TrainingClient};
    /// # use aitrain_core::domain::spec::JobSpec;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = TrainingClient::connect("token").await?;
    /// let handle = client
    ///     .submit_job(&JobSpec::new("ubuntu").with_resources(2, 0))
    ///     .await?;
    /// println!("{} is {}", handle.id, handle.state);
    /// # Ok(())
    /// # }
    /// ```
    async fn submit_job(&self, spec: &JobSpec) -> Result<JobHandle> {
        let request = CreateJobRequest::from(spec);
        debug!("Submitting job with image {}", request.image);

        let response = self
            .post(self.endpoint(["v1", "job"])?)
            .json(&request)
            .send()
            .await?;
        let job: Job = Self::handle_response(response, ClientError::submission).await?;

        info!("Submitted job {} (state {})", job.id, job.status.state);
        Ok(JobHandle::new(job.id, job.status.state))
    }

    // =============================================================================
    // Job Control
    // =============================================================================

    async fn get_info(&self, id: &str) -> Result<Job> {
        let response = self.get(self.job_endpoint(id, None)?).send().await?;

        Self::handle_response(response, |status, body| {
            JobOperation::Info.error(id, status, body)
        })
        .await
    }

    async fn get_logs(&self, id: &str) -> Result<String> {
        let response = self.get(self.job_endpoint(id, Some("log"))?).send().await?;

        Self::handle_text_response(response, |status, body| {
            JobOperation::Logs.error(id, status, body)
        })
        .await
    }

    async fn start_job(&self, id: &str) -> Result<String> {
        let response = self.put(self.job_endpoint(id, Some("start"))?).send().await?;

        Self::handle_text_response(response, |status, body| {
            JobOperation::Start.error(id, status, body)
        })
        .await
    }

    async fn stop_job(&self, id: &str) -> Result<String> {
        let response = self.put(self.job_endpoint(id, Some("kill"))?).send().await?;

        Self::handle_text_response(response, |status, body| {
            JobOperation::Stop.error(id, status, body)
        })
        .await
    }

    async fn delete_job(&self, id: &str) -> Result<String> {
        let response = self.delete(self.job_endpoint(id, None)?).send().await?;

        Self::handle_text_response(response, |status, body| {
            JobOperation::Delete.error(id, status, body)
        })
        .await
    }
}
