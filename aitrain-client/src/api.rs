//! Job API abstraction
//!
//! The poller and the flow helpers talk to the service through this trait so
//! they can be driven by the HTTP client or by an in-memory implementation.

use aitrain_core::domain::job::Job;
use aitrain_core::domain::spec::JobSpec;
use async_trait::async_trait;

use crate::error::Result;
use crate::jobs::JobHandle;

/// Operations on remote training jobs
///
/// Each call is a single request/response pair. None of them retries.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Submits a new job
    ///
    /// # Errors
    /// [`ClientError::Submission`](crate::ClientError::Submission) carrying the
    /// response body when the service refuses the job.
    async fn submit_job(&self, spec: &JobSpec) -> Result<JobHandle>;

    /// Fetches the current record of a job
    async fn get_info(&self, id: &str) -> Result<Job>;

    /// Fetches the logs of a job as plain text
    async fn get_logs(&self, id: &str) -> Result<String>;

    /// Restarts a stopped job
    async fn start_job(&self, id: &str) -> Result<String>;

    /// Stops a running job
    async fn stop_job(&self, id: &str) -> Result<String>;

    /// Deletes a job
    async fn delete_job(&self, id: &str) -> Result<String>;
}

#[async_trait]
impl<T: JobApi + ?Sized> JobApi for std::sync::Arc<T> {
    async fn submit_job(&self, spec: &JobSpec) -> Result<JobHandle> {
        (**self).submit_job(spec).await
    }

    async fn get_info(&self, id: &str) -> Result<Job> {
        (**self).get_info(id).await
    }

    async fn get_logs(&self, id: &str) -> Result<String> {
        (**self).get_logs(id).await
    }

    async fn start_job(&self, id: &str) -> Result<String> {
        (**self).start_job(id).await
    }

    async fn stop_job(&self, id: &str) -> Result<String> {
        (**self).stop_job(id).await
    }

    async fn delete_job(&self, id: &str) -> Result<String> {
        (**self).delete_job(id).await
    }
}
