//! Backup job endpoints

use crate::ApiClient;
use crate::error::Result;
use reqwest::Method;
use strata_core::domain::job::BackupJob;
use strata_core::dto::job::BackupJobRequest;
use uuid::Uuid;

const JOBS_PATH: &str = "/api/backup-jobs";

impl ApiClient {
    /// List all backup jobs
    pub async fn list_jobs(&self) -> Result<Vec<BackupJob>> {
        let response = self.request(Method::GET, JOBS_PATH).send().await?;

        self.handle_response(response).await
    }

    /// Get a backup job by ID
    pub async fn get_job(&self, id: Uuid) -> Result<BackupJob> {
        let path = format!("{}/{}", JOBS_PATH, id);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// Create a backup job
    ///
    /// # Returns
    /// The job as stored by the server
    pub async fn create_job(&self, req: &BackupJobRequest) -> Result<BackupJob> {
        let response = self.request(Method::POST, JOBS_PATH).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Replace the editable fields of an existing job
    pub async fn update_job(&self, id: Uuid, req: &BackupJobRequest) -> Result<BackupJob> {
        let path = format!("{}/{}", JOBS_PATH, id);
        let response = self.request(Method::PUT, &path).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Delete a backup job
    pub async fn delete_job(&self, id: Uuid) -> Result<()> {
        let path = format!("{}/{}", JOBS_PATH, id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_empty_response(response).await
    }

    /// Run a job now, outside its schedule
    ///
    /// The server answers immediately; progress is published on the job's
    /// log topic.
    pub async fn execute_job(&self, id: Uuid) -> Result<()> {
        let path = format!("{}/{}/execute", JOBS_PATH, id);
        let response = self
            .request(Method::POST, &path)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
