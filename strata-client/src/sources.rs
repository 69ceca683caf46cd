//! Backup source endpoints

use crate::ApiClient;
use crate::error::Result;
use reqwest::Method;
use strata_core::domain::source::BackupSource;
use strata_core::dto::source::BackupSourceRequest;
use uuid::Uuid;

const SOURCES_PATH: &str = "/api/backup-sources";

impl ApiClient {
    /// List all sources
    pub async fn list_sources(&self) -> Result<Vec<BackupSource>> {
        let response = self.request(Method::GET, SOURCES_PATH).send().await?;

        self.handle_response(response).await
    }

    /// Get a source by ID
    pub async fn get_source(&self, id: Uuid) -> Result<BackupSource> {
        let path = format!("{}/{}", SOURCES_PATH, id);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// Create a source
    pub async fn create_source(&self, req: &BackupSourceRequest) -> Result<BackupSource> {
        let response = self
            .request(Method::POST, SOURCES_PATH)
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Update a source
    pub async fn update_source(&self, id: Uuid, req: &BackupSourceRequest) -> Result<BackupSource> {
        let path = format!("{}/{}", SOURCES_PATH, id);
        let response = self.request(Method::PUT, &path).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Delete a source
    pub async fn delete_source(&self, id: Uuid) -> Result<()> {
        let path = format!("{}/{}", SOURCES_PATH, id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_empty_response(response).await
    }

    /// Ask the server to try connecting with the given settings
    ///
    /// # Returns
    /// The server's success message
    pub async fn test_source_connection(&self, req: &BackupSourceRequest) -> Result<String> {
        let path = format!("{}/test", SOURCES_PATH);
        let response = self.request(Method::POST, &path).json(req).send().await?;

        self.handle_message_response(response, "Connection succeeded")
            .await
    }
}
