//! Backup destination endpoints

use crate::ApiClient;
use crate::error::Result;
use reqwest::Method;
use strata_core::domain::destination::BackupDestination;
use strata_core::dto::destination::BackupDestinationRequest;
use uuid::Uuid;

const DESTINATIONS_PATH: &str = "/api/backup-destination";

impl ApiClient {
    /// List all destinations
    pub async fn list_destinations(&self) -> Result<Vec<BackupDestination>> {
        let response = self.request(Method::GET, DESTINATIONS_PATH).send().await?;

        self.handle_response(response).await
    }

    /// Get a destination by ID
    pub async fn get_destination(&self, id: Uuid) -> Result<BackupDestination> {
        let path = format!("{}/{}", DESTINATIONS_PATH, id);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// Create a destination
    pub async fn create_destination(
        &self,
        req: &BackupDestinationRequest,
    ) -> Result<BackupDestination> {
        let response = self
            .request(Method::POST, DESTINATIONS_PATH)
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Update a destination
    pub async fn update_destination(
        &self,
        id: Uuid,
        req: &BackupDestinationRequest,
    ) -> Result<BackupDestination> {
        let path = format!("{}/{}", DESTINATIONS_PATH, id);
        let response = self.request(Method::PUT, &path).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Delete a destination
    pub async fn delete_destination(&self, id: Uuid) -> Result<()> {
        let path = format!("{}/{}", DESTINATIONS_PATH, id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_empty_response(response).await
    }

    /// Ask the server to try reaching the given storage target
    pub async fn test_destination_connection(
        &self,
        req: &BackupDestinationRequest,
    ) -> Result<String> {
        let path = format!("{}/test", DESTINATIONS_PATH);
        let response = self.request(Method::POST, &path).json(req).send().await?;

        self.handle_message_response(response, "Connection succeeded")
            .await
    }
}
