//! Email configuration endpoints

use crate::ApiClient;
use crate::error::Result;
use reqwest::Method;
use strata_core::domain::email::EmailConfig;
use strata_core::dto::email::EmailConfigRequest;
use uuid::Uuid;

const EMAIL_CONFIGS_PATH: &str = "/api/email-configs";

impl ApiClient {
    /// List all email configurations
    pub async fn list_email_configs(&self) -> Result<Vec<EmailConfig>> {
        let response = self.request(Method::GET, EMAIL_CONFIGS_PATH).send().await?;

        self.handle_response(response).await
    }

    /// Get an email configuration by ID
    pub async fn get_email_config(&self, id: Uuid) -> Result<EmailConfig> {
        let path = format!("{}/{}", EMAIL_CONFIGS_PATH, id);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// Create an email configuration
    pub async fn create_email_config(&self, req: &EmailConfigRequest) -> Result<EmailConfig> {
        let response = self
            .request(Method::POST, EMAIL_CONFIGS_PATH)
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Update an email configuration
    pub async fn update_email_config(
        &self,
        id: Uuid,
        req: &EmailConfigRequest,
    ) -> Result<EmailConfig> {
        let path = format!("{}/{}", EMAIL_CONFIGS_PATH, id);
        let response = self.request(Method::PUT, &path).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Delete an email configuration
    pub async fn delete_email_config(&self, id: Uuid) -> Result<()> {
        let path = format!("{}/{}", EMAIL_CONFIGS_PATH, id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_empty_response(response).await
    }

    /// Ask the server to try logging in to the SMTP host
    pub async fn test_email_config(&self, req: &EmailConfigRequest) -> Result<String> {
        let path = format!("{}/test", EMAIL_CONFIGS_PATH);
        let response = self.request(Method::POST, &path).json(req).send().await?;

        self.handle_message_response(response, "Connection succeeded")
            .await
    }
}
