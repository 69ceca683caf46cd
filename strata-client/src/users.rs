//! User management endpoints

use crate::ApiClient;
use crate::error::Result;
use reqwest::Method;
use strata_core::domain::user::User;
use strata_core::dto::auth::RegisterRequest;
use uuid::Uuid;

const USERS_PATH: &str = "/api/users";

impl ApiClient {
    /// List all operator accounts
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let response = self.request(Method::GET, USERS_PATH).send().await?;

        self.handle_response(response).await
    }

    /// Register a new operator account
    pub async fn create_user(&self, req: &RegisterRequest) -> Result<User> {
        let response = self.request(Method::POST, USERS_PATH).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Delete an operator account
    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        let path = format!("{}/{}", USERS_PATH, id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_empty_response(response).await
    }
}
