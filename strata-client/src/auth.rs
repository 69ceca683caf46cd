//! Authentication endpoints

use crate::ApiClient;
use crate::error::Result;
use reqwest::Method;
use strata_core::dto::auth::{ChangePasswordRequest, JwtResponse, LoginRequest};

impl ApiClient {
    /// Exchange credentials for a bearer token
    pub async fn login(&self, req: &LoginRequest) -> Result<JwtResponse> {
        let response = self
            .request(Method::POST, "/api/auth/login")
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Replace the password and receive a fresh token
    pub async fn change_password(&self, req: &ChangePasswordRequest) -> Result<JwtResponse> {
        let response = self
            .request(Method::POST, "/api/auth/change-password")
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
