//! Authentication and account DTOs

use serde::{Deserialize, Serialize};

/// Credentials posted to the login endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request to replace the current password
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub email: String,
    pub old_password: String,
    pub new_password: String,
}

/// Request to register a new operator account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Token issued by the server after login or password change
///
/// When `must_change_password` is set, the holder must go through the
/// password change flow before anything else is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtResponse {
    pub token: String,
    #[serde(default)]
    pub must_change_password: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_response_flag_defaults_to_false() {
        let resp: JwtResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert!(!resp.must_change_password);

        let resp: JwtResponse =
            serde_json::from_str(r#"{"token":"abc","mustChangePassword":true}"#).unwrap();
        assert!(resp.must_change_password);
    }
}
