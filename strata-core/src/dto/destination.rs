//! Destination DTOs

use serde::{Deserialize, Serialize};

use crate::domain::destination::BackupType;

/// Request body for creating, updating or testing a destination
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDestinationRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub destination_type: BackupType,
    pub endpoint: String,
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    pub is_active: bool,
}
