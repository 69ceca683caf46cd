//! Backup destination domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A storage target that backups are copied to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDestination {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub destination_type: BackupType,
    pub endpoint: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    pub is_active: bool,
}

/// Storage backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackupType {
    LocalDisk,
    AmazonS3,
    GoogleCloudStorage,
    Ftp,
}

impl std::fmt::Display for BackupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackupType::LocalDisk => write!(f, "LOCAL_DISK"),
            BackupType::AmazonS3 => write!(f, "AMAZON_S3"),
            BackupType::GoogleCloudStorage => write!(f, "GOOGLE_CLOUD_STORAGE"),
            BackupType::Ftp => write!(f, "FTP"),
        }
    }
}
