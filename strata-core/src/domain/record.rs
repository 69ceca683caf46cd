//! Backup history types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::BackupJob;

/// One executed backup, as kept in the server's history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    pub id: Uuid,
    pub job: BackupJob,
    pub filename: String,
    #[serde(default)]
    pub remote_path: Option<String>,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub destination_id: Option<Uuid>,
    pub status: BackupStatus,
    #[serde(default)]
    pub log_summary: Option<String>,
}

/// Outcome of a backup execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackupStatus {
    Success,
    Failed,
    InProgress,
}

impl std::fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackupStatus::Success => write!(f, "Success"),
            BackupStatus::Failed => write!(f, "Failed"),
            BackupStatus::InProgress => write!(f, "In progress"),
        }
    }
}
