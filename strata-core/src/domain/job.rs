//! Backup job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::destination::BackupDestination;
use crate::domain::source::BackupSource;

/// A configured backup job
///
/// Binds one source to one or more destinations, with a schedule,
/// a retention window and a notification policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupJob {
    pub id: Uuid,
    pub name: String,
    pub source: BackupSource,
    pub destinations: Vec<BackupDestination>,
    pub schedule_type: ScheduleType,
    /// Time of day as sent by the server (e.g. "02:00" or "02:00:00")
    pub backup_time: String,
    pub retention_days: u32,
    pub is_active: bool,
    pub notification_policy: NotificationPolicy,
    #[serde(default)]
    pub notification_recipients: Option<String>,
    #[serde(default)]
    pub email_config: Option<EmailConfigRef>,
}

/// Reference to the email configuration a job notifies through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailConfigRef {
    pub id: Uuid,
    pub name: String,
}

/// When a job runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleType {
    Manual,
    Daily,
    Weekly,
}

impl ScheduleType {
    pub const ALL: [ScheduleType; 3] = [Self::Manual, Self::Daily, Self::Weekly];
}

impl std::fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleType::Manual => write!(f, "MANUAL"),
            ScheduleType::Daily => write!(f, "DAILY"),
            ScheduleType::Weekly => write!(f, "WEEKLY"),
        }
    }
}

/// When a job sends email notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPolicy {
    Never,
    OnFailure,
    Always,
}

impl NotificationPolicy {
    pub const ALL: [NotificationPolicy; 3] = [Self::Never, Self::OnFailure, Self::Always];

    /// Whether this policy ever sends anything
    pub fn notifies(self) -> bool {
        self != NotificationPolicy::Never
    }
}

impl std::fmt::Display for NotificationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationPolicy::Never => write!(f, "NEVER"),
            NotificationPolicy::OnFailure => write!(f, "ON_FAILURE"),
            NotificationPolicy::Always => write!(f, "ALWAYS"),
        }
    }
}
