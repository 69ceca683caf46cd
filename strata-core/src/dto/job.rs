//! Job DTOs

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::domain::job::{BackupJob, NotificationPolicy, ScheduleType};

/// Request body for creating or updating a backup job
///
/// `destination_ids` is a set: the server treats it as unordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupJobRequest {
    pub name: String,
    pub source_id: Uuid,
    pub destination_ids: BTreeSet<Uuid>,
    pub schedule_type: ScheduleType,
    pub backup_time: String,
    pub retention_days: u32,
    pub is_active: bool,
    pub notification_policy: NotificationPolicy,
    pub notification_recipients: Option<String>,
    pub email_config_id: Option<Uuid>,
}

impl From<&BackupJob> for BackupJobRequest {
    fn from(job: &BackupJob) -> Self {
        Self {
            name: job.name.clone(),
            source_id: job.source.id,
            destination_ids: job.destinations.iter().map(|d| d.id).collect(),
            schedule_type: job.schedule_type,
            backup_time: job.backup_time.clone(),
            retention_days: job.retention_days,
            is_active: job.is_active,
            notification_policy: job.notification_policy,
            notification_recipients: job
                .notification_recipients
                .clone()
                .filter(|r| !r.trim().is_empty()),
            email_config_id: job.email_config.as_ref().map(|c| c.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_destination_set_as_array() {
        let dest = Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap();
        let req = BackupJobRequest {
            name: "nightly".to_string(),
            source_id: Uuid::nil(),
            destination_ids: BTreeSet::from([dest]),
            schedule_type: ScheduleType::Daily,
            backup_time: "02:00".to_string(),
            retention_days: 7,
            is_active: true,
            notification_policy: NotificationPolicy::Never,
            notification_recipients: None,
            email_config_id: None,
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json["destinationIds"],
            serde_json::json!(["22222222-2222-2222-2222-222222222222"])
        );
        assert_eq!(json["notificationPolicy"], "NEVER");
        assert_eq!(json["retentionDays"], 7);
    }
}
