//! Job editor
//!
//! Holds one editing session of a backup job: the field values, their
//! enabled/required state and the destination checkboxes. The session is
//! consumed by [`JobEditor::submit`]; dropping it is a cancel.

use std::collections::BTreeSet;

use chrono::NaiveTime;
use strata_core::domain::job::{BackupJob, NotificationPolicy, ScheduleType};
use strata_core::dto::job::BackupJobRequest;
use uuid::Uuid;

use crate::EditorMode;
use crate::catalog::{DestinationCatalog, DestinationSelection};
use crate::error::{EditorError, Result};
use crate::field::{Field, JobFieldFlags, job_field_flags};
use crate::store::JobStore;

pub const DEFAULT_SCHEDULE: ScheduleType = ScheduleType::Daily;
pub const DEFAULT_BACKUP_TIME: &str = "02:00";
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Editable fields of a backup job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFields {
    pub name: Field<String>,
    pub source_id: Field<Option<Uuid>>,
    pub schedule_type: Field<ScheduleType>,
    pub backup_time: Field<String>,
    pub retention_days: Field<Option<u32>>,
    pub is_active: Field<bool>,
    pub notification_policy: Field<NotificationPolicy>,
    pub notification_recipients: Field<String>,
    pub email_config_id: Field<Option<Uuid>>,
}

impl JobFields {
    fn defaults() -> Self {
        let flags = job_field_flags(NotificationPolicy::Never);

        Self {
            name: Field::new(String::new(), flags.name),
            source_id: Field::new(None, flags.source_id),
            schedule_type: Field::new(DEFAULT_SCHEDULE, flags.schedule_type),
            backup_time: Field::new(DEFAULT_BACKUP_TIME.to_string(), flags.backup_time),
            retention_days: Field::new(Some(DEFAULT_RETENTION_DAYS), flags.retention_days),
            is_active: Field::new(true, flags.is_active),
            notification_policy: Field::new(NotificationPolicy::Never, flags.notification_policy),
            notification_recipients: Field::new(String::new(), flags.notification_recipients),
            email_config_id: Field::new(None, flags.email_config_id),
        }
    }

    fn apply(&mut self, flags: &JobFieldFlags) {
        self.name.apply(flags.name);
        self.source_id.apply(flags.source_id);
        self.schedule_type.apply(flags.schedule_type);
        self.backup_time.apply(flags.backup_time);
        self.retention_days.apply(flags.retention_days);
        self.is_active.apply(flags.is_active);
        self.notification_policy.apply(flags.notification_policy);
        self.notification_recipients
            .apply(flags.notification_recipients);
        self.email_config_id.apply(flags.email_config_id);
    }

    /// Labels of the always-validated fields that are missing or malformed
    ///
    /// The notification pair is checked separately, after the destinations.
    fn invalid_fields(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();

        if self.name.is_missing() {
            invalid.push("name");
        }
        if self.source_id.is_missing() {
            invalid.push("source");
        }
        if self.backup_time.is_missing()
            || (self.backup_time.enabled && !is_time_of_day(&self.backup_time.value))
        {
            invalid.push("backup time");
        }
        if self.retention_days.is_missing() || self.retention_days.value == Some(0) {
            invalid.push("retention days");
        }

        invalid
    }
}

/// Accepts `HH:MM` and `HH:MM:SS`
fn is_time_of_day(value: &str) -> bool {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M").is_ok()
        || NaiveTime::parse_from_str(value, "%H:%M:%S").is_ok()
}

/// Editing session for one backup job
#[derive(Debug, Clone)]
pub struct JobEditor {
    mode: EditorMode,
    fields: JobFields,
    destinations: Vec<DestinationSelection>,
}

impl JobEditor {
    /// Starts a new job with default values
    pub fn create(catalog: &DestinationCatalog) -> Self {
        Self {
            mode: EditorMode::Create,
            fields: JobFields::defaults(),
            destinations: catalog.selections(),
        }
    }

    /// Starts editing an already loaded job
    ///
    /// Destinations of the job that are not in the catalog cannot be
    /// shown, so they are not selected.
    pub fn edit(catalog: &DestinationCatalog, job: &BackupJob) -> Self {
        let mut editor = Self {
            mode: EditorMode::Edit(job.id),
            fields: JobFields::defaults(),
            destinations: catalog.selections(),
        };

        let fields = &mut editor.fields;
        fields.name.set(job.name.clone());
        fields.source_id.set(Some(job.source.id));
        fields.schedule_type.set(job.schedule_type);
        fields.backup_time.set(job.backup_time.clone());
        fields.retention_days.set(Some(job.retention_days));
        fields.is_active.set(job.is_active);
        fields
            .notification_recipients
            .set(job.notification_recipients.clone().unwrap_or_default());
        fields
            .email_config_id
            .set(job.email_config.as_ref().map(|c| c.id));
        editor.set_notification_policy(job.notification_policy);

        let selected: BTreeSet<Uuid> = job.destinations.iter().map(|d| d.id).collect();
        for entry in &mut editor.destinations {
            entry.selected = selected.contains(&entry.id);
        }

        editor
    }

    /// Opens an editor: create mode without an id, edit mode (after loading
    /// the job) with one
    pub async fn open<S: JobStore + ?Sized>(
        store: &S,
        catalog: &DestinationCatalog,
        job_id: Option<Uuid>,
    ) -> Result<Self> {
        let Some(id) = job_id else {
            return Ok(Self::create(catalog));
        };

        let job = store.find_job(id).await.map_err(|e| {
            tracing::warn!("Failed to load job {}: {}", id, e);
            EditorError::remote(&e, "Failed to load backup job")
        })?;

        Ok(Self::edit(catalog, &job))
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn fields(&self) -> &JobFields {
        &self.fields
    }

    pub fn destinations(&self) -> &[DestinationSelection] {
        &self.destinations
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.fields.name.set(name.into());
    }

    pub fn set_source(&mut self, source_id: Option<Uuid>) {
        self.fields.source_id.set(source_id);
    }

    pub fn set_schedule_type(&mut self, schedule_type: ScheduleType) {
        self.fields.schedule_type.set(schedule_type);
    }

    pub fn set_backup_time(&mut self, backup_time: impl Into<String>) {
        self.fields.backup_time.set(backup_time.into());
    }

    pub fn set_retention_days(&mut self, days: Option<u32>) {
        self.fields.retention_days.set(days);
    }

    pub fn set_active(&mut self, active: bool) {
        self.fields.is_active.set(active);
    }

    pub fn set_notification_recipients(&mut self, recipients: impl Into<String>) {
        self.fields.notification_recipients.set(recipients.into());
    }

    pub fn set_email_config(&mut self, email_config_id: Option<Uuid>) {
        self.fields.email_config_id.set(email_config_id);
    }

    /// Sets the notification policy and recomputes field state
    ///
    /// Only enabled/required state changes: recipients and email
    /// configuration keep their values while disabled.
    pub fn set_notification_policy(&mut self, policy: NotificationPolicy) {
        self.fields.notification_policy.set(policy);
        self.fields.apply(&job_field_flags(policy));
    }

    /// Checks or unchecks a destination
    ///
    /// Returns false when the id is not in the catalog.
    pub fn select_destination(&mut self, id: Uuid, selected: bool) -> bool {
        match self.destinations.iter_mut().find(|d| d.id == id) {
            Some(entry) => {
                entry.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Selects exactly the given destinations
    ///
    /// Returns the ids that are not in the catalog; those are ignored.
    pub fn replace_destinations(&mut self, ids: &[Uuid]) -> Vec<Uuid> {
        for entry in &mut self.destinations {
            entry.selected = ids.contains(&entry.id);
        }

        ids.iter()
            .filter(|id| !self.destinations.iter().any(|d| d.id == **id))
            .copied()
            .collect()
    }

    pub fn selected_destination_ids(&self) -> BTreeSet<Uuid> {
        self.destinations
            .iter()
            .filter(|d| d.selected)
            .map(|d| d.id)
            .collect()
    }

    /// Runs the submission checks in order and builds the request
    ///
    /// 1. required fields filled in and well formed
    /// 2. at least one destination selected
    /// 3. a notifying policy has both recipients and an email configuration
    pub fn validate(&self) -> Result<BackupJobRequest> {
        let fields = &self.fields;

        let mut invalid = fields.invalid_fields();
        // Nothing to pick from is a form error, not a missing selection
        if self.destinations.is_empty() {
            invalid.push("destinations");
        }
        if !invalid.is_empty() {
            return Err(EditorError::invalid(invalid));
        }

        let destination_ids = self.selected_destination_ids();
        if destination_ids.is_empty() {
            return Err(EditorError::NoDestination);
        }

        let recipients = &fields.notification_recipients.value;
        let has_recipients = !recipients.trim().is_empty();
        if fields.notification_policy.value.notifies()
            && (!has_recipients || fields.email_config_id.value.is_none())
        {
            return Err(EditorError::IncompleteNotification);
        }

        let (Some(source_id), Some(retention_days)) =
            (fields.source_id.value, fields.retention_days.value)
        else {
            return Err(EditorError::invalid(vec!["source", "retention days"]));
        };

        Ok(BackupJobRequest {
            name: fields.name.value.clone(),
            source_id,
            destination_ids,
            schedule_type: fields.schedule_type.value,
            backup_time: fields.backup_time.value.clone(),
            retention_days,
            is_active: fields.is_active.value,
            notification_policy: fields.notification_policy.value,
            notification_recipients: has_recipients.then(|| recipients.clone()),
            email_config_id: fields.email_config_id.value,
        })
    }

    /// Validates and saves the job, creating or updating by mode
    pub async fn submit<S: JobStore + ?Sized>(self, store: &S) -> Result<BackupJob> {
        let req = self.validate()?;

        let saved = match self.mode {
            EditorMode::Create => store.insert_job(&req).await,
            EditorMode::Edit(id) => store.replace_job(id, &req).await,
        }
        .map_err(|e| {
            tracing::warn!("Failed to save job '{}': {}", req.name, e);
            EditorError::remote(&e, "Failed to save backup job")
        })?;

        tracing::info!("Saved backup job {} ({})", saved.name, saved.id);

        Ok(saved)
    }
}
