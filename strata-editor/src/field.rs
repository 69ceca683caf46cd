//! Field state
//!
//! Every editable value is wrapped in a [`Field`] that knows whether it is
//! currently enabled and whether it must be filled in. Which fields are
//! enabled/required is never toggled ad hoc: it is recomputed from the
//! current selections by [`job_field_flags`] and [`source_field_flags`].

use strata_core::domain::job::NotificationPolicy;
use strata_core::domain::source::DatabaseType;

/// Enabled/required state of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFlags {
    pub enabled: bool,
    pub required: bool,
}

impl FieldFlags {
    pub const REQUIRED: FieldFlags = FieldFlags {
        enabled: true,
        required: true,
    };
    pub const OPTIONAL: FieldFlags = FieldFlags {
        enabled: true,
        required: false,
    };
    pub const DISABLED: FieldFlags = FieldFlags {
        enabled: false,
        required: false,
    };

    /// Enabled with the given requirement when `active`, disabled otherwise
    pub fn when(active: bool, required: bool) -> Self {
        if active {
            FieldFlags {
                enabled: true,
                required,
            }
        } else {
            FieldFlags::DISABLED
        }
    }
}

/// A value plus its enabled/required state
///
/// Disabling a field never touches its value; only the editors decide when
/// a value gets cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field<T> {
    pub value: T,
    pub enabled: bool,
    pub required: bool,
}

impl<T> Field<T> {
    pub fn new(value: T, flags: FieldFlags) -> Self {
        Self {
            value,
            enabled: flags.enabled,
            required: flags.required,
        }
    }

    pub fn flags(&self) -> FieldFlags {
        FieldFlags {
            enabled: self.enabled,
            required: self.required,
        }
    }

    pub fn apply(&mut self, flags: FieldFlags) {
        self.enabled = flags.enabled;
        self.required = flags.required;
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
    }
}

impl<T: Default> Field<T> {
    pub fn clear(&mut self) {
        self.value = T::default();
    }
}

/// Whether a field value counts as filled in
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl<T> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.is_some()
    }
}

impl<T: Presence> Field<T> {
    /// An enabled, required field with no value
    pub fn is_missing(&self) -> bool {
        self.enabled && self.required && !self.value.is_present()
    }
}

/// Field state for the job editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobFieldFlags {
    pub name: FieldFlags,
    pub source_id: FieldFlags,
    pub schedule_type: FieldFlags,
    pub backup_time: FieldFlags,
    pub retention_days: FieldFlags,
    pub is_active: FieldFlags,
    pub notification_policy: FieldFlags,
    pub notification_recipients: FieldFlags,
    pub email_config_id: FieldFlags,
}

/// Compute job field state for a notification policy
///
/// The backup time stays required for every schedule type, MANUAL included:
/// the server rejects jobs without one.
pub fn job_field_flags(policy: NotificationPolicy) -> JobFieldFlags {
    let notification = FieldFlags::when(policy.notifies(), true);

    JobFieldFlags {
        name: FieldFlags::REQUIRED,
        source_id: FieldFlags::REQUIRED,
        schedule_type: FieldFlags::REQUIRED,
        backup_time: FieldFlags::REQUIRED,
        retention_days: FieldFlags::REQUIRED,
        is_active: FieldFlags::REQUIRED,
        notification_policy: FieldFlags::REQUIRED,
        notification_recipients: notification,
        email_config_id: notification,
    }
}

/// Field state for the source editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFieldFlags {
    pub name: FieldFlags,
    pub database_type: FieldFlags,
    pub db_dump_tool_path: FieldFlags,
    pub source_path: FieldFlags,
    pub db_host: FieldFlags,
    pub db_port: FieldFlags,
    pub db_name: FieldFlags,
    pub db_user: FieldFlags,
    pub db_password: FieldFlags,
}

impl SourceFieldFlags {
    /// Flags of the database connection group, in display order
    pub fn connection_group(&self) -> [FieldFlags; 5] {
        [
            self.db_host,
            self.db_port,
            self.db_name,
            self.db_user,
            self.db_password,
        ]
    }
}

/// Compute source field state for a database type
///
/// File-based engines get the path field, every other engine gets the
/// connection group. With no type chosen yet both groups stay disabled.
pub fn source_field_flags(database_type: Option<DatabaseType>) -> SourceFieldFlags {
    let file_based = database_type.is_some_and(|t| t.is_file_based());
    let connected = database_type.is_some_and(|t| !t.is_file_based());

    SourceFieldFlags {
        name: FieldFlags::REQUIRED,
        database_type: FieldFlags::REQUIRED,
        db_dump_tool_path: FieldFlags::REQUIRED,
        source_path: FieldFlags::when(file_based, true),
        db_host: FieldFlags::when(connected, false),
        db_port: FieldFlags::when(connected, false),
        db_name: FieldFlags::when(connected, false),
        db_user: FieldFlags::when(connected, false),
        db_password: FieldFlags::when(connected, false),
    }
}
