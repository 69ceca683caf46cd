//! Common types used across CLI modules

use clap::ValueEnum;
use strata_core::domain::destination::BackupType;
use strata_core::domain::job::{NotificationPolicy, ScheduleType};
use strata_core::domain::source::DatabaseType;
use uuid::Uuid;

/// Identifier that can be either a full UUID or an unambiguous prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOrPrefix {
    /// Full UUID
    Full(Uuid),
    /// Prefix that should uniquely identify a resource
    Prefix(String),
}

impl IdOrPrefix {
    /// Parse a string into an IdOrPrefix
    ///
    /// Attempts to parse as a full UUID first, otherwise treats as a prefix
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match Uuid::parse_str(input) {
            Ok(uuid) => IdOrPrefix::Full(uuid),
            Err(_) => IdOrPrefix::Prefix(input.to_lowercase()),
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            IdOrPrefix::Full(uuid) => Some(*uuid),
            IdOrPrefix::Prefix(_) => None,
        }
    }

    pub fn as_str(&self) -> String {
        match self {
            IdOrPrefix::Full(uuid) => uuid.to_string(),
            IdOrPrefix::Prefix(prefix) => prefix.clone(),
        }
    }
}

impl std::fmt::Display for IdOrPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdOrPrefix::Full(uuid) => write!(f, "{}", uuid),
            IdOrPrefix::Prefix(prefix) => write!(f, "{}", prefix),
        }
    }
}

/// Schedule type as typed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScheduleArg {
    Manual,
    Daily,
    Weekly,
}

impl From<ScheduleArg> for ScheduleType {
    fn from(arg: ScheduleArg) -> Self {
        match arg {
            ScheduleArg::Manual => ScheduleType::Manual,
            ScheduleArg::Daily => ScheduleType::Daily,
            ScheduleArg::Weekly => ScheduleType::Weekly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Never,
    OnFailure,
    Always,
}

impl From<PolicyArg> for NotificationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Never => NotificationPolicy::Never,
            PolicyArg::OnFailure => NotificationPolicy::OnFailure,
            PolicyArg::Always => NotificationPolicy::Always,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatabaseArg {
    Mysql,
    Postgres,
    Oracle,
    Sqlserver,
    Mariadb,
    Mongodb,
    H2,
}

impl From<DatabaseArg> for DatabaseType {
    fn from(arg: DatabaseArg) -> Self {
        match arg {
            DatabaseArg::Mysql => DatabaseType::Mysql,
            DatabaseArg::Postgres => DatabaseType::Postgres,
            DatabaseArg::Oracle => DatabaseType::Oracle,
            DatabaseArg::Sqlserver => DatabaseType::Sqlserver,
            DatabaseArg::Mariadb => DatabaseType::Mariadb,
            DatabaseArg::Mongodb => DatabaseType::Mongodb,
            DatabaseArg::H2 => DatabaseType::H2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DestinationTypeArg {
    LocalDisk,
    AmazonS3,
    GoogleCloudStorage,
    Ftp,
}

impl From<DestinationTypeArg> for BackupType {
    fn from(arg: DestinationTypeArg) -> Self {
        match arg {
            DestinationTypeArg::LocalDisk => BackupType::LocalDisk,
            DestinationTypeArg::AmazonS3 => BackupType::AmazonS3,
            DestinationTypeArg::GoogleCloudStorage => BackupType::GoogleCloudStorage,
            DestinationTypeArg::Ftp => BackupType::Ftp,
        }
    }
}
