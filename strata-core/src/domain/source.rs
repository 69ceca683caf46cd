//! Backup source domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A data source that backups are taken from
///
/// Database-backed sources use the `db_*` connection fields; file-based
/// sources (H2) use `source_path` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSource {
    pub id: Uuid,
    pub name: String,
    pub database_type: DatabaseType,
    #[serde(default)]
    pub db_dump_tool_path: String,
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(default)]
    pub db_host: Option<String>,
    #[serde(default)]
    pub db_port: Option<u16>,
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub db_user: Option<String>,
    #[serde(default)]
    pub db_password: Option<String>,
}

/// Supported source engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatabaseType {
    Mysql,
    Postgres,
    Oracle,
    Sqlserver,
    Mariadb,
    Mongodb,
    H2,
}

impl DatabaseType {
    pub const ALL: [DatabaseType; 7] = [
        Self::Mysql,
        Self::Postgres,
        Self::Oracle,
        Self::Sqlserver,
        Self::Mariadb,
        Self::Mongodb,
        Self::H2,
    ];

    /// H2 is dumped from a file path rather than over a connection
    pub fn is_file_based(self) -> bool {
        self == DatabaseType::H2
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DatabaseType::Mysql => "MYSQL",
            DatabaseType::Postgres => "POSTGRES",
            DatabaseType::Oracle => "ORACLE",
            DatabaseType::Sqlserver => "SQLSERVER",
            DatabaseType::Mariadb => "MARIADB",
            DatabaseType::Mongodb => "MONGODB",
            DatabaseType::H2 => "H2",
        };
        write!(f, "{}", name)
    }
}
