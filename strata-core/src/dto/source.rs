//! Source DTOs

use serde::{Deserialize, Serialize};

use crate::domain::source::DatabaseType;

/// Request body for creating, updating or testing a backup source
///
/// An absent password is left out of the JSON entirely so the server keeps
/// the stored credential. An absent port is sent as an explicit `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSourceRequest {
    pub name: String,
    pub database_type: DatabaseType,
    pub db_dump_tool_path: String,
    pub source_path: Option<String>,
    pub db_host: Option<String>,
    pub db_port: Option<u16>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_password: Option<String>,
}
