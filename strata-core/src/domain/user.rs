//! User domain model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An operator account on the backup server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
}
