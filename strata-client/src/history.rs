//! Backup history endpoints

use crate::ApiClient;
use crate::error::Result;
use reqwest::Method;
use strata_core::domain::record::BackupRecord;
use strata_core::dto::page::Page;
use uuid::Uuid;

impl ApiClient {
    /// Fetch one page of backup history, newest first
    ///
    /// # Arguments
    /// * `page` - Zero-based page index
    /// * `size` - Records per page
    pub async fn backup_history(&self, page: u32, size: u32) -> Result<Page<BackupRecord>> {
        let response = self
            .request(Method::GET, "/api/backup/history")
            .query(&[
                ("page", page.to_string()),
                ("size", size.to_string()),
                ("sort", "timestamp,desc".to_string()),
            ])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Restore the backup captured by a history record
    pub async fn restore_backup(&self, record_id: Uuid) -> Result<()> {
        let path = format!("/api/backup/restore/{}", record_id);
        let response = self
            .request(Method::POST, &path)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
