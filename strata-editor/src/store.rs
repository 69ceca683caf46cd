//! Store traits
//!
//! The editors reach the backup server only through these traits. The
//! HTTP implementations delegate to [`ApiClient`]; tests plug in in-memory
//! fakes.

use async_trait::async_trait;
use strata_client::{ApiClient, Result};
use strata_core::domain::destination::BackupDestination;
use strata_core::domain::job::BackupJob;
use strata_core::domain::source::BackupSource;
use strata_core::dto::job::BackupJobRequest;
use strata_core::dto::source::BackupSourceRequest;
use uuid::Uuid;

/// Persistence of backup jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Loads an existing job
    async fn find_job(&self, id: Uuid) -> Result<BackupJob>;

    /// Creates a job from a validated request
    async fn insert_job(&self, req: &BackupJobRequest) -> Result<BackupJob>;

    /// Replaces the editable fields of an existing job
    async fn replace_job(&self, id: Uuid, req: &BackupJobRequest) -> Result<BackupJob>;
}

/// Read access to the destination list
#[async_trait]
pub trait DestinationStore: Send + Sync {
    async fn all_destinations(&self) -> Result<Vec<BackupDestination>>;
}

/// Persistence of backup sources
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn find_source(&self, id: Uuid) -> Result<BackupSource>;

    async fn insert_source(&self, req: &BackupSourceRequest) -> Result<BackupSource>;

    async fn replace_source(&self, id: Uuid, req: &BackupSourceRequest) -> Result<BackupSource>;

    /// Asks the server to connect with the given settings, returning its message
    async fn probe_source(&self, req: &BackupSourceRequest) -> Result<String>;
}

#[async_trait]
impl JobStore for ApiClient {
    async fn find_job(&self, id: Uuid) -> Result<BackupJob> {
        self.get_job(id).await
    }

    async fn insert_job(&self, req: &BackupJobRequest) -> Result<BackupJob> {
        self.create_job(req).await
    }

    async fn replace_job(&self, id: Uuid, req: &BackupJobRequest) -> Result<BackupJob> {
        self.update_job(id, req).await
    }
}

#[async_trait]
impl DestinationStore for ApiClient {
    async fn all_destinations(&self) -> Result<Vec<BackupDestination>> {
        self.list_destinations().await
    }
}

#[async_trait]
impl SourceStore for ApiClient {
    async fn find_source(&self, id: Uuid) -> Result<BackupSource> {
        self.get_source(id).await
    }

    async fn insert_source(&self, req: &BackupSourceRequest) -> Result<BackupSource> {
        self.create_source(req).await
    }

    async fn replace_source(&self, id: Uuid, req: &BackupSourceRequest) -> Result<BackupSource> {
        self.update_source(id, req).await
    }

    async fn probe_source(&self, req: &BackupSourceRequest) -> Result<String> {
        self.test_source_connection(req).await
    }
}
