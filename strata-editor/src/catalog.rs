//! Destination catalog
//!
//! The full destination list, fetched once and shared read-only by every
//! job editor opened from it. Each editor builds its own selection list.

use std::sync::Arc;

use strata_core::domain::destination::BackupDestination;
use uuid::Uuid;

use crate::error::{EditorError, Result};
use crate::store::DestinationStore;

/// Immutable, cheaply cloneable list of known destinations
#[derive(Debug, Clone)]
pub struct DestinationCatalog {
    destinations: Arc<[BackupDestination]>,
}

/// One checkbox in a job editor's destination list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSelection {
    pub id: Uuid,
    pub name: String,
    pub selected: bool,
}

impl DestinationCatalog {
    pub fn new(destinations: Vec<BackupDestination>) -> Self {
        Self {
            destinations: destinations.into(),
        }
    }

    /// Fetches the destination list from the server
    pub async fn fetch<S: DestinationStore + ?Sized>(store: &S) -> Result<Self> {
        let destinations = store
            .all_destinations()
            .await
            .map_err(|e| EditorError::remote(&e, "Failed to load destinations"))?;

        tracing::debug!("Loaded {} destinations into catalog", destinations.len());

        Ok(Self::new(destinations))
    }

    pub fn destinations(&self) -> &[BackupDestination] {
        &self.destinations
    }

    pub fn get(&self, id: Uuid) -> Option<&BackupDestination> {
        self.destinations.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    /// Fresh, unselected entries in catalog order
    pub fn selections(&self) -> Vec<DestinationSelection> {
        self.destinations
            .iter()
            .map(|d| DestinationSelection {
                id: d.id,
                name: d.name.clone(),
                selected: false,
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use strata_core::domain::destination::BackupType;

    pub(crate) fn destination(n: u128, name: &str) -> BackupDestination {
        BackupDestination {
            id: Uuid::from_u128(n),
            name: name.to_string(),
            destination_type: BackupType::LocalDisk,
            endpoint: format!("/srv/backups/{}", name),
            region: None,
            access_key: None,
            secret_key: None,
            is_active: true,
        }
    }

    #[test]
    fn test_selections_keep_catalog_order() {
        let catalog = DestinationCatalog::new(vec![
            destination(3, "nas"),
            destination(1, "s3"),
            destination(2, "ftp"),
        ]);

        let names: Vec<_> = catalog.selections().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["nas", "s3", "ftp"]);
        assert!(catalog.selections().iter().all(|s| !s.selected));
    }

    #[test]
    fn test_selections_are_independent_copies() {
        let catalog = DestinationCatalog::new(vec![destination(1, "nas")]);
        let shared = catalog.clone();

        let mut first = catalog.selections();
        first[0].selected = true;

        assert!(!shared.selections()[0].selected);
        assert_eq!(shared.len(), 1);
        assert!(shared.get(Uuid::from_u128(1)).is_some());
    }
}
