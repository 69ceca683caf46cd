//! Strata Editor
//!
//! Editing sessions for backup jobs and sources.
//!
//! An editor owns a typed copy of the entity's editable fields, each carrying
//! its own enabled/required state. Transitions (changing the notification
//! policy, changing the database type) recompute that state through pure
//! functions in [`field`], so the rules can be tested without any front end.
//!
//! Editors talk to the server only through the store traits in [`store`].

pub mod catalog;
pub mod error;
pub mod field;
pub mod job;
pub mod source;
pub mod store;

pub use catalog::{DestinationCatalog, DestinationSelection};
pub use error::{EditorError, Result};
pub use field::{Field, FieldFlags};
pub use job::JobEditor;
pub use source::{ConnectionTest, SourceEditor};
pub use store::{DestinationStore, JobStore, SourceStore};

use uuid::Uuid;

/// Whether an editor creates a new entity or updates an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(Uuid),
}

impl EditorMode {
    pub fn from_id(id: Option<Uuid>) -> Self {
        match id {
            Some(id) => EditorMode::Edit(id),
            None => EditorMode::Create,
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self, EditorMode::Edit(_))
    }
}
