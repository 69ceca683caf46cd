//! Login session
//!
//! The token returned at login is kept in a small JSON file so later
//! commands can reuse it. The server may flag the account as needing a new
//! password; while that flag is stored, only the auth commands run.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strata_core::dto::auth::JwtResponse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub email: String,
    pub token: String,
    #[serde(default)]
    pub must_change_password: bool,
}

impl Session {
    pub fn from_login(email: impl Into<String>, resp: JwtResponse) -> Self {
        Self {
            email: email.into(),
            token: resp.token,
            must_change_password: resp.must_change_password,
        }
    }

    /// Reads the session file; `None` when there is none
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        let session = serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt session file {}", path.display()))?;

        Ok(Some(session))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)
            .with_context(|| format!("Failed to write session file {}", path.display()))?;

        tracing::debug!("Saved session for {} to {}", self.email, path.display());
        Ok(())
    }

    /// Removes the session file, returning whether one existed
    pub fn clear(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove session file {}", path.display()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        assert_eq!(Session::load(&path).unwrap(), None);

        let session = Session::from_login(
            "admin@example.com",
            JwtResponse {
                token: "eyJ.abc".to_string(),
                must_change_password: true,
            },
        );
        session.save(&path).unwrap();
        assert_eq!(Session::load(&path).unwrap(), Some(session));

        assert!(Session::clear(&path).unwrap());
        assert!(!Session::clear(&path).unwrap());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let err = Session::load(&path).unwrap_err();
        assert!(err.to_string().starts_with("Corrupt session file"));
    }
}
