//! ID resolver module
//!
//! Handles resolution of UUID prefixes to full UUIDs by querying the API.
//! This allows users to specify short, unambiguous prefixes instead of full UUIDs.

use anyhow::{Context, Result, anyhow};
use strata_client::ApiClient;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Picks the single id starting with `prefix`
///
/// `kind` names the resource in error messages ("job", "source", ...).
fn match_prefix(ids: impl IntoIterator<Item = Uuid>, prefix: &str, kind: &str) -> Result<Uuid> {
    let prefix = prefix.to_lowercase();
    let matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!(
            "No {} found with ID starting with '{}'",
            kind,
            prefix
        )),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple {}s: {}",
                prefix,
                kind,
                ids.join(", ")
            ))
        }
    }
}

/// Resolve a backup job ID or prefix to a full UUID
///
/// A full UUID is returned as is; a prefix is matched against the job list.
pub async fn resolve_job_id(client: &ApiClient, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let jobs = client
        .list_jobs()
        .await
        .context("Failed to fetch jobs for ID resolution")?;

    match_prefix(jobs.iter().map(|j| j.id), &id_or_prefix.as_str(), "job")
}

pub async fn resolve_source_id(client: &ApiClient, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let sources = client
        .list_sources()
        .await
        .context("Failed to fetch sources for ID resolution")?;

    match_prefix(sources.iter().map(|s| s.id), &id_or_prefix.as_str(), "source")
}

pub async fn resolve_destination_id(
    client: &ApiClient,
    id_or_prefix: &IdOrPrefix,
) -> Result<Uuid> {
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let destinations = client
        .list_destinations()
        .await
        .context("Failed to fetch destinations for ID resolution")?;

    match_prefix(
        destinations.iter().map(|d| d.id),
        &id_or_prefix.as_str(),
        "destination",
    )
}

pub async fn resolve_email_config_id(
    client: &ApiClient,
    id_or_prefix: &IdOrPrefix,
) -> Result<Uuid> {
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let configs = client
        .list_email_configs()
        .await
        .context("Failed to fetch email configurations for ID resolution")?;

    match_prefix(
        configs.iter().map(|c| c.id),
        &id_or_prefix.as_str(),
        "email configuration",
    )
}

pub async fn resolve_user_id(client: &ApiClient, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let users = client
        .list_users()
        .await
        .context("Failed to fetch users for ID resolution")?;

    match_prefix(users.iter().map(|u| u.id), &id_or_prefix.as_str(), "user")
}

/// Resolves each id or prefix against one destination list fetch
pub async fn resolve_destination_ids(client: &ApiClient, inputs: &[String]) -> Result<Vec<Uuid>> {
    let parsed: Vec<IdOrPrefix> = inputs.iter().map(|s| IdOrPrefix::parse(s)).collect();
    if parsed.iter().all(|p| p.as_uuid().is_some()) {
        return Ok(parsed.iter().filter_map(IdOrPrefix::as_uuid).collect());
    }

    let known: Vec<Uuid> = client
        .list_destinations()
        .await
        .context("Failed to fetch destinations for ID resolution")?
        .iter()
        .map(|d| d.id)
        .collect();

    parsed
        .iter()
        .map(|p| match p.as_uuid() {
            Some(uuid) => Ok(uuid),
            None => match_prefix(known.iter().copied(), &p.as_str(), "destination"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<Uuid> {
        [
            "3f2c0d9e-8f43-4f7b-9a53-0c1d7c8d4b21",
            "3f9a1b2c-0000-4000-8000-000000000001",
            "a0b1c2d3-0000-4000-8000-000000000002",
        ]
        .iter()
        .map(|s| Uuid::parse_str(s).unwrap())
        .collect()
    }

    #[test]
    fn test_unique_prefix_resolves() {
        let id = match_prefix(ids(), "3f2", "job").unwrap();
        assert_eq!(id, ids()[0]);

        let id = match_prefix(ids(), "A0B", "job").unwrap();
        assert_eq!(id, ids()[2]);
    }

    #[test]
    fn test_ambiguous_prefix_lists_matches() {
        let err = match_prefix(ids(), "3f", "source").unwrap_err().to_string();
        assert!(err.starts_with("Ambiguous prefix '3f' matches multiple sources"));
        assert!(err.contains("3f2c0d9e"));
        assert!(err.contains("3f9a1b2c"));
    }

    #[test]
    fn test_unknown_prefix() {
        let err = match_prefix(ids(), "ff", "user").unwrap_err();
        assert_eq!(err.to_string(), "No user found with ID starting with 'ff'");
    }
}
