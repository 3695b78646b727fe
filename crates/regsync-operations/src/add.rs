//! Registers a new catalog entry from its repository name.
//!
//! The entry is created empty and then synchronized through the same engine as every other
//! entry, so a newly added entry is exactly what a later sync would produce.

use std::{fs, sync::LazyLock};

use regex::Regex;
use regsync_registry::{storage, CatalogDocument, EntryId, EntryKind};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    context::RegsyncContext,
    error::{OperationError, Result},
    sync::sync_entry,
};

static PROVIDER_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<namespace>[a-zA-Z0-9-]+)/terraform-provider-(?P<name>[a-zA-Z0-9-]*)")
        .expect("unable to compile provider repository regex")
});

static MODULE_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<namespace>[a-zA-Z0-9-]+)/terraform-(?P<target>[a-zA-Z0-9]*)-(?P<name>[a-zA-Z0-9-]*)",
    )
    .expect("unable to compile module repository regex")
});

/// Result of an add, in the shape consumed by the submission workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    pub file: String,
    pub namespace: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Empty on success, otherwise the reason the entry was rejected.
    pub validation: String,
    pub exists: bool,
}

impl AddOutcome {
    pub fn is_success(&self) -> bool {
        self.validation.is_empty()
    }
}

fn valid_part(part: &str) -> bool {
    !part.is_empty() && !part.starts_with('-') && !part.ends_with('-')
}

/// Parses `owner/terraform-provider-<name>` (lower-cased) or
/// `owner/terraform-<target>-<name>` into an entry identity.
pub fn parse_repository(kind: EntryKind, repository: &str) -> Result<EntryId> {
    let invalid = || OperationError::InvalidRepository(repository.to_string());
    let id = match kind {
        EntryKind::Provider => {
            let lowered = repository.to_lowercase();
            let caps = PROVIDER_REPO_RE.captures(&lowered).ok_or_else(invalid)?;
            EntryId::provider(&caps["namespace"], &caps["name"])
        }
        EntryKind::Module => {
            let caps = MODULE_REPO_RE.captures(repository).ok_or_else(invalid)?;
            EntryId::module(&caps["namespace"], &caps["name"], &caps["target"])
        }
    };

    let parts_valid = valid_part(&id.namespace)
        && valid_part(&id.name)
        && id.target_system.as_deref().map_or(true, valid_part);
    if !parts_valid {
        return Err(invalid());
    }
    Ok(id)
}

/// Adds the entry for `repository` and runs its first sync.
///
/// Never fails outright: any problem ends up in [`AddOutcome::validation`], with `exists`
/// set when the repository is already in the catalog.
pub async fn add_entry(ctx: &RegsyncContext, kind: EntryKind, repository: &str) -> AddOutcome {
    let mut outcome = AddOutcome::default();
    if let Err(err) = try_add(ctx, kind, repository, &mut outcome).await {
        error!(%kind, repository, "unable to add {kind}: {err}");
        outcome.validation = err.to_string();
    }
    outcome
}

async fn try_add(
    ctx: &RegsyncContext,
    kind: EntryKind,
    repository: &str,
    outcome: &mut AddOutcome,
) -> Result<()> {
    let id = parse_repository(kind, repository)?;
    let root = match kind {
        EntryKind::Module => &ctx.settings().modules_dir,
        EntryKind::Provider => &ctx.settings().providers_dir,
    };

    let submitted = id.default_repository();
    let existing = storage::discover(root, kind, None)?;
    if let Some(found) = existing.iter().find(|other| {
        other
            .default_repository()
            .url()
            .eq_ignore_ascii_case(&submitted.url())
    }) {
        outcome.exists = true;
        return Err(OperationError::AlreadyExists(
            found.default_repository().url(),
        ));
    }

    let path = storage::document_path(root, &id);
    storage::save_document(root, &id, &CatalogDocument::default())?;

    let versions = match sync_entry(ctx, &id).await {
        Ok(_) => storage::load_document(root, &id)?.versions.len(),
        Err(err) => {
            discard(&path);
            return Err(err);
        }
    };
    if versions == 0 {
        discard(&path);
        return Err(OperationError::NoVersions {
            kind,
            repository: submitted.url(),
        });
    }

    info!(entry = %id, versions, "added {kind}");
    outcome.file = path.display().to_string();
    outcome.namespace = id.namespace;
    outcome.name = id.name;
    outcome.target = id.target_system;
    Ok(())
}

fn discard(path: &std::path::Path) {
    if let Err(err) = fs::remove_file(path) {
        warn!(path = %path.display(), "failed to remove rejected document: {err}");
    }
}

#[cfg(test)]
mod tests {
    use regsync_registry::blacklist::Blacklist;
    use regsync_remote::types::RepoRef;
    use tempfile::tempdir;

    use super::*;
    use crate::test_utils::{context, provider_release, versions, write_document, FakeRemote};

    const SUMS: &[u8] = include_bytes!("testdata/SHA256SUMS");

    #[test]
    fn test_parse_repository() {
        assert_eq!(
            parse_repository(EntryKind::Provider, "Acme/Terraform-Provider-Widgets").unwrap(),
            EntryId::provider("acme", "widgets")
        );
        assert_eq!(
            parse_repository(
                EntryKind::Provider,
                "https://github.com/acme/terraform-provider-acme"
            )
            .unwrap(),
            EntryId::provider("acme", "acme")
        );
        assert_eq!(
            parse_repository(EntryKind::Module, "acme/terraform-aws-vpc-peering").unwrap(),
            EntryId::module("acme", "vpc-peering", "aws")
        );

        for bad in ["acme/widgets", "acme/terraform-provider-", "acme/terraform-provider-x-"] {
            assert!(matches!(
                parse_repository(EntryKind::Provider, bad),
                Err(OperationError::InvalidRepository(_))
            ));
        }
        assert!(parse_repository(EntryKind::Module, "acme/terraform--vpc").is_err());
    }

    #[tokio::test]
    async fn test_add_provider() {
        let dir = tempdir().unwrap();
        let repo = RepoRef::new("acme", "terraform-provider-acme");
        let remote = FakeRemote::default()
            .with_release(
                "acme/terraform-provider-acme",
                provider_release(&repo, "2.0.0", &["darwin_amd64", "linux_amd64"], true, false),
            )
            .with_asset(
                repo.release_asset_url("v2.0.0", "terraform-provider-acme_2.0.0_SHA256SUMS"),
                SUMS,
            );
        let (ctx, _) = context(dir.path(), remote, Blacklist::default());
        let root = ctx.settings().providers_dir.clone();

        let outcome = add_entry(&ctx, EntryKind::Provider, "acme/terraform-provider-acme").await;
        assert!(outcome.is_success(), "{}", outcome.validation);
        assert!(!outcome.exists);
        assert_eq!(outcome.namespace, "acme");
        assert_eq!(outcome.name, "acme");
        assert_eq!(outcome.target, None);
        assert!(outcome.file.ends_with("acme.json"));

        let id = EntryId::provider("acme", "acme");
        assert_eq!(versions(&root, &id), vec!["2.0.0"]);

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["validation"], "");
        assert!(json.get("target").is_none());
    }

    #[tokio::test]
    async fn test_add_module() {
        let dir = tempdir().unwrap();
        let remote = FakeRemote::default().with_tags("acme/terraform-aws-vpc", &["v1.0.0"]);
        let (ctx, _) = context(dir.path(), remote, Blacklist::default());

        let outcome = add_entry(&ctx, EntryKind::Module, "acme/terraform-aws-vpc").await;
        assert!(outcome.is_success(), "{}", outcome.validation);
        assert_eq!(outcome.target.as_deref(), Some("aws"));
        assert_eq!(
            versions(
                &ctx.settings().modules_dir,
                &EntryId::module("acme", "vpc", "aws")
            ),
            vec!["1.0.0"]
        );
    }

    #[tokio::test]
    async fn test_duplicate_is_rejected() {
        let dir = tempdir().unwrap();
        let (ctx, remote) = context(dir.path(), FakeRemote::default(), Blacklist::default());
        let root = ctx.settings().providers_dir.clone();
        write_document(&root, &EntryId::provider("Acme", "acme"), &["1.0.0"]);

        let outcome = add_entry(&ctx, EntryKind::Provider, "acme/terraform-provider-acme").await;
        assert!(outcome.exists);
        assert!(outcome
            .validation
            .starts_with("Repository already exists in the registry"));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_versions_is_rejected() {
        let dir = tempdir().unwrap();
        let repo = RepoRef::new("acme", "terraform-provider-empty");
        let remote = FakeRemote::default().with_release(
            "acme/terraform-provider-empty",
            provider_release(&repo, "1.0.0", &[], true, false),
        );
        let (ctx, _) = context(dir.path(), remote, Blacklist::default());
        let root = ctx.settings().providers_dir.clone();

        let outcome = add_entry(&ctx, EntryKind::Provider, "acme/terraform-provider-empty").await;
        assert!(!outcome.is_success());
        assert!(!outcome.exists);
        assert!(outcome.validation.starts_with("No valid versions are detected"));
        assert!(!storage::document_path(&root, &EntryId::provider("acme", "empty")).exists());
    }

    #[tokio::test]
    async fn test_failed_sync_is_reported() {
        let dir = tempdir().unwrap();
        let repo = RepoRef::new("acme", "terraform-provider-acme");
        let remote = FakeRemote::default().with_release(
            "acme/terraform-provider-acme",
            provider_release(&repo, "2.0.0", &["linux_amd64"], false, false),
        );
        let (ctx, _) = context(dir.path(), remote, Blacklist::default());

        let outcome = add_entry(&ctx, EntryKind::Provider, "acme/terraform-provider-acme").await;
        assert!(outcome.validation.contains("missing checksums artifact"));
        assert!(outcome.file.is_empty());
    }
}
