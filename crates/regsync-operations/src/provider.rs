//! Provider synchronization: releases to fully resolved version records.

use std::sync::{Arc, Mutex, PoisonError};

use regsync_registry::{
    artifacts::ReleaseArtifacts,
    checksums::parse_checksums,
    error::RegistryError,
    manifest::{default_protocols, parse_protocols},
    merge::{merge_records, select_candidates},
    storage,
    version::{is_valid, normalize},
    CatalogDocument, EntryId, VersionRecord,
};
use regsync_remote::types::{Release, RepoRef};
use tracing::{debug, info, warn};

use crate::{
    context::RegsyncContext,
    error::Result,
    parallel::run_all,
    types::EntryOutcome,
};

/// Brings the document of provider `id` up to date with its GitHub releases.
pub async fn sync_provider(ctx: &RegsyncContext, id: &EntryId) -> Result<EntryOutcome> {
    let root = &ctx.settings().providers_dir;
    let mut doc = storage::load_document(root, id)?;
    let repo = id.repository(&doc)?;

    if ctx.settings().feed_shortcut && feed_is_current(ctx, &repo, &doc).await {
        debug!(provider = %id, "latest feed release already known");
        return Ok(EntryOutcome::Skipped);
    }

    let releases = ctx.remote().fetch_releases(&repo).await?;
    let selection = select_candidates(id, &doc, ctx.blacklist(), releases, |release| {
        release.tag_name.as_str()
    });
    if selection.accepted.is_empty() {
        debug!(provider = %id, "no new versions");
    }

    let releases: Vec<Release> = selection.accepted.into_iter().map(|c| c.item).collect();
    let records = resolve_versions(ctx, &repo, releases).await?;
    let added = merge_records(&mut doc, records);
    let written = storage::save_document(root, id, &doc)?;
    if written {
        info!(provider = %id, added, "updated provider");
    }

    Ok(EntryOutcome::from_write(added, written))
}

/// Whether the newest semantic version in the releases feed is already in `doc`.
///
/// Any feed failure answers `false` so the caller falls back to the full fetch.
async fn feed_is_current(ctx: &RegsyncContext, repo: &RepoRef, doc: &CatalogDocument) -> bool {
    let tags = match ctx.remote().poll_feed(&repo.releases_feed_url()).await {
        Ok(tags) => tags,
        Err(err) => {
            debug!(repository = %repo, "releases feed unavailable: {err}");
            return false;
        }
    };

    let Some(latest) = tags.iter().find(|tag| is_valid(&tag.name)) else {
        return false;
    };
    let latest = normalize(&latest.name);
    doc.versions
        .iter()
        .any(|record| normalize(&record.version) == latest)
}

/// Resolves every release in parallel. The first failure fails the entry.
async fn resolve_versions(
    ctx: &RegsyncContext,
    repo: &RepoRef,
    releases: Vec<Release>,
) -> Result<Vec<VersionRecord>> {
    let records = Arc::new(Mutex::new(Vec::new()));

    let tasks = releases.into_iter().map(|release| {
        let ctx = ctx.clone();
        let repo = repo.clone();
        let records = records.clone();
        async move {
            if let Some(record) = resolve_release(&ctx, &repo, &release).await? {
                records
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(record);
            }
            Ok(())
        }
    });

    let mut errors = run_all(tasks, ctx.settings().version_concurrency).await;
    if !errors.is_empty() {
        for err in errors.iter().skip(1) {
            warn!(repository = %repo, "{err}");
        }
        return Err(errors.swap_remove(0));
    }

    let records = std::mem::take(&mut *records.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(records)
}

/// Builds the version record of one release, or `None` when it has no platform archives.
pub async fn resolve_release(
    ctx: &RegsyncContext,
    repo: &RepoRef,
    release: &Release,
) -> Result<Option<VersionRecord>> {
    let label = format!("{repo} {}", release.tag_name);
    let artifacts = ReleaseArtifacts::from_release(release);

    if artifacts.targets.is_empty() {
        info!(release = %label, "no platform archives, skipping release");
        return Ok(None);
    }

    let (sums_url, _) = artifacts.checksum_urls(&label)?;
    let sums = ctx
        .remote()
        .download_asset(sums_url)
        .await?
        .ok_or_else(|| {
            RegistryError::ChecksumsUnavailable {
                release: label.clone(),
                url: sums_url.to_string(),
            }
        })?;
    let checksums = parse_checksums(&sums)?;

    let protocols = match &artifacts.manifest_url {
        Some(url) => match ctx.remote().download_asset(url).await? {
            Some(content) => {
                parse_protocols(&content).unwrap_or_else(|| {
                    warn!(
                        release = %label,
                        %url,
                        "unreadable manifest, assuming default protocols"
                    );
                    default_protocols()
                })
            }
            None => {
                warn!(
                    release = %label,
                    %url,
                    "manifest not downloadable, assuming default protocols"
                );
                default_protocols()
            }
        },
        None => {
            warn!(release = %label, "no manifest, assuming default protocols");
            default_protocols()
        }
    };

    let record = artifacts.into_record(&label, &checksums, protocols)?;
    debug!(release = %label, targets = record.targets.len(), "resolved release");
    Ok(Some(record))
}
