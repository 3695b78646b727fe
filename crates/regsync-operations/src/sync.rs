use std::sync::{Arc, Mutex, PoisonError};

use regsync_registry::{storage, EntryId, EntryKind};
use tracing::{debug, error, info};

use crate::{
    context::{RegsyncContext, Settings},
    error::{OperationError, Result},
    module::sync_module,
    parallel::run_all,
    provider::sync_provider,
    types::{EntryOutcome, FailedEntry, SyncOptions, SyncReport},
};

/// Discovers the catalog entries selected by `options`.
pub fn discover_entries(settings: &Settings, options: &SyncOptions) -> Result<Vec<EntryId>> {
    let prefix = options.namespace_prefix.as_deref();
    let mut entries = Vec::new();
    if options.modules {
        entries.extend(storage::discover_modules(&settings.modules_dir, prefix)?);
    }
    if options.providers {
        entries.extend(storage::discover_providers(&settings.providers_dir, prefix)?);
    }
    debug!(count = entries.len(), "discovered entries");
    Ok(entries)
}

/// Synchronizes one entry of either kind. Errors carry the entry identity.
pub async fn sync_entry(ctx: &RegsyncContext, id: &EntryId) -> Result<EntryOutcome> {
    let result = match id.kind() {
        EntryKind::Module => sync_module(ctx, id).await,
        EntryKind::Provider => sync_provider(ctx, id).await,
    };
    result.map_err(|err| err.in_entry(id))
}

/// Synchronizes every selected entry with `entry_concurrency` in flight.
///
/// Every entry is attempted. Failures are logged with the entry identity and collected in the
/// report rather than aborting the run.
pub async fn sync_all(ctx: &RegsyncContext, options: &SyncOptions) -> Result<SyncReport> {
    let entries = discover_entries(ctx.settings(), options)?;
    let report = Arc::new(Mutex::new(SyncReport {
        attempted: entries.len(),
        ..SyncReport::default()
    }));

    let tasks = entries.into_iter().map(|id| {
        let ctx = ctx.clone();
        let report = report.clone();
        async move {
            let result = sync_entry(&ctx, &id).await;
            let mut report = report.lock().unwrap_or_else(PoisonError::into_inner);
            match result {
                Ok(outcome) => report.record(outcome),
                Err(err) => {
                    error!(
                        kind = %id.kind(),
                        namespace = %id.namespace,
                        name = %id.name,
                        target_system = id.target_system.as_deref().unwrap_or_default(),
                        "{err}"
                    );
                    let error = match err {
                        OperationError::Entry { source, .. } => source.to_string(),
                        err => err.to_string(),
                    };
                    report.failed.push(FailedEntry {
                        entry: id.to_string(),
                        error,
                    });
                }
            }
            Ok(())
        }
    });

    for err in run_all(tasks, ctx.settings().entry_concurrency).await {
        error!("{err}");
        report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .failed
            .push(FailedEntry {
                entry: String::new(),
                error: err.to_string(),
            });
    }

    let mut report = std::mem::take(&mut *report.lock().unwrap_or_else(PoisonError::into_inner));
    report.failed.sort_by(|a, b| a.entry.cmp(&b.entry));
    info!(
        attempted = report.attempted,
        updated = report.updated,
        unchanged = report.unchanged,
        skipped = report.skipped,
        failed = report.failed.len(),
        "sync finished"
    );
    Ok(report)
}
