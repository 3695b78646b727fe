use nu_ansi_term::Color::{Green, Red, Yellow};
use regsync_operations::{sync::sync_all, RegsyncContext, Result, SyncOptions, SyncReport};
use tracing::info;

use crate::utils::{print_json, Colored};

pub async fn sync_catalog(ctx: &RegsyncContext, options: &SyncOptions, json: bool) -> Result<bool> {
    let report = sync_all(ctx, options).await?;

    if json {
        print_json(&report)?;
    } else {
        display_report(&report);
    }

    Ok(report.is_success())
}

fn display_report(report: &SyncReport) {
    for failed in &report.failed {
        info!("{} {}: {}", Colored(Red, "✗"), failed.entry, failed.error);
    }

    info!(
        "{} entries: {} updated, {} unchanged, {} skipped, {} failed",
        report.attempted,
        Colored(Green, report.updated),
        report.unchanged,
        Colored(Yellow, report.skipped),
        Colored(Red, report.failed.len()),
    );
}
