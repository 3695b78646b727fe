use nu_ansi_term::Color::{Green, Red};
use regsync_operations::{validate::validate_catalog, Result, Settings, SyncOptions};
use tracing::info;

use crate::utils::{print_json, Colored};

pub fn validate(settings: &Settings, options: &SyncOptions, json: bool) -> Result<bool> {
    let report = validate_catalog(settings, options)?;

    if json {
        print_json(&report)?;
        return Ok(report.is_valid());
    }

    for issues in &report.invalid {
        info!("{}", Colored(Red, &issues.entry));
        for error in &issues.errors {
            info!("  - {error}");
        }
    }

    if report.is_valid() {
        info!(
            "{} {} documents valid",
            Colored(Green, "✓"),
            report.checked
        );
    } else {
        info!(
            "{} {} of {} documents invalid",
            Colored(Red, "✗"),
            report.invalid.len(),
            report.checked
        );
    }

    Ok(report.is_valid())
}
