use std::path::PathBuf;

use nu_ansi_term::Color::{Green, Red};
use regsync_operations::{add::add_entry, OperationError, RegsyncContext, Result};
use regsync_registry::EntryKind;
use tracing::info;

use crate::utils::{print_json, write_file, Colored};

pub async fn add(
    ctx: &RegsyncContext,
    kind: EntryKind,
    repository: &str,
    output: Option<PathBuf>,
    json: bool,
) -> Result<bool> {
    let outcome = add_entry(ctx, kind, repository).await;

    if let Some(output) = &output {
        let content = serde_json::to_string_pretty(&outcome)
            .map_err(|err| OperationError::Custom(format!("serializing add result: {err}")))?;
        write_file(output, &content)?;
    }

    if json {
        print_json(&outcome)?;
    } else if outcome.is_success() {
        info!(
            "{} added {kind} {} at {}",
            Colored(Green, "✓"),
            repository,
            outcome.file
        );
    } else {
        info!("{} {}", Colored(Red, "✗"), outcome.validation);
    }

    Ok(outcome.is_success())
}
