use regsync_registry::{
    storage,
    validate::{validate_document, ValidationError},
    EntryKind,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{context::Settings, error::Result, sync::discover_entries, types::SyncOptions};

/// Invariant violations found in one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentIssues {
    pub entry: String,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub checked: usize,
    pub invalid: Vec<DocumentIssues>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Checks every selected persisted document against the catalog invariants.
pub fn validate_catalog(settings: &Settings, options: &SyncOptions) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    for id in discover_entries(settings, options)? {
        let root = match id.kind() {
            EntryKind::Module => &settings.modules_dir,
            EntryKind::Provider => &settings.providers_dir,
        };
        report.checked += 1;

        let errors: Vec<ValidationError> = match storage::load_document(root, &id) {
            Ok(doc) => validate_document(id.kind(), &doc),
            Err(err) => vec![ValidationError {
                version: String::new(),
                message: err.to_string(),
            }],
        };

        if errors.is_empty() {
            debug!(entry = %id, "document is valid");
            continue;
        }
        for err in &errors {
            warn!(entry = %id, "{err}");
        }
        report.invalid.push(DocumentIssues {
            entry: id.to_string(),
            errors: errors.iter().map(ToString::to_string).collect(),
        });
    }

    Ok(report)
}
