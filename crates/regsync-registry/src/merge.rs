//! Version filtering and merging.
//!
//! Candidates coming from upstream go through three filters before they become version
//! records: they must parse as a semantic version, must not already be in the document,
//! and must not be blacklisted. New records are then merged into the document and the
//! whole list is re-sorted.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::{
    blacklist::Blacklist,
    catalog::{CatalogDocument, EntryId, VersionRecord},
    version::{compare_desc, is_valid, normalize},
};

/// A candidate that survived filtering, with its normalized version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<T> {
    pub version: String,
    pub item: T,
}

/// A candidate dropped by the blacklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suppression {
    pub version: String,
    pub reason: String,
}

/// The result of filtering one upstream batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<T> {
    pub accepted: Vec<Candidate<T>>,
    pub suppressed: Vec<Suppression>,
    /// Tags that are not semantic versions.
    pub ignored: usize,
    /// Candidates already present in the document or repeated in the batch.
    pub known: usize,
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self {
            accepted: Vec::new(),
            suppressed: Vec::new(),
            ignored: 0,
            known: 0,
        }
    }
}

/// Filters `items` (tags or releases) down to the new, allowed semantic versions.
pub fn select_candidates<T, F>(
    id: &EntryId,
    doc: &CatalogDocument,
    blacklist: &Blacklist,
    items: Vec<T>,
    tag_of: F,
) -> Selection<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen: HashSet<String> = doc
        .versions
        .iter()
        .map(|v| normalize(&v.version).to_string())
        .collect();
    let mut selection = Selection::default();

    for item in items {
        let tag = tag_of(&item);
        if !is_valid(tag) {
            selection.ignored += 1;
            continue;
        }

        let version = normalize(tag).to_string();
        if !seen.insert(version.clone()) {
            selection.known += 1;
            continue;
        }

        if let Some(reason) = blacklist.reason(id, &version) {
            info!(entry = %id, %version, reason, "skipping blacklisted version");
            selection.suppressed.push(Suppression {
                version,
                reason: reason.to_string(),
            });
            continue;
        }

        selection.accepted.push(Candidate { version, item });
    }

    debug!(
        entry = %id,
        accepted = selection.accepted.len(),
        suppressed = selection.suppressed.len(),
        ignored = selection.ignored,
        known = selection.known,
        "selected candidates"
    );
    selection
}

/// Sorts records by descending semantic version.
pub fn sort_versions(versions: &mut [VersionRecord]) {
    versions.sort_by(|a, b| compare_desc(&a.version, &b.version));
}

/// Adds `new` records to `doc`, keeping existing records on a version clash, and re-sorts.
///
/// Returns the number of records added.
pub fn merge_records(doc: &mut CatalogDocument, new: Vec<VersionRecord>) -> usize {
    let mut present: HashSet<String> = doc
        .versions
        .iter()
        .map(|v| normalize(&v.version).to_string())
        .collect();

    let before = doc.versions.len();
    for record in new {
        if present.insert(normalize(&record.version).to_string()) {
            doc.versions.push(record);
        }
    }
    sort_versions(&mut doc.versions);
    doc.versions.len() - before
}
