//! Module synchronization: git tags to version records.

use regsync_registry::{
    merge::{merge_records, select_candidates},
    storage, EntryId, VersionRecord,
};
use tracing::{debug, info};

use crate::{context::RegsyncContext, error::Result, types::EntryOutcome};

/// Brings the document of module `id` up to date with its repository tags.
///
/// The tag list is the complete upstream state, so the merge always runs and the document
/// is only rewritten when its serialized form changes.
pub async fn sync_module(ctx: &RegsyncContext, id: &EntryId) -> Result<EntryOutcome> {
    let root = &ctx.settings().modules_dir;
    let mut doc = storage::load_document(root, id)?;
    let repo = id.repository(&doc)?;

    let tags = ctx.remote().list_tags(&repo).await?;
    debug!(module = %id, repository = %repo, count = tags.len(), "listed tags");

    let selection = select_candidates(id, &doc, ctx.blacklist(), tags, |tag| tag.name.as_str());
    let records = selection
        .accepted
        .into_iter()
        .map(|candidate| VersionRecord::module(candidate.version, candidate.item.commit))
        .collect();

    let added = merge_records(&mut doc, records);
    let written = storage::save_document(root, id, &doc)?;
    if written {
        info!(module = %id, added, "updated module");
    }

    Ok(EntryOutcome::from_write(added, written))
}
