//! Tag listing over the git smart-HTTP ref advertisement.
//!
//! `GET <repo>.git/info/refs?service=git-upload-pack` answers with a sequence of pkt-lines:
//! a four hex digit length (including itself) followed by the payload, with `0000` as a
//! flush packet. Each ref line is `<oid> <refname>`, the first one followed by a NUL and the
//! capability list. Annotated tags are advertised twice, the second time as
//! `refs/tags/<name>^{}` carrying the commit the tag object points to.

use crate::types::{RepoRef, Tag};

const TAG_PREFIX: &str = "refs/tags/";
const PEELED_SUFFIX: &str = "^{}";

pub fn refs_url(repo: &RepoRef) -> String {
    format!("{}.git/info/refs?service=git-upload-pack", repo.url())
}

/// Extracts tags from a ref advertisement, in advertisement order.
///
/// Annotated tags resolve to their peeled commit id.
pub fn parse_tag_refs(body: &[u8]) -> Result<Vec<Tag>, String> {
    let mut tags: Vec<Tag> = Vec::new();
    let mut pos = 0;

    while pos < body.len() {
        let header = body
            .get(pos..pos + 4)
            .ok_or_else(|| format!("truncated pkt-line header at byte {pos}"))?;
        let header = std::str::from_utf8(header)
            .map_err(|_| format!("invalid pkt-line header at byte {pos}"))?;
        let len = usize::from_str_radix(header, 16)
            .map_err(|_| format!("invalid pkt-line length `{header}` at byte {pos}"))?;

        if len == 0 {
            pos += 4;
            continue;
        }
        if len < 4 {
            return Err(format!("invalid pkt-line length {len} at byte {pos}"));
        }

        let payload = body
            .get(pos + 4..pos + len)
            .ok_or_else(|| format!("truncated pkt-line at byte {pos}"))?;
        pos += len;

        let line = String::from_utf8_lossy(payload);
        let line = line.split('\0').next().unwrap_or_default().trim_end();
        if line.starts_with('#') {
            continue;
        }

        let Some((oid, refname)) = line.split_once(' ') else {
            continue;
        };
        let Some(name) = refname.strip_prefix(TAG_PREFIX) else {
            continue;
        };

        match name.strip_suffix(PEELED_SUFFIX) {
            Some(base) => {
                if let Some(tag) = tags.iter_mut().find(|t| t.name == base) {
                    tag.commit = Some(oid.to_string());
                } else {
                    tags.push(Tag::with_commit(base, oid));
                }
            }
            None => {
                if !tags.iter().any(|t| t.name == name) {
                    tags.push(Tag::with_commit(name, oid));
                }
            }
        }
    }

    Ok(tags)
}
