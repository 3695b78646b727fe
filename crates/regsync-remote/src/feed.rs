use std::sync::LazyLock;

use regex::Regex;

use crate::types::Tag;

static ENTRY_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<entry[\s>].*?<id>\s*([^<]*?)\s*</id>")
        .expect("unable to compile feed entry regex")
});

static TAG_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".*/([a-zA-Z0-9.\-_+]+)$").expect("unable to compile feed tag regex")
});

/// Extracts release tags from a GitHub releases Atom feed, newest first.
///
/// Each entry id looks like `tag:github.com,2008:Repository/<id>/<tag>`; the last path
/// segment is the tag.
pub fn parse_release_feed(body: &str) -> Result<Vec<Tag>, String> {
    ENTRY_ID_RE
        .captures_iter(body)
        .map(|caps| {
            let id = &caps[1];
            TAG_TAIL_RE
                .captures(id)
                .map(|tail| Tag::new(&tail[1]))
                .ok_or_else(|| format!("could not parse feed entry id `{id}`"))
        })
        .collect()
}
