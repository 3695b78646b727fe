//! Persisted catalog documents.
//!
//! Providers live at `<root>/<shard>/<namespace>/<name>.json`, modules at
//! `<root>/<shard>/<namespace>/<name>/<target_system>.json`, where `shard` is the
//! lower-cased first character of the namespace.

use std::{
    path::{Component, Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use regsync_utils::fs::{read_json, to_pretty_json, walk_files, write_if_changed};
use tracing::{debug, trace};

use crate::{
    catalog::{CatalogDocument, EntryId, EntryKind},
    error::{RegistryError, Result},
};

static PROVIDER_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)\w/(?P<namespace>[^/]+?)/(?P<name>[^/]+?)\.json$")
        .expect("unable to compile provider path regex")
});

static MODULE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)\w/(?P<namespace>[^/]+?)/(?P<name>[^/]+?)/(?P<target>[^/]+?)\.json$")
        .expect("unable to compile module path regex")
});

pub fn document_path(root: &Path, id: &EntryId) -> PathBuf {
    let base = root.join(id.shard()).join(&id.namespace);
    match &id.target_system {
        Some(target) => base.join(&id.name).join(format!("{target}.json")),
        None => base.join(format!("{}.json", id.name)),
    }
}

pub fn load_document(root: &Path, id: &EntryId) -> Result<CatalogDocument> {
    let path = document_path(root, id);
    let doc: CatalogDocument = read_json(&path)?;
    trace!(entry = %id, count = doc.versions.len(), "loaded document");
    Ok(doc)
}

/// Serializes `doc` exactly as it is persisted.
pub fn render_document(path: &Path, doc: &CatalogDocument) -> Result<Vec<u8>> {
    to_pretty_json(doc).map_err(|source| {
        RegistryError::Serialize {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Writes `doc` for `id` unless the file already holds the same bytes.
///
/// Returns whether the file was written.
pub fn save_document(root: &Path, id: &EntryId, doc: &CatalogDocument) -> Result<bool> {
    let path = document_path(root, id);
    let bytes = render_document(&path, doc)?;
    let written = write_if_changed(&path, &bytes)?;
    debug!(entry = %id, written, "saved document");
    Ok(written)
}

fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel
        .components()
        .map(|c| {
            match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            }
        })
        .collect();
    Some(parts?.join("/"))
}

/// Extracts an entry identity from a document path below `root`.
pub fn parse_document_path(root: &Path, kind: EntryKind, path: &Path) -> Option<EntryId> {
    let rel = relative_slash_path(root, path)?;
    match kind {
        EntryKind::Provider => {
            let caps = PROVIDER_PATH_RE.captures(&rel)?;
            Some(EntryId::provider(&caps["namespace"], &caps["name"]))
        }
        EntryKind::Module => {
            let caps = MODULE_PATH_RE.captures(&rel)?;
            Some(EntryId::module(
                &caps["namespace"],
                &caps["name"],
                &caps["target"],
            ))
        }
    }
}

/// Finds every entry of `kind` below `root`, optionally restricted to namespaces starting
/// with `namespace_prefix` (case-insensitive). Sorted by identity.
pub fn discover(
    root: &Path,
    kind: EntryKind,
    namespace_prefix: Option<&str>,
) -> Result<Vec<EntryId>> {
    let prefix = namespace_prefix.map(str::to_lowercase);
    let mut entries: Vec<EntryId> = walk_files(root)?
        .iter()
        .filter_map(|path| parse_document_path(root, kind, path))
        .filter(|id| {
            prefix
                .as_deref()
                .map_or(true, |p| id.namespace.to_lowercase().starts_with(p))
        })
        .collect();
    entries.sort();
    debug!(%kind, root = %root.display(), count = entries.len(), "discovered entries");
    Ok(entries)
}

pub fn discover_providers(root: &Path, namespace_prefix: Option<&str>) -> Result<Vec<EntryId>> {
    discover(root, EntryKind::Provider, namespace_prefix)
}

pub fn discover_modules(root: &Path, namespace_prefix: Option<&str>) -> Result<Vec<EntryId>> {
    discover(root, EntryKind::Module, namespace_prefix)
}

/// Providers of one namespace, matched case-insensitively.
pub fn providers_in_namespace(root: &Path, namespace: &str) -> Result<Vec<EntryId>> {
    Ok(discover_providers(root, Some(namespace))?
        .into_iter()
        .filter(|id| id.namespace.eq_ignore_ascii_case(namespace))
        .collect())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::catalog::VersionRecord;

    #[test]
    fn test_document_paths() {
        let root = Path::new("/data");
        assert_eq!(
            document_path(root, &EntryId::provider("Hashicorp", "aws")),
            PathBuf::from("/data/h/Hashicorp/aws.json")
        );
        assert_eq!(
            document_path(root, &EntryId::module("acme", "vpc", "aws")),
            PathBuf::from("/data/a/acme/vpc/aws.json")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let id = EntryId::module("acme", "vpc", "aws");
        let doc = CatalogDocument {
            repository: None,
            versions: vec![VersionRecord::module("1.0.0", None)],
        };

        assert!(save_document(dir.path(), &id, &doc).unwrap());
        assert!(!save_document(dir.path(), &id, &doc).unwrap());
        assert_eq!(load_document(dir.path(), &id).unwrap(), doc);

        let text = fs::read_to_string(document_path(dir.path(), &id)).unwrap();
        assert_eq!(text, "{\n  \"versions\": [\n    {\n      \"version\": \"1.0.0\"\n    }\n  ]\n}");
    }

    #[test]
    fn test_discovery() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for id in [
            EntryId::provider("acme", "widgets"),
            EntryId::provider("acme", "gadgets"),
            EntryId::provider("zeta", "thing"),
        ] {
            save_document(root, &id, &CatalogDocument::default()).unwrap();
        }
        fs::write(root.join("README.md"), "ignored").unwrap();

        let all = discover_providers(root, None).unwrap();
        assert_eq!(
            all,
            vec![
                EntryId::provider("acme", "gadgets"),
                EntryId::provider("acme", "widgets"),
                EntryId::provider("zeta", "thing"),
            ]
        );
        assert_eq!(discover_providers(root, Some("ZE")).unwrap().len(), 1);
        assert_eq!(providers_in_namespace(root, "ACME").unwrap().len(), 2);
        assert!(providers_in_namespace(root, "acm").unwrap().is_empty());
        assert!(discover_modules(root, None).unwrap().is_empty());
    }

    #[test]
    fn test_module_discovery() {
        let dir = tempdir().unwrap();
        let id = EntryId::module("acme", "vpc", "aws");
        save_document(dir.path(), &id, &CatalogDocument::default()).unwrap();
        assert_eq!(discover_modules(dir.path(), None).unwrap(), vec![id]);
    }
}
