//! Versions that must never enter the catalog.
//!
//! The blacklist is loaded once by the entry point and handed to whatever needs it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    catalog::{EntryId, EntryKind},
    error::{ErrorContext, RegistryError, Result},
    version::normalize,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderBlacklistEntry {
    pub namespace: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleBlacklistEntry {
    pub namespace: String,
    pub name: String,
    pub target_system: String,
    pub version: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blacklist {
    #[serde(default)]
    pub providers: Vec<ProviderBlacklistEntry>,
    #[serde(default)]
    pub modules: Vec<ModuleBlacklistEntry>,
}

impl Blacklist {
    /// Reads the blacklist document. No path, or a path that does not exist, is an empty
    /// blacklist; a document that cannot be parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!(path = %path.display(), "no blacklist file");
            return Ok(Self::default());
        }

        let content = std::fs::read(path)
            .with_context(|| format!("reading blacklist {}", path.display()))?;
        let blacklist: Blacklist =
            serde_json::from_slice(&content).map_err(|source| {
                RegistryError::Blacklist {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        debug!(
            providers = blacklist.providers.len(),
            modules = blacklist.modules.len(),
            "loaded blacklist"
        );
        Ok(blacklist)
    }

    /// Returns the reason when `version` of `id` is blacklisted.
    ///
    /// Versions are compared without a leading `v` on either side.
    pub fn reason(&self, id: &EntryId, version: &str) -> Option<&str> {
        let version = normalize(version);
        match id.kind() {
            EntryKind::Provider => {
                self.providers
                    .iter()
                    .find(|e| {
                        e.namespace == id.namespace
                            && e.name == id.name
                            && normalize(&e.version) == version
                    })
                    .map(|e| e.reason.as_str())
            }
            EntryKind::Module => {
                self.modules
                    .iter()
                    .find(|e| {
                        e.namespace == id.namespace
                            && e.name == id.name
                            && Some(e.target_system.as_str()) == id.target_system.as_deref()
                            && normalize(&e.version) == version
                    })
                    .map(|e| e.reason.as_str())
            }
        }
    }

    pub fn is_blacklisted(&self, id: &EntryId, version: &str) -> bool {
        self.reason(id, version).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty() && self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn sample() -> Blacklist {
        Blacklist {
            providers: vec![ProviderBlacklistEntry {
                namespace: "acme".into(),
                name: "widgets".into(),
                version: "v1.2.0".into(),
                reason: "broken checksums".into(),
            }],
            modules: vec![ModuleBlacklistEntry {
                namespace: "acme".into(),
                name: "vpc".into(),
                target_system: "aws".into(),
                version: "3.0.0".into(),
                reason: "retracted".into(),
            }],
        }
    }

    #[test]
    fn test_provider_match() {
        let blacklist = sample();
        let id = EntryId::provider("acme", "widgets");
        assert_eq!(blacklist.reason(&id, "1.2.0"), Some("broken checksums"));
        assert!(blacklist.is_blacklisted(&id, "v1.2.0"));
        assert!(!blacklist.is_blacklisted(&id, "1.2.1"));
        assert!(!blacklist.is_blacklisted(&EntryId::provider("acme", "gadgets"), "1.2.0"));
    }

    #[test]
    fn test_module_match_requires_target() {
        let blacklist = sample();
        assert!(blacklist.is_blacklisted(&EntryId::module("acme", "vpc", "aws"), "v3.0.0"));
        assert!(!blacklist.is_blacklisted(&EntryId::module("acme", "vpc", "gcp"), "3.0.0"));
        assert!(!blacklist.is_blacklisted(&EntryId::provider("acme", "vpc"), "3.0.0"));
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempdir().unwrap();
        assert!(Blacklist::load(None).unwrap().is_empty());
        assert!(Blacklist::load(Some(&dir.path().join("absent.json")))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_load_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("versions_blacklist.json");
        fs::write(
            &path,
            r#"{"providers":[{"namespace":"acme","name":"widgets","version":"1.2.0","reason":"bad"}]}"#,
        )
        .unwrap();
        let blacklist = Blacklist::load(Some(&path)).unwrap();
        assert_eq!(blacklist.providers.len(), 1);
        assert!(blacklist.modules.is_empty());

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Blacklist::load(Some(&path)),
            Err(RegistryError::Blacklist { .. })
        ));
    }
}
