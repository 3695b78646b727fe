//! Catalog entries and the persisted document shape.

use std::fmt;

use regsync_remote::{error::Result as RemoteResult, types::RepoRef};
use serde::{Deserialize, Serialize};

/// Providers published under this namespace are released from [`MIRROR_NAMESPACE`].
pub const MIRRORED_NAMESPACE: &str = "hashicorp";
pub const MIRROR_NAMESPACE: &str = "opentofu";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Module,
    Provider,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Module => write!(f, "module"),
            EntryKind::Provider => write!(f, "provider"),
        }
    }
}

/// Identity of a catalog entry. `target_system` is set for modules only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    pub namespace: String,
    pub name: String,
    pub target_system: Option<String>,
}

impl EntryId {
    pub fn provider(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            target_system: None,
        }
    }

    pub fn module(
        namespace: impl Into<String>,
        name: impl Into<String>,
        target_system: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            target_system: Some(target_system.into()),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self.target_system {
            Some(_) => EntryKind::Module,
            None => EntryKind::Provider,
        }
    }

    /// Lower-cased first character of the namespace.
    pub fn shard(&self) -> String {
        self.namespace
            .chars()
            .next()
            .map(|c| c.to_lowercase().collect())
            .unwrap_or_default()
    }

    /// `terraform-provider-<name>` or `terraform-<target>-<name>`.
    pub fn repository_name(&self) -> String {
        match &self.target_system {
            Some(target) => format!("terraform-{target}-{}", self.name),
            None => format!("terraform-provider-{}", self.name),
        }
    }

    /// Namespace the releases are actually published under.
    pub fn effective_namespace(&self) -> &str {
        if self.kind() == EntryKind::Provider && self.namespace == MIRRORED_NAMESPACE {
            MIRROR_NAMESPACE
        } else {
            &self.namespace
        }
    }

    pub fn default_repository(&self) -> RepoRef {
        RepoRef::new(self.effective_namespace(), self.repository_name())
    }

    /// The repository to fetch from, honouring a document's `repository` override.
    pub fn repository(&self, doc: &CatalogDocument) -> RemoteResult<RepoRef> {
        match doc.repository.as_deref().filter(|r| !r.trim().is_empty()) {
            Some(custom) => RepoRef::parse(custom),
            None => Ok(self.default_repository()),
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target_system {
            Some(target) => write!(f, "{}/{}/{}", self.namespace, self.name, target),
            None => write!(f, "{}/{}", self.namespace, self.name),
        }
    }
}

/// A downloadable build of a provider version for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetArtifact {
    pub os: String,
    pub arch: String,
    pub filename: String,
    pub download_url: String,
    pub shasum: String,
}

/// One version of a catalog entry.
///
/// Module records carry only `version` (and optionally `commit`); provider records carry
/// protocols, checksums URLs and targets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shasums_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shasums_signature_url: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TargetArtifact>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl VersionRecord {
    pub fn module(version: impl Into<String>, commit: Option<String>) -> Self {
        Self {
            version: version.into(),
            commit,
            ..Self::default()
        }
    }
}

/// The JSON document persisted for one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default)]
    pub versions: Vec<VersionRecord>,
}

impl CatalogDocument {
    pub fn latest(&self) -> Option<&VersionRecord> {
        self.versions.first()
    }

    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v.version == version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_identity() {
        let id = EntryId::provider("hashicorp", "aws");
        assert_eq!(id.kind(), EntryKind::Provider);
        assert_eq!(id.shard(), "h");
        assert_eq!(id.repository_name(), "terraform-provider-aws");
        assert_eq!(id.effective_namespace(), "opentofu");
        assert_eq!(
            id.default_repository(),
            RepoRef::new("opentofu", "terraform-provider-aws")
        );
        assert_eq!(id.to_string(), "hashicorp/aws");
    }

    #[test]
    fn test_module_identity() {
        let id = EntryId::module("Terraform-AWS-Modules", "vpc", "aws");
        assert_eq!(id.kind(), EntryKind::Module);
        assert_eq!(id.shard(), "t");
        assert_eq!(id.repository_name(), "terraform-aws-vpc");
        assert_eq!(id.effective_namespace(), "Terraform-AWS-Modules");
        assert_eq!(id.to_string(), "Terraform-AWS-Modules/vpc/aws");

        let hashicorp_module = EntryId::module("hashicorp", "consul", "aws");
        assert_eq!(hashicorp_module.effective_namespace(), "hashicorp");
    }

    #[test]
    fn test_repository_override() {
        let id = EntryId::provider("acme", "widgets");
        let doc = CatalogDocument {
            repository: Some("https://github.com/widget-corp/terraform-provider-widgets".into()),
            versions: vec![],
        };
        assert_eq!(
            id.repository(&doc).unwrap(),
            RepoRef::new("widget-corp", "terraform-provider-widgets")
        );
        assert_eq!(
            id.repository(&CatalogDocument::default()).unwrap(),
            RepoRef::new("acme", "terraform-provider-widgets")
        );
    }

    #[test]
    fn test_module_record_serialization() {
        let doc = CatalogDocument {
            repository: None,
            versions: vec![VersionRecord::module("1.0.0", None)],
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, r#"{"versions":[{"version":"1.0.0"}]}"#);
    }

    #[test]
    fn test_provider_record_round_trip() {
        let json = r#"{
            "versions": [{
                "version": "2.0.0",
                "protocols": ["5.0"],
                "shasums_url": "https://x/SUMS",
                "shasums_signature_url": "https://x/SUMS.sig",
                "targets": [{
                    "os": "linux", "arch": "amd64",
                    "filename": "p_2.0.0_linux_amd64.zip",
                    "download_url": "https://x/p_2.0.0_linux_amd64.zip",
                    "shasum": "aa"
                }]
            }]
        }"#;
        let doc: CatalogDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.latest().unwrap().targets[0].os, "linux");
        assert!(doc.contains("2.0.0"));
        let back: CatalogDocument =
            serde_json::from_str(&serde_json::to_string(&doc).unwrap()).unwrap();
        assert_eq!(back, doc);
    }
}
