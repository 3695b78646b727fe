//! Invariant checks over persisted catalog documents.

use std::{cmp::Ordering, collections::HashSet, fmt};

use regsync_utils::hash::Sha256Digest;
use url::Url;

use crate::{
    artifacts::{SUPPORTED_ARCH, SUPPORTED_OS},
    catalog::{CatalogDocument, EntryKind, TargetArtifact, VersionRecord},
    version::{compare_desc, is_valid, normalize},
};

pub const SUPPORTED_PROTOCOLS: &[&str] = &["1.0", "1.0.0", "4.0", "5.0", "6.0"];

/// A single invariant violation. `version` is empty for document-level problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub version: String,
    pub message: String,
}

impl ValidationError {
    fn new(version: &str, message: impl Into<String>) -> Self {
        Self {
            version: version.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.version, self.message)
        }
    }
}

/// Checks `doc` and returns every violation found. An empty list means the document is valid.
pub fn validate_document(kind: EntryKind, doc: &CatalogDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if doc.versions.is_empty() {
        errors.push(ValidationError::new("", "no versions"));
        return errors;
    }

    let mut seen = HashSet::new();
    for record in &doc.versions {
        if !is_valid(&record.version) {
            errors.push(ValidationError::new(
                &record.version,
                "not a semantic version",
            ));
        }
        if !seen.insert(normalize(&record.version)) {
            errors.push(ValidationError::new(&record.version, "duplicate version"));
        }
        if kind == EntryKind::Provider {
            validate_provider_record(record, &mut errors);
        }
    }

    for pair in doc.versions.windows(2) {
        if compare_desc(&pair[0].version, &pair[1].version) == Ordering::Greater {
            errors.push(ValidationError::new(
                &pair[1].version,
                format!("listed after lower version {}", pair[0].version),
            ));
        }
    }

    errors
}

fn validate_provider_record(record: &VersionRecord, errors: &mut Vec<ValidationError>) {
    let version = record.version.as_str();

    if record.protocols.is_empty() {
        errors.push(ValidationError::new(version, "no protocols"));
    }
    for protocol in &record.protocols {
        if !SUPPORTED_PROTOCOLS.contains(&protocol.as_str()) {
            errors.push(ValidationError::new(
                version,
                format!("unsupported protocol {protocol}"),
            ));
        }
    }

    if record.targets.is_empty() {
        errors.push(ValidationError::new(version, "no targets"));
    }
    for target in &record.targets {
        validate_target(version, target, errors);
    }
}

fn validate_target(version: &str, target: &TargetArtifact, errors: &mut Vec<ValidationError>) {
    let label = format!("{}_{}", target.os, target.arch);

    if !SUPPORTED_OS.contains(&target.os.as_str()) {
        errors.push(ValidationError::new(
            version,
            format!("{label}: unknown os {}", target.os),
        ));
    }
    if !SUPPORTED_ARCH.contains(&target.arch.as_str()) {
        errors.push(ValidationError::new(
            version,
            format!("{label}: unknown arch {}", target.arch),
        ));
    }

    let last_segment = Url::parse(&target.download_url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        });
    match last_segment {
        Some(segment) if segment == target.filename => {}
        Some(segment) => errors.push(ValidationError::new(
            version,
            format!(
                "{label}: filename {} does not match download url ({segment})",
                target.filename
            ),
        )),
        None => errors.push(ValidationError::new(
            version,
            format!("{label}: invalid download url {}", target.download_url),
        )),
    }

    if let Err(err) = Sha256Digest::parse(&target.shasum) {
        errors.push(ValidationError::new(version, format!("{label}: {err}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(os: &str, arch: &str) -> TargetArtifact {
        let filename = format!("terraform-provider-acme_1.0.0_{os}_{arch}.zip");
        TargetArtifact {
            os: os.into(),
            arch: arch.into(),
            download_url: format!(
                "https://github.com/acme/terraform-provider-acme/releases/download/v1.0.0/{filename}"
            ),
            filename,
            shasum: "c".repeat(64),
        }
    }

    fn provider_record(version: &str) -> VersionRecord {
        VersionRecord {
            version: version.into(),
            protocols: vec!["5.0".into()],
            shasums_url: "https://example.com/SHA256SUMS".into(),
            shasums_signature_url: "https://example.com/SHA256SUMS.sig".into(),
            targets: vec![target("linux", "amd64")],
            commit: None,
        }
    }

    fn doc(versions: Vec<VersionRecord>) -> CatalogDocument {
        CatalogDocument {
            repository: None,
            versions,
        }
    }

    #[test]
    fn test_valid_documents() {
        let providers = doc(vec![provider_record("1.1.0"), provider_record("1.0.0")]);
        assert!(validate_document(EntryKind::Provider, &providers).is_empty());

        let modules = doc(vec![
            VersionRecord::module("2.0.0", None),
            VersionRecord::module("1.0.0", Some("abc123".into())),
        ]);
        assert!(validate_document(EntryKind::Module, &modules).is_empty());
    }

    #[test]
    fn test_empty_document() {
        let errors = validate_document(EntryKind::Module, &CatalogDocument::default());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "no versions");
    }

    #[test]
    fn test_order_and_uniqueness() {
        let modules = doc(vec![
            VersionRecord::module("1.0.0", None),
            VersionRecord::module("2.0.0", None),
            VersionRecord::module("2.0.0", None),
            VersionRecord::module("1.2", None),
        ]);
        let errors = validate_document(EntryKind::Module, &modules);
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert!(messages.contains(&"1.2: not a semantic version".to_string()));
        assert!(messages.contains(&"2.0.0: duplicate version".to_string()));
        assert!(messages.contains(&"2.0.0: listed after lower version 1.0.0".to_string()));
    }

    #[test]
    fn test_provider_record_problems() {
        let mut record = provider_record("1.0.0");
        record.protocols = vec!["7.0".into()];
        record.targets.push(target("plan9", "mips"));
        record.targets[0].filename = "other.zip".into();
        record.targets[0].shasum = "xyz".into();

        let errors = validate_document(EntryKind::Provider, &doc(vec![record]));
        let messages: Vec<String> = errors.iter().map(|e| e.message.clone()).collect();
        assert!(messages.contains(&"unsupported protocol 7.0".to_string()));
        assert!(messages.contains(&"plan9_mips: unknown os plan9".to_string()));
        assert!(messages.contains(&"plan9_mips: unknown arch mips".to_string()));
        assert!(messages.iter().any(|m| m.starts_with("linux_amd64: filename other.zip")));
        assert!(messages.iter().any(|m| m.starts_with("linux_amd64: ") && m.contains("xyz")));
    }

    #[test]
    fn test_provider_without_protocols_or_targets() {
        let mut record = provider_record("1.0.0");
        record.protocols.clear();
        record.targets.clear();
        let errors = validate_document(EntryKind::Provider, &doc(vec![record]));
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["no protocols", "no targets"]);
    }
}
