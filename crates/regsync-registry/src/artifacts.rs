//! Provider release asset conventions.
//!
//! Assets are recognised by suffix so that forks and renamed repositories keep working
//! whatever prefix their archives carry: platform archives end in `_<os>_<arch>.zip`, the
//! checksums file in `SHA256SUMS`, its detached signature in `SHA256SUMS.sig` and the
//! optional manifest in `_manifest.json`.

use std::collections::HashMap;

use regsync_remote::types::Release;
use regsync_utils::hash::Sha256Digest;

use crate::{
    catalog::{TargetArtifact, VersionRecord},
    error::{RegistryError, Result},
    version::normalize,
};

pub const SUPPORTED_OS: &[&str] = &["darwin", "freebsd", "linux", "windows", "openbsd", "solaris"];
pub const SUPPORTED_ARCH: &[&str] = &["386", "amd64", "arm", "arm64"];

const SHASUMS_SUFFIX: &str = "SHA256SUMS";
const SHASUMS_SIGNATURE_SUFFIX: &str = "SHA256SUMS.sig";
const MANIFEST_SUFFIX: &str = "_manifest.json";

/// A platform archive found in a release, before its checksum is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCandidate {
    pub os: String,
    pub arch: String,
    pub filename: String,
    pub download_url: String,
}

/// The assets of one release, sorted by role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtifacts {
    pub version: String,
    pub targets: Vec<TargetCandidate>,
    pub shasums_url: Option<String>,
    pub shasums_signature_url: Option<String>,
    pub manifest_url: Option<String>,
}

/// The supported platform an archive name ends with, if any.
fn platform_of(name: &str) -> Option<(&'static str, &'static str)> {
    let stem = name.strip_suffix(".zip")?;
    SUPPORTED_OS.iter().find_map(|os| {
        SUPPORTED_ARCH
            .iter()
            .find(|arch| stem.ends_with(&format!("_{os}_{arch}")))
            .map(|arch| (*os, *arch))
    })
}

impl ReleaseArtifacts {
    /// Partitions the assets of `release` by filename suffix.
    ///
    /// Targets come out in OS then architecture order. When two archives claim the same
    /// platform the first listed wins.
    pub fn from_release(release: &Release) -> Self {
        let mut artifacts = Self {
            version: normalize(&release.tag_name).to_string(),
            targets: Vec::new(),
            shasums_url: None,
            shasums_signature_url: None,
            manifest_url: None,
        };

        for asset in &release.assets {
            let name = asset.name.as_str();
            let url = asset.download_url.clone();
            if let Some((os, arch)) = platform_of(name) {
                if !artifacts.targets.iter().any(|t| t.os == os && t.arch == arch) {
                    artifacts.targets.push(TargetCandidate {
                        os: os.to_string(),
                        arch: arch.to_string(),
                        filename: name.to_string(),
                        download_url: url,
                    });
                }
            } else if name.ends_with(SHASUMS_SUFFIX) {
                artifacts.shasums_url.get_or_insert(url);
            } else if name.ends_with(SHASUMS_SIGNATURE_SUFFIX) {
                artifacts.shasums_signature_url.get_or_insert(url);
            } else if name.ends_with(MANIFEST_SUFFIX) {
                artifacts.manifest_url.get_or_insert(url);
            }
        }

        artifacts.targets.sort_by_key(|t| {
            let os = SUPPORTED_OS.iter().position(|os| *os == t.os);
            let arch = SUPPORTED_ARCH.iter().position(|arch| *arch == t.arch);
            (os, arch)
        });
        artifacts
    }

    /// Both checksums URLs, or the error naming the first missing one.
    pub fn checksum_urls(&self, release: &str) -> Result<(&str, &str)> {
        let sums = self.shasums_url.as_deref().ok_or_else(|| {
            RegistryError::MissingChecksums {
                release: release.to_string(),
                asset: format!("*{SHASUMS_SUFFIX}"),
            }
        })?;
        let sig = self.shasums_signature_url.as_deref().ok_or_else(|| {
            RegistryError::MissingChecksumsSignature {
                release: release.to_string(),
                asset: format!("*{SHASUMS_SIGNATURE_SUFFIX}"),
            }
        })?;
        Ok((sums, sig))
    }

    /// Attaches digests to every target and builds the final record.
    pub fn into_record(
        self,
        release: &str,
        checksums: &HashMap<String, Sha256Digest>,
        protocols: Vec<String>,
    ) -> Result<VersionRecord> {
        let (shasums_url, shasums_signature_url) = {
            let (sums, sig) = self.checksum_urls(release)?;
            (sums.to_string(), sig.to_string())
        };

        let targets = self
            .targets
            .into_iter()
            .map(|target| {
                let digest = checksums.get(&target.filename).ok_or_else(|| {
                    RegistryError::MissingDigest {
                        release: release.to_string(),
                        filename: target.filename.clone(),
                    }
                })?;
                Ok(TargetArtifact {
                    os: target.os,
                    arch: target.arch,
                    filename: target.filename,
                    download_url: target.download_url,
                    shasum: digest.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(VersionRecord {
            version: self.version,
            protocols,
            shasums_url,
            shasums_signature_url,
            targets,
            commit: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use regsync_remote::types::ReleaseAsset;
    use regsync_utils::hash::sha256_hex;

    use super::*;

    fn asset(name: &str) -> ReleaseAsset {
        ReleaseAsset::new(name, format!("https://example.com/dl/{name}"))
    }

    fn release(names: &[&str]) -> Release {
        Release {
            tag_name: "v2.0.0".into(),
            created_at: None,
            assets: names.iter().map(|n| asset(n)).collect(),
        }
    }

    #[test]
    fn test_partition() {
        let release = release(&[
            "terraform-provider-acme_2.0.0_darwin_amd64.zip",
            "terraform-provider-acme_2.0.0_linux_amd64.zip",
            "terraform-provider-acme_2.0.0_linux_riscv64.zip",
            "terraform-provider-acme_2.0.0_SHA256SUMS",
            "terraform-provider-acme_2.0.0_SHA256SUMS.sig",
            "terraform-provider-acme_2.0.0_manifest.json",
            "terraform-provider-acme_2.0.0_linux_amd64.zip.sig",
            "terraform-provider-acme_2.0.0_linux_amd64_debug.zip",
        ]);
        let artifacts = ReleaseArtifacts::from_release(&release);

        assert_eq!(artifacts.version, "2.0.0");
        let platforms: Vec<_> = artifacts
            .targets
            .iter()
            .map(|t| format!("{}_{}", t.os, t.arch))
            .collect();
        assert_eq!(platforms, vec!["darwin_amd64", "linux_amd64"]);
        assert!(artifacts.shasums_url.is_some());
        assert!(artifacts.shasums_signature_url.is_some());
        assert!(artifacts.manifest_url.is_some());
        assert!(artifacts
            .shasums_signature_url
            .as_deref()
            .is_some_and(|url| url.ends_with("_SHA256SUMS.sig")));
    }

    #[test]
    fn test_partition_ignores_archive_prefix() {
        let release = release(&[
            "terraform-provider-acme_2.0.0_linux_arm64.zip",
            "acme_2.0.0_linux_amd64.zip",
            "other_linux_amd64.zip",
            "acme_2.0.0_SHA256SUMS",
            "acme_2.0.0_SHA256SUMS.sig",
        ]);
        let artifacts = ReleaseArtifacts::from_release(&release);

        let files: Vec<_> = artifacts.targets.iter().map(|t| t.filename.as_str()).collect();
        assert_eq!(
            files,
            vec!["acme_2.0.0_linux_amd64.zip", "terraform-provider-acme_2.0.0_linux_arm64.zip"]
        );
        assert!(artifacts.checksum_urls("acme/acme-fork 2.0.0").is_ok());
        assert!(artifacts.manifest_url.is_none());
    }

    #[test]
    fn test_missing_checksums() {
        let release = release(&[
            "terraform-provider-acme_2.0.0_darwin_amd64.zip",
            "terraform-provider-acme_2.0.0_linux_amd64.zip",
        ]);
        let artifacts = ReleaseArtifacts::from_release(&release);
        let err = artifacts.checksum_urls("acme/acme 2.0.0").unwrap_err();
        assert!(err.to_string().contains("missing checksums artifact"));

        let release = super::tests::release(&[
            "terraform-provider-acme_2.0.0_linux_amd64.zip",
            "terraform-provider-acme_2.0.0_SHA256SUMS",
        ]);
        let artifacts = ReleaseArtifacts::from_release(&release);
        let err = artifacts.checksum_urls("acme/acme 2.0.0").unwrap_err();
        assert!(err
            .to_string()
            .contains("missing checksums signature artifact"));
    }

    #[test]
    fn test_into_record() {
        let release = release(&[
            "terraform-provider-acme_2.0.0_linux_amd64.zip",
            "terraform-provider-acme_2.0.0_SHA256SUMS",
            "terraform-provider-acme_2.0.0_SHA256SUMS.sig",
        ]);
        let artifacts = ReleaseArtifacts::from_release(&release);
        let digest = sha256_hex(b"zip");
        let checksums = HashMap::from([(
            "terraform-provider-acme_2.0.0_linux_amd64.zip".to_string(),
            digest.clone(),
        )]);

        let record = artifacts
            .into_record("acme/acme 2.0.0", &checksums, vec!["5.0".into()])
            .unwrap();
        assert_eq!(record.version, "2.0.0");
        assert_eq!(record.targets[0].shasum, digest.to_string());
        assert!(record.shasums_url.ends_with("_SHA256SUMS"));
        assert!(record.shasums_signature_url.ends_with("_SHA256SUMS.sig"));
    }

    #[test]
    fn test_missing_digest() {
        let release = release(&[
            "terraform-provider-acme_2.0.0_linux_amd64.zip",
            "terraform-provider-acme_2.0.0_SHA256SUMS",
            "terraform-provider-acme_2.0.0_SHA256SUMS.sig",
        ]);
        let artifacts = ReleaseArtifacts::from_release(&release);
        let err = artifacts
            .into_record("acme/acme 2.0.0", &HashMap::new(), vec![])
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingDigest { .. }));
    }
}
