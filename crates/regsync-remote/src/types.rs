use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RemoteError, Result};

static GITHUB_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(?:(?:https?://)?github\.com/)?([A-Za-z0-9_.\-]+)/([A-Za-z0-9_.\-]+?)(?:\.git)?/?$")
        .expect("unable to compile github repository regex")
});

/// A GitHub repository, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses `owner/name`, `github.com/owner/name` or a full `https://github.com/...` URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use regsync_remote::types::RepoRef;
    ///
    /// let repo = RepoRef::parse("https://github.com/acme/terraform-provider-acme.git").unwrap();
    /// assert_eq!(repo.to_string(), "acme/terraform-provider-acme");
    /// ```
    pub fn parse(value: &str) -> Result<Self> {
        let caps = GITHUB_REPO_RE
            .captures(value.trim())
            .ok_or_else(|| RemoteError::InvalidRepository(value.to_string()))?;
        Ok(Self::new(&caps[1], &caps[2]))
    }

    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }

    pub fn releases_feed_url(&self) -> String {
        format!("{}/releases.atom", self.url())
    }

    pub fn release_asset_url(&self, tag: &str, asset: &str) -> String {
        format!("{}/releases/download/{tag}/{asset}", self.url())
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A git tag and, when known, the commit it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit: None,
        }
    }

    pub fn with_commit(name: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit: Some(commit.into()),
        }
    }
}

/// A published (non-draft, non-prerelease) GitHub release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_url: String,
}

impl ReleaseAsset {
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
        }
    }
}

impl Release {
    pub fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_parse() {
        for input in [
            "acme/terraform-provider-acme",
            "github.com/acme/terraform-provider-acme",
            "https://github.com/acme/terraform-provider-acme",
            "https://github.com/acme/terraform-provider-acme.git",
            "https://GitHub.com/acme/terraform-provider-acme/",
        ] {
            let repo = RepoRef::parse(input).unwrap();
            assert_eq!(repo, RepoRef::new("acme", "terraform-provider-acme"), "{input}");
        }

        assert!(RepoRef::parse("acme").is_err());
        assert!(RepoRef::parse("https://gitlab.com/acme/x").is_err());
        assert!(RepoRef::parse("a/b/c").is_err());
    }

    #[test]
    fn test_repo_urls() {
        let repo = RepoRef::new("acme", "terraform-provider-acme");
        assert_eq!(
            repo.releases_feed_url(),
            "https://github.com/acme/terraform-provider-acme/releases.atom"
        );
        assert_eq!(
            repo.release_asset_url("v1.0.0", "x.zip"),
            "https://github.com/acme/terraform-provider-acme/releases/download/v1.0.0/x.zip"
        );
    }

    #[test]
    fn test_release_asset_lookup() {
        let release = Release {
            tag_name: "v1.0.0".into(),
            created_at: None,
            assets: vec![ReleaseAsset::new("a.zip", "https://x/a.zip")],
        };
        assert!(release.asset("a.zip").is_some());
        assert!(release.asset("b.zip").is_none());
    }
}
