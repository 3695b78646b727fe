use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use regsync_registry::{blacklist::Blacklist, storage, CatalogDocument, EntryId, VersionRecord};
use regsync_remote::{
    error::{RemoteError, Result},
    types::{Release, ReleaseAsset, RepoRef, Tag},
    RemoteSource,
};

use crate::context::{RegsyncContext, Settings};

/// In-memory [`RemoteSource`] keyed by repository and URL.
#[derive(Default)]
pub struct FakeRemote {
    pub tags: HashMap<String, Vec<Tag>>,
    pub releases: HashMap<String, Vec<Release>>,
    pub assets: HashMap<String, Vec<u8>>,
    pub feeds: HashMap<String, Vec<Tag>>,
    pub members: HashSet<(String, String)>,
    pub delays: HashMap<String, Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn with_tags(mut self, repo: &str, tags: &[&str]) -> Self {
        self.tags
            .insert(repo.into(), tags.iter().map(|t| Tag::new(*t)).collect());
        self
    }

    pub fn with_release(mut self, repo: &str, release: Release) -> Self {
        self.releases.entry(repo.into()).or_default().push(release);
        self
    }

    pub fn with_asset(mut self, url: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.assets.insert(url.into(), content.into());
        self
    }

    pub fn with_feed(mut self, repo: &RepoRef, tags: &[&str]) -> Self {
        self.feeds.insert(
            repo.releases_feed_url(),
            tags.iter().map(|t| Tag::new(*t)).collect(),
        );
        self
    }

    pub fn with_member(mut self, user: &str, org: &str) -> Self {
        self.members.insert((user.into(), org.into()));
        self
    }

    /// Delays every download of `url` by `delay`.
    pub fn with_delay(mut self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(url.into(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteSource for FakeRemote {
    async fn list_tags(&self, repo: &RepoRef) -> Result<Vec<Tag>> {
        self.log(format!("tags {repo}"));
        Ok(self.tags.get(&repo.to_string()).cloned().unwrap_or_default())
    }

    async fn fetch_releases(&self, repo: &RepoRef) -> Result<Vec<Release>> {
        self.log(format!("releases {repo}"));
        Ok(self
            .releases
            .get(&repo.to_string())
            .cloned()
            .unwrap_or_default())
    }

    async fn download_asset(&self, url: &str) -> Result<Option<Vec<u8>>> {
        self.log(format!("asset {url}"));
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self.assets.get(url).cloned())
    }

    async fn poll_feed(&self, url: &str) -> Result<Vec<Tag>> {
        self.log(format!("feed {url}"));
        self.feeds.get(url).cloned().ok_or_else(|| RemoteError::HttpError {
            status: 404,
            url: url.to_string(),
        })
    }

    async fn check_membership(&self, user: &str, org: &str) -> Result<bool> {
        self.log(format!("member {user} {org}"));
        Ok(user.eq_ignore_ascii_case(org)
            || self.members.contains(&(user.to_string(), org.to_string())))
    }
}

pub fn settings(root: &Path) -> Settings {
    Settings {
        modules_dir: root.join("modules"),
        providers_dir: root.join("providers"),
        keys_dir: root.join("keys"),
        entry_concurrency: 4,
        version_concurrency: 4,
        feed_shortcut: true,
    }
}

pub fn context(
    root: &Path,
    remote: FakeRemote,
    blacklist: Blacklist,
) -> (RegsyncContext, Arc<FakeRemote>) {
    let remote = Arc::new(remote);
    let ctx = RegsyncContext::new(settings(root), remote.clone(), blacklist);
    (ctx, remote)
}

pub fn write_document(root: &Path, id: &EntryId, versions: &[&str]) {
    let doc = CatalogDocument {
        repository: None,
        versions: versions
            .iter()
            .map(|v| VersionRecord::module(*v, None))
            .collect(),
    };
    storage::save_document(root, id, &doc).unwrap();
}

pub fn versions(root: &Path, id: &EntryId) -> Vec<String> {
    storage::load_document(root, id)
        .unwrap()
        .versions
        .into_iter()
        .map(|v| v.version)
        .collect()
}

/// A provider release `v<version>` of `repo` with zip assets for `platforms` plus the
/// checksums, signature and (optionally) manifest assets.
pub fn provider_release(
    repo: &RepoRef,
    version: &str,
    platforms: &[&str],
    with_sums: bool,
    with_manifest: bool,
) -> Release {
    let prefix = format!("{}_{version}", repo.name);
    let mut names: Vec<String> = platforms
        .iter()
        .map(|p| format!("{prefix}_{p}.zip"))
        .collect();
    if with_sums {
        names.push(format!("{prefix}_SHA256SUMS"));
        names.push(format!("{prefix}_SHA256SUMS.sig"));
    }
    if with_manifest {
        names.push(format!("{prefix}_manifest.json"));
    }

    Release {
        tag_name: format!("v{version}"),
        created_at: None,
        assets: names
            .into_iter()
            .map(|name| {
                let url = repo.release_asset_url(&format!("v{version}"), &name);
                ReleaseAsset::new(name, url)
            })
            .collect(),
    }
}
