use async_trait::async_trait;

use crate::{
    error::Result,
    types::{Release, RepoRef, Tag},
};

/// Everything the synchronizer and the key verifier need from the hosting platform.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Lists the repository's tags without cloning it.
    async fn list_tags(&self, repo: &RepoRef) -> Result<Vec<Tag>>;

    /// Fetches every published release, newest first, following pagination to the end.
    async fn fetch_releases(&self, repo: &RepoRef) -> Result<Vec<Release>>;

    /// Downloads a release asset. `Ok(None)` means the asset does not exist.
    async fn download_asset(&self, url: &str) -> Result<Option<Vec<u8>>>;

    /// Reads the tags of a releases feed, in feed order.
    async fn poll_feed(&self, url: &str) -> Result<Vec<Tag>>;

    /// Whether `user` is a public member of `org` (or is `org` itself).
    async fn check_membership(&self, user: &str, org: &str) -> Result<bool>;
}
