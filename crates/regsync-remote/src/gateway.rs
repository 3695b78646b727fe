use std::{future::Future, time::Duration};

use async_trait::async_trait;
use regsync_config::{
    config::Config,
    error::Result as ConfigResult,
    throttle::ThrottleSettings,
};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::{
    error::{ErrorKind, RemoteError, Result},
    feed::parse_release_feed,
    git::{parse_tag_refs, refs_url},
    github::{parse_releases_page, public_membership_url, releases_request, GRAPHQL_URL},
    http_client::{ClientConfig, HttpClient},
    throttle::{CallClass, Throttle},
    traits::RemoteSource,
    types::{Release, RepoRef, Tag},
};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How transient asset download failures are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based): `base * 2^(attempt-1)`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the attempts run out.
pub async fn retry_transient<T, F, Fut>(policy: RetryPolicy, url: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.kind() == ErrorKind::Transient => {
                if attempt >= attempts {
                    return Err(RemoteError::RetriesExhausted {
                        url: url.to_string(),
                        attempts,
                        last: err.to_string(),
                    });
                }
                let delay = policy.backoff(attempt);
                warn!(url, attempt, ?delay, "transient failure, retrying: {err}");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| RemoteError::TaskFailed(err.to_string()))?
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// [`RemoteSource`] backed by github.com, with one throttle per call class.
pub struct GithubGateway {
    client: HttpClient,
    cli: Throttle,
    api: Throttle,
    asset: Throttle,
    feed: Throttle,
    retry: RetryPolicy,
}

impl GithubGateway {
    pub fn new(client: ClientConfig, throttle: &ThrottleSettings, retry: RetryPolicy) -> Self {
        Self {
            client: client.build(),
            cli: Throttle::from_settings(CallClass::Cli, &throttle.cli),
            api: Throttle::from_settings(CallClass::Api, &throttle.api),
            asset: Throttle::from_settings(CallClass::Asset, &throttle.asset),
            feed: Throttle::from_settings(CallClass::Feed, &throttle.feed),
            retry,
        }
    }

    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let client = ClientConfig {
            user_agent: config.user_agent(),
            token: config.token(),
            timeout: Some(config.request_timeout()?),
        };
        if client.token.is_none() {
            warn!(
                "{} is not set, requests are unauthenticated and heavily rate limited",
                config.token_env
            );
        }
        let retry = RetryPolicy {
            attempts: config.asset_retry_attempts,
            base_delay: config.asset_retry_base_delay()?,
        };
        Ok(Self::new(client, &config.throttle, retry))
    }

    pub fn throttle(&self, class: CallClass) -> &Throttle {
        match class {
            CallClass::Cli => &self.cli,
            CallClass::Api => &self.api,
            CallClass::Asset => &self.asset,
            CallClass::Feed => &self.feed,
        }
    }

    /// GET returning the status and, for 2xx responses, the body.
    async fn get(&self, url: &str) -> Result<(u16, Vec<u8>)> {
        let client = self.client.clone();
        let url = url.to_string();
        blocking(move || {
            let mut resp = client
                .get(&url)
                .call()
                .map_err(|err| RemoteError::network(&url, err))?;
            let status = resp.status().as_u16();
            let body = if is_success(status) {
                resp.body_mut()
                    .read_to_vec()
                    .map_err(|err| RemoteError::network(&url, err))?
            } else {
                Vec::new()
            };
            Ok((status, body))
        })
        .await
    }

    async fn post_graphql(&self, body: Value) -> Result<Value> {
        let client = self.client.clone();
        blocking(move || {
            let mut resp = client
                .post(GRAPHQL_URL)
                .send_json(&body)
                .map_err(|err| RemoteError::network(GRAPHQL_URL, err))?;
            let status = resp.status().as_u16();
            if !is_success(status) {
                return Err(RemoteError::HttpError {
                    status,
                    url: GRAPHQL_URL.to_string(),
                });
            }
            resp.body_mut()
                .read_json::<Value>()
                .map_err(|err| RemoteError::invalid(GRAPHQL_URL, err.to_string()))
        })
        .await
    }

    async fn try_download(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let _token = self.asset.acquire().await;
        match self.get(url).await? {
            (status, body) if is_success(status) => Ok(Some(body)),
            (404, _) => Ok(None),
            (status, _) => {
                Err(RemoteError::HttpError {
                    status,
                    url: url.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl RemoteSource for GithubGateway {
    async fn list_tags(&self, repo: &RepoRef) -> Result<Vec<Tag>> {
        let url = refs_url(repo);
        let _token = self.cli.acquire().await;
        debug!(%repo, "listing tags");

        let (status, body) = self.get(&url).await?;
        if !is_success(status) {
            return Err(RemoteError::HttpError { status, url });
        }

        let tags = parse_tag_refs(&body).map_err(|reason| RemoteError::invalid(&url, reason))?;
        debug!(%repo, count = tags.len(), "found tags");
        Ok(tags)
    }

    async fn fetch_releases(&self, repo: &RepoRef) -> Result<Vec<Release>> {
        let mut releases = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = releases_request(repo, cursor.as_deref());
            let response = {
                let _token = self.api.acquire().await;
                self.post_graphql(body).await?
            };
            let page = parse_releases_page(repo, response)?;
            trace!(%repo, count = page.releases.len(), "fetched release page");
            releases.extend(page.releases);

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(%repo, count = releases.len(), "fetched releases");
        Ok(releases)
    }

    async fn download_asset(&self, url: &str) -> Result<Option<Vec<u8>>> {
        debug!(url, "downloading asset");
        retry_transient(self.retry, url, || self.try_download(url)).await
    }

    async fn poll_feed(&self, url: &str) -> Result<Vec<Tag>> {
        let _token = self.feed.acquire().await;
        let (status, body) = self.get(url).await?;
        if !is_success(status) {
            return Err(RemoteError::HttpError {
                status,
                url: url.to_string(),
            });
        }
        let text = String::from_utf8_lossy(&body);
        parse_release_feed(&text).map_err(|reason| RemoteError::invalid(url, reason))
    }

    async fn check_membership(&self, user: &str, org: &str) -> Result<bool> {
        if user.eq_ignore_ascii_case(org) {
            return Ok(true);
        }

        let url = public_membership_url(org, user);
        let _token = self.api.acquire().await;
        match self.get(&url).await?.0 {
            204 => Ok(true),
            404 => Ok(false),
            status => Err(RemoteError::HttpError { status, url }),
        }
    }
}
